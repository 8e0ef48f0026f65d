//! Dispatcher metrics for observability

use std::sync::atomic::{AtomicU64, Ordering};

use crate::dispatcher::CycleReport;

/// Cumulative counters for one dispatcher
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Dispatch cycles started
    cycles: AtomicU64,
    /// Cycles aborted because keys could not be listed
    aborted_cycles: AtomicU64,
    /// Batches accepted by the transport
    batches_sent: AtomicU64,
    /// Batches the transport rejected
    batches_failed: AtomicU64,
    /// Items deleted after dispatch
    items_dispatched: AtomicU64,
    /// Items deleted by the retention policy
    items_discarded: AtomicU64,
    /// Keys skipped due to store errors
    key_failures: AtomicU64,
    /// Successful transport reconnects
    reconnects: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one cycle report into the counters
    pub fn record_cycle(&self, report: &CycleReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        if report.aborted {
            self.aborted_cycles.fetch_add(1, Ordering::Relaxed);
        }
        self.batches_sent
            .fetch_add(report.batches_sent as u64, Ordering::Relaxed);
        self.batches_failed
            .fetch_add(report.batches_failed as u64, Ordering::Relaxed);
        self.items_dispatched
            .fetch_add(report.items_deleted as u64, Ordering::Relaxed);
        self.items_discarded
            .fetch_add(report.items_discarded as u64, Ordering::Relaxed);
        self.key_failures
            .fetch_add(report.keys_failed as u64, Ordering::Relaxed);
    }

    /// Increment reconnect count
    pub fn inc_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            aborted_cycles: self.aborted_cycles.load(Ordering::Relaxed),
            batches_sent: self.batches_sent.load(Ordering::Relaxed),
            batches_failed: self.batches_failed.load(Ordering::Relaxed),
            items_dispatched: self.items_dispatched.load(Ordering::Relaxed),
            items_discarded: self.items_discarded.load(Ordering::Relaxed),
            key_failures: self.key_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles: u64,
    pub aborted_cycles: u64,
    pub batches_sent: u64,
    pub batches_failed: u64,
    pub items_dispatched: u64,
    pub items_discarded: u64,
    pub key_failures: u64,
    pub reconnects: u64,
}
