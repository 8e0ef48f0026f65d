//! Dispatcher - timing loop and per-key dispatch policy

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use contracts::{AnalyzerTransport, BufferStore, ContractError, DispatchPolicy, GroupKey};

use crate::batch::make_batches;
use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::pacing::{FixedPacer, PaceStep, Pacer};
use crate::retention::{classify, Classified};
use crate::schedule::compute_wait_time;

/// Outcome of one dispatch cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Keys returned by the store
    pub keys_seen: usize,
    /// Keys at or above the threshold that were sent
    pub keys_dispatched: usize,
    /// Keys below the threshold that went through retention
    pub keys_filtered: usize,
    /// Keys skipped because of a store error
    pub keys_failed: usize,
    pub batches_sent: usize,
    pub batches_failed: usize,
    /// Items handed to the transport
    pub items_dispatched: usize,
    /// Dispatched items removed from the store
    pub items_deleted: usize,
    /// Stale items removed by retention
    pub items_discarded: usize,
    /// Keys could not be listed; nothing was processed
    pub aborted: bool,
}

impl CycleReport {
    /// Report for a cycle abandoned before any key was processed
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct BucketOutcome {
    batches_sent: usize,
    batches_failed: usize,
    items_dispatched: usize,
    items_deleted: usize,
    delete_failed: bool,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<S, T> {
    policy: DispatchPolicy,
    store: Option<S>,
    transport: Option<T>,
    pacer: Option<Box<dyn Pacer>>,
    metrics: Option<Arc<DispatchMetrics>>,
}

impl<S, T> DispatcherBuilder<S, T>
where
    S: BufferStore + Send + Sync + 'static,
    T: AnalyzerTransport + Send + 'static,
{
    /// Create a new DispatcherBuilder
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            store: None,
            transport: None,
            pacer: None,
            metrics: None,
        }
    }

    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    pub fn transport(mut self, transport: T) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the pacing derived from `pacing_delay_ms`
    pub fn pacer(mut self, pacer: impl Pacer + 'static) -> Self {
        self.pacer = Some(Box::new(pacer));
        self
    }

    /// Share a metrics instance with the caller
    pub fn metrics(mut self, metrics: Arc<DispatchMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Validate and assemble the dispatcher
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<Dispatcher<S, T>, DispatcherError> {
        if self.policy.batch_size == 0 {
            return Err(DispatcherError::invalid_config(
                "dispatch.batch_size",
                "must be greater than zero",
            ));
        }
        if self.policy.min_wait_secs == 0 {
            return Err(DispatcherError::invalid_config(
                "dispatch.min_wait_secs",
                "must be greater than zero",
            ));
        }

        let store = self
            .store
            .ok_or(DispatcherError::MissingComponent { component: "store" })?;
        let transport = self.transport.ok_or(DispatcherError::MissingComponent {
            component: "transport",
        })?;
        let pacer: Box<dyn Pacer> = match self.pacer {
            Some(pacer) => pacer,
            None => Box::new(FixedPacer::new(self.policy.pacing_delay())),
        };

        Ok(Dispatcher {
            store,
            transport,
            policy: self.policy,
            pacer,
            metrics: self.metrics.unwrap_or_default(),
            last_dispatch_time: None,
        })
    }
}

/// Periodic dispatcher from a `BufferStore` to an `AnalyzerTransport`
///
/// One cycle walks every key in the store: groups at or above the threshold are sent
/// in batches and deleted, smaller groups only lose items older than the disposal age.
/// Between cycles the analyzer connection is closed and re-opened.
pub struct Dispatcher<S, T> {
    store: S,
    transport: T,
    policy: DispatchPolicy,
    pacer: Box<dyn Pacer>,
    metrics: Arc<DispatchMetrics>,
    last_dispatch_time: Option<DateTime<Utc>>,
}

impl<S, T> Dispatcher<S, T>
where
    S: BufferStore + Send + Sync + 'static,
    T: AnalyzerTransport + Send + 'static,
{
    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    /// Start time of the most recent cycle, if any
    pub fn last_dispatch_time(&self) -> Option<DateTime<Utc>> {
        self.last_dispatch_time
    }

    /// Run the dispatcher loop
    ///
    /// Never returns on its own; only a fatal reconnect failure ends the loop.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> Result<(), DispatcherError> {
        info!(
            threshold = self.policy.threshold,
            frequency_in_hours = self.policy.frequency_in_hours,
            disposal_age_days = self.policy.disposal_age_days,
            batch_size = self.policy.batch_size,
            transport = self.transport.name(),
            "Dispatcher started"
        );

        loop {
            if let Err(e) = self.run_iteration().await {
                error!(error = %e, "Dispatcher stopping");
                return Err(e);
            }
        }
    }

    /// One loop iteration: wait, cycle the connection, dispatch
    #[instrument(name = "dispatcher_iteration", skip(self))]
    pub async fn run_iteration(&mut self) -> Result<CycleReport, DispatcherError> {
        let wait = self.next_wait(Utc::now());
        if !wait.is_zero() {
            self.idle(wait).await?;
        }

        let now = Utc::now();
        self.last_dispatch_time = Some(now);
        Ok(self.dispatch_cycle(now).await)
    }

    /// Sleep before the next cycle, never shorter than `min_wait`
    pub fn next_wait(&self, now: DateTime<Utc>) -> Duration {
        let wait = compute_wait_time(
            now,
            self.last_dispatch_time,
            self.policy.frequency_in_hours,
        );
        if wait.is_zero() {
            self.policy.min_wait()
        } else {
            wait
        }
    }

    async fn idle(&mut self, wait: Duration) -> Result<(), DispatcherError> {
        debug!(transport = self.transport.name(), "Closing analyzer connection");
        self.transport.close();
        observability::record_transport_event("close");

        info!(wait_secs = wait.as_secs_f64(), "Dispatcher sleeping");
        tokio::time::sleep(wait).await;

        debug!(transport = self.transport.name(), "Re-establishing analyzer connection");
        self.transport
            .reconnect()
            .await
            .map_err(DispatcherError::Connection)?;
        self.metrics.inc_reconnects();
        observability::record_transport_event("reconnect");
        Ok(())
    }

    /// Process every key in the store once
    ///
    /// Store and transport failures are logged and counted; they never abort the
    /// remaining keys. Only a failure to list keys abandons the cycle.
    #[instrument(name = "dispatcher_cycle", skip(self))]
    pub async fn dispatch_cycle(&mut self, now: DateTime<Utc>) -> CycleReport {
        let started = Instant::now();

        let keys = match self.store.list_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Listing keys failed, abandoning dispatch cycle");
                let report = CycleReport::aborted();
                self.finish_cycle(&report, started);
                return report;
            }
        };

        let current_day_index = self.store.current_day_index(now);
        let mut report = CycleReport {
            keys_seen: keys.len(),
            ..CycleReport::default()
        };

        for (key_index, key) in keys.iter().enumerate() {
            self.process_key(key, key_index, current_day_index, &mut report)
                .await;
            pause(self.pacer.delay(PaceStep::AfterKey { key_index })).await;
        }

        self.finish_cycle(&report, started);
        report
    }

    async fn process_key(
        &mut self,
        key: &GroupKey,
        key_index: usize,
        current_day_index: u32,
        report: &mut CycleReport,
    ) {
        let count = match self.store.count(key).await {
            Ok(count) => count,
            Err(e) => {
                error!(key = %key, error = %e, "Counting items failed, skipping key");
                report.keys_failed += 1;
                return;
            }
        };

        if count as u64 >= u64::from(self.policy.threshold) {
            match self.dispatch_bucket(key, key_index).await {
                Ok(outcome) => {
                    report.keys_dispatched += 1;
                    report.batches_sent += outcome.batches_sent;
                    report.batches_failed += outcome.batches_failed;
                    report.items_dispatched += outcome.items_dispatched;
                    report.items_deleted += outcome.items_deleted;
                    if outcome.delete_failed {
                        report.keys_failed += 1;
                    }
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Fetching items failed, skipping key");
                    report.keys_failed += 1;
                }
            }
        } else {
            match self.discard_stale(key, current_day_index).await {
                Ok(discarded) => {
                    report.keys_filtered += 1;
                    report.items_discarded += discarded;
                }
                Err(e) => {
                    error!(key = %key, error = %e, "Filtering stale items failed, skipping key");
                    report.keys_failed += 1;
                }
            }
        }
    }

    /// Send all items of `key` in batches, then delete them per the delivery policy
    #[instrument(name = "dispatcher_dispatch_bucket", skip(self, key), fields(key = %key))]
    async fn dispatch_bucket(
        &mut self,
        key: &GroupKey,
        key_index: usize,
    ) -> Result<BucketOutcome, ContractError> {
        let items = self.store.fetch(key).await?;
        let batches = make_batches(key, &items, self.policy.batch_size);
        let mut outcome = BucketOutcome {
            items_dispatched: items.len(),
            ..BucketOutcome::default()
        };

        for (batch_index, batch) in batches.iter().enumerate() {
            debug!(
                batch = batch_index + 1,
                of = batches.len(),
                size = batch.len(),
                "Sending batch"
            );
            match self.transport.send(batch).await {
                Ok(()) => {
                    outcome.batches_sent += 1;
                    observability::record_batch_sent(true, batch.len());
                }
                Err(e) => {
                    outcome.batches_failed += 1;
                    observability::record_batch_sent(false, batch.len());
                    error!(
                        key = %key,
                        batch = batch_index + 1,
                        size = batch.len(),
                        error = %e,
                        "Batch send failed"
                    );
                }
            }
            pause(self.pacer.delay(PaceStep::AfterBatch {
                key_index,
                batch_index,
            }))
            .await;
        }

        if items.is_empty() {
            return Ok(outcome);
        }

        if !self.policy.delivery.should_delete(outcome.batches_failed) {
            warn!(
                key = %key,
                failed = outcome.batches_failed,
                retained = items.len(),
                "Keeping items buffered after failed sends"
            );
            return Ok(outcome);
        }

        match self.store.delete(key, &items).await {
            Ok(()) => {
                outcome.items_deleted = items.len();
                observability::record_items_deleted("dispatched", items.len());
            }
            Err(e) => {
                error!(key = %key, error = %e, "Deleting dispatched items failed");
                outcome.delete_failed = true;
            }
        }

        Ok(outcome)
    }

    /// Delete items of `key` older than the disposal age; returns the number deleted
    #[instrument(name = "dispatcher_discard_stale", skip(self, key), fields(key = %key))]
    async fn discard_stale(
        &mut self,
        key: &GroupKey,
        current_day_index: u32,
    ) -> Result<usize, ContractError> {
        let items = self.store.fetch(key).await?;
        let Classified { stale, retained } =
            classify(items, current_day_index, self.policy.disposal_age_days);

        if !stale.is_empty() {
            self.store.delete(key, &stale).await?;
            observability::record_items_deleted("expired", stale.len());
            debug!(
                key = %key,
                discarded = stale.len(),
                retained = retained.len(),
                "Discarded stale items"
            );
        }

        Ok(stale.len())
    }

    fn finish_cycle(&self, report: &CycleReport, started: Instant) {
        self.metrics.record_cycle(report);
        observability::record_cycle(
            report.aborted,
            report.keys_seen,
            report.keys_failed,
            started.elapsed().as_secs_f64() * 1000.0,
        );

        info!(
            keys = report.keys_seen,
            dispatched = report.keys_dispatched,
            filtered = report.keys_filtered,
            failed = report.keys_failed,
            batches_sent = report.batches_sent,
            batches_failed = report.batches_failed,
            items_deleted = report.items_deleted,
            items_discarded = report.items_discarded,
            aborted = report.aborted,
            "Dispatch cycle complete"
        );
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Convenience function to create a dispatcher with the default pacing
pub fn create_dispatcher<S, T>(
    policy: DispatchPolicy,
    store: S,
    transport: T,
) -> Result<Dispatcher<S, T>, DispatcherError>
where
    S: BufferStore + Send + Sync + 'static,
    T: AnalyzerTransport + Send + 'static,
{
    DispatcherBuilder::new(policy)
        .store(store)
        .transport(transport)
        .build()
}
