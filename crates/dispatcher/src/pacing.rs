//! Outbound pacing
//!
//! The only backpressure the dispatcher applies: a delay after each processed key and
//! after each batch send.

use std::time::Duration;

/// Point in the dispatch cycle at which a pacing delay is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaceStep {
    /// After a key was fully processed (dispatched, filtered or skipped)
    AfterKey { key_index: usize },
    /// After one batch of a key was handed to the transport
    AfterBatch { key_index: usize, batch_index: usize },
}

/// Maps a pacing step to a delay
pub trait Pacer: Send + Sync {
    fn delay(&self, step: PaceStep) -> Duration;
}

/// Same delay at every step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPacer {
    delay: Duration,
}

impl FixedPacer {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Pacer for FixedPacer {
    fn delay(&self, _step: PaceStep) -> Duration {
        self.delay
    }
}

/// No delay at all (tests, local runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPacing;

impl Pacer for NoPacing {
    fn delay(&self, _step: PaceStep) -> Duration {
        Duration::ZERO
    }
}

impl<F> Pacer for F
where
    F: Fn(PaceStep) -> Duration + Send + Sync,
{
    fn delay(&self, step: PaceStep) -> Duration {
        self(step)
    }
}
