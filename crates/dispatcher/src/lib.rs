//! # Dispatcher
//!
//! Periodic dispatch of buffered observations to the analyzer.
//!
//! Responsibilities:
//! - Wait out the dispatch frequency, cycling the analyzer connection meanwhile
//! - Send groups at or above the threshold in bounded batches, then delete them
//! - Age out stale items of groups below the threshold
//! - Pace outbound traffic after every key and batch

pub mod batch;
pub mod dispatcher;
pub mod error;
pub mod launcher;
pub mod metrics;
pub mod pacing;
pub mod retention;
pub mod schedule;
pub mod transports;

pub use contracts::{AnalyzerTransport, BufferStore, DispatchPolicy};
pub use dispatcher::{create_dispatcher, CycleReport, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use launcher::Launcher;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use pacing::{FixedPacer, NoPacing, PaceStep, Pacer};
pub use transports::{GrpcAnalyzerTransport, LogTransport, RecordingTransport};
