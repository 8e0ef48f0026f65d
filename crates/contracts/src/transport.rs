//! AnalyzerTransport trait - Dispatcher output interface
//!
//! State machine: OPEN --close--> CLOSED --reconnect--> OPEN.
//! `send` is only valid while OPEN.

use crate::{ContractError, ObservationBatch};

/// Connection to the downstream analyzer
#[trait_variant::make(AnalyzerTransport: Send)]
pub trait LocalAnalyzerTransport {
    /// Transport name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Whether the connection is currently open
    fn is_open(&self) -> bool;

    /// Send one batch without retry
    ///
    /// # Errors
    /// `TransportClosed` when invoked while closed, `TransportSend` on delivery failure.
    async fn send(&mut self, batch: &ObservationBatch) -> Result<(), ContractError>;

    /// Release the connection; no-op when already closed
    fn close(&mut self);

    /// Re-establish the connection when closed; no-op when already open
    ///
    /// # Errors
    /// `TransportConnection` if the single connection attempt fails.
    async fn reconnect(&mut self) -> Result<(), ContractError>;
}
