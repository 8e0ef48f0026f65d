//! RecordingTransport - in-process analyzer double
//!
//! Records every batch handed to it and can be told to fail specific sends or the
//! next reconnect. Clones share state, so a test can keep one handle while the
//! dispatcher owns another.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{AnalyzerTransport, ContractError, ObservationBatch};
use tracing::debug;

#[derive(Debug, Default)]
struct Recording {
    open: bool,
    attempted: Vec<ObservationBatch>,
    delivered: Vec<ObservationBatch>,
    failing_attempts: HashSet<usize>,
    fail_next_reconnect: bool,
    closes: usize,
    reconnects: usize,
}

/// Transport that keeps batches in memory instead of sending them
#[derive(Debug, Clone)]
pub struct RecordingTransport {
    name: String,
    state: Arc<Mutex<Recording>>,
}

impl RecordingTransport {
    /// Create an open transport
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(Recording {
                open: true,
                ..Recording::default()
            })),
        }
    }

    /// Make the send with zero-based attempt number `attempt` fail
    pub fn fail_on_attempt(&self, attempt: usize) {
        self.state().failing_attempts.insert(attempt);
    }

    /// Make the next `reconnect` fail
    pub fn fail_next_reconnect(&self) {
        self.state().fail_next_reconnect = true;
    }

    /// Every batch passed to `send`, in call order
    pub fn attempted(&self) -> Vec<ObservationBatch> {
        self.state().attempted.clone()
    }

    /// Batches that were accepted
    pub fn delivered(&self) -> Vec<ObservationBatch> {
        self.state().delivered.clone()
    }

    pub fn closes(&self) -> usize {
        self.state().closes
    }

    pub fn reconnects(&self) -> usize {
        self.state().reconnects
    }

    fn state(&self) -> MutexGuard<'_, Recording> {
        // A panic while holding the lock only happens inside a failing test.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AnalyzerTransport for RecordingTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.state().open
    }

    async fn send(&mut self, batch: &ObservationBatch) -> Result<(), ContractError> {
        let mut state = self.state();
        if !state.open {
            return Err(ContractError::TransportClosed {
                transport: self.name.clone(),
            });
        }

        let attempt = state.attempted.len();
        state.attempted.push(batch.clone());

        if state.failing_attempts.contains(&attempt) {
            debug!(transport = %self.name, attempt, "Injected send failure");
            return Err(ContractError::transport_send(
                &self.name,
                format!("injected failure on attempt {attempt}"),
            ));
        }

        state.delivered.push(batch.clone());
        Ok(())
    }

    fn close(&mut self) {
        let mut state = self.state();
        if state.open {
            state.open = false;
            state.closes += 1;
        }
    }

    async fn reconnect(&mut self) -> Result<(), ContractError> {
        let mut state = self.state();
        if state.open {
            return Ok(());
        }
        if std::mem::take(&mut state.fail_next_reconnect) {
            return Err(ContractError::transport_connection(
                &self.name,
                "injected reconnect failure",
            ));
        }
        state.open = true;
        state.reconnects += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EncryptedMessage, GroupKey};

    fn batch(n: usize) -> ObservationBatch {
        ObservationBatch {
            key: GroupKey::new(1, 1, 1, 0),
            payloads: (0..n)
                .map(|i| EncryptedMessage::from_ciphertext(vec![i as u8]))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_records_and_injects_failures() {
        let mut transport = RecordingTransport::new("rec");
        let probe = transport.clone();
        probe.fail_on_attempt(1);

        assert!(transport.send(&batch(2)).await.is_ok());
        assert!(transport.send(&batch(1)).await.is_err());
        assert!(transport.send(&batch(3)).await.is_ok());

        assert_eq!(probe.attempted().len(), 3);
        assert_eq!(probe.delivered().len(), 2);
        assert_eq!(probe.delivered()[1].len(), 3);
    }

    #[tokio::test]
    async fn test_send_while_closed_fails() {
        let mut transport = RecordingTransport::new("rec");
        transport.close();
        transport.close();
        assert_eq!(transport.closes(), 1);

        let err = transport.send(&batch(1)).await.unwrap_err();
        assert!(matches!(err, ContractError::TransportClosed { .. }));
        assert!(transport.attempted().is_empty());
    }

    #[tokio::test]
    async fn test_reconnect_failure_is_one_shot() {
        let mut transport = RecordingTransport::new("rec");
        transport.fail_next_reconnect();
        transport.close();

        assert!(transport.reconnect().await.is_err());
        assert!(!transport.is_open());
        assert!(transport.reconnect().await.is_ok());
        assert!(transport.is_open());
        assert_eq!(transport.reconnects(), 1);
    }
}
