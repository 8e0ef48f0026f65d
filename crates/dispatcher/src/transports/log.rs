//! LogTransport - logs batch summaries via tracing instead of sending them

use contracts::{AnalyzerTransport, ContractError, ObservationBatch};
use tracing::{info, instrument};

/// Transport that logs batch summaries for dry runs
pub struct LogTransport {
    name: String,
    open: bool,
}

impl LogTransport {
    /// Create a new open LogTransport with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            open: true,
        }
    }

    fn log_batch_summary(&self, batch: &ObservationBatch) {
        let bytes: usize = batch.payloads.iter().map(|p| p.ciphertext.len()).sum();

        info!(
            transport = %self.name,
            key = %batch.key,
            observations = batch.len(),
            bytes,
            "ObservationBatch dispatched"
        );
    }
}

impl AnalyzerTransport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    #[instrument(
        name = "log_transport_send",
        skip(self, batch),
        fields(transport = %self.name, key = %batch.key)
    )]
    async fn send(&mut self, batch: &ObservationBatch) -> Result<(), ContractError> {
        if !self.open {
            return Err(ContractError::TransportClosed {
                transport: self.name.clone(),
            });
        }
        self.log_batch_summary(batch);
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    #[instrument(name = "log_transport_reconnect", skip(self))]
    async fn reconnect(&mut self) -> Result<(), ContractError> {
        self.open = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{EncryptedMessage, GroupKey};

    #[tokio::test]
    async fn test_log_transport_send() {
        let mut transport = LogTransport::new("test_log");
        let batch = ObservationBatch {
            key: GroupKey::new(1, 2, 3, 4),
            payloads: vec![EncryptedMessage::from_ciphertext(vec![1u8, 2, 3])],
        };

        assert!(transport.send(&batch).await.is_ok());

        transport.close();
        assert!(transport.send(&batch).await.is_err());

        transport.reconnect().await.unwrap();
        assert!(transport.is_open());
    }

    #[tokio::test]
    async fn test_log_transport_name() {
        let transport = LogTransport::new("my_logger");
        assert_eq!(transport.name(), "my_logger");
    }
}
