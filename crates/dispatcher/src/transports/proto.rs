//! Analyzer wire messages
//!
//! Hand-maintained prost definitions for the analyzer's `AddObservations` call. Field
//! tags must stay in sync with the analyzer's schema.

use bytes::Bytes;

/// Fully qualified method path of the analyzer ingestion call
pub const ADD_OBSERVATIONS_PATH: &str = "/cobalt.Analyzer/AddObservations";

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObservationMetadata {
    #[prost(uint32, tag = "1")]
    pub customer_id: u32,
    #[prost(uint32, tag = "2")]
    pub project_id: u32,
    #[prost(uint32, tag = "3")]
    pub metric_id: u32,
    #[prost(uint32, tag = "4")]
    pub day_index: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct EncryptedMessage {
    /// 0 = none, 1 = hybrid ECDH v1
    #[prost(int32, tag = "1")]
    pub scheme: i32,
    #[prost(bytes = "bytes", tag = "2")]
    pub ciphertext: Bytes,
    #[prost(string, tag = "3")]
    pub public_key_fingerprint: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ObservationBatch {
    #[prost(message, optional, tag = "1")]
    pub meta_data: Option<ObservationMetadata>,
    #[prost(message, repeated, tag = "2")]
    pub encrypted_observation: Vec<EncryptedMessage>,
}

/// Analyzer acknowledgement
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Empty {}

impl From<&contracts::GroupKey> for ObservationMetadata {
    fn from(key: &contracts::GroupKey) -> Self {
        Self {
            customer_id: key.customer_id,
            project_id: key.project_id,
            metric_id: key.metric_id,
            day_index: key.day_index,
        }
    }
}

impl From<&contracts::EncryptedMessage> for EncryptedMessage {
    fn from(message: &contracts::EncryptedMessage) -> Self {
        let scheme = match message.scheme {
            contracts::EncryptionScheme::None => 0,
            contracts::EncryptionScheme::HybridEcdhV1 => 1,
        };
        Self {
            scheme,
            ciphertext: message.ciphertext.clone(),
            public_key_fingerprint: message.public_key_fingerprint.clone(),
        }
    }
}

impl From<&contracts::ObservationBatch> for ObservationBatch {
    fn from(batch: &contracts::ObservationBatch) -> Self {
        Self {
            meta_data: Some(ObservationMetadata::from(&batch.key)),
            encrypted_observation: batch.payloads.iter().map(EncryptedMessage::from).collect(),
        }
    }
}
