//! Observation data types
//!
//! Buffered items as the store holds them, and batches as the analyzer receives them.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Grouping key for buffered observations
///
/// Identifies the reporting context an observation belongs to. Observations sharing a
/// key are evaluated together against the dispatch threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub customer_id: u32,
    pub project_id: u32,
    pub metric_id: u32,
    /// Day index of the reporting context (not the arrival day)
    #[serde(default)]
    pub day_index: u32,
}

impl GroupKey {
    pub fn new(customer_id: u32, project_id: u32, metric_id: u32, day_index: u32) -> Self {
        Self {
            customer_id,
            project_id,
            metric_id,
            day_index,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}@{}",
            self.customer_id, self.project_id, self.metric_id, self.day_index
        )
    }
}

/// Encryption scheme tag carried with each ciphertext
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionScheme {
    /// Plaintext (test deployments only)
    #[default]
    None,
    /// Hybrid ECDH, version 1
    HybridEcdhV1,
}

/// Opaque encrypted observation payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedMessage {
    #[serde(default)]
    pub scheme: EncryptionScheme,

    /// Fingerprint of the analyzer public key used to encrypt
    #[serde(default)]
    pub public_key_fingerprint: String,

    /// Ciphertext (zero-copy)
    pub ciphertext: Bytes,
}

impl EncryptedMessage {
    /// Wrap raw ciphertext with no scheme metadata
    pub fn from_ciphertext(ciphertext: impl Into<Bytes>) -> Self {
        Self {
            scheme: EncryptionScheme::None,
            public_key_fingerprint: String::new(),
            ciphertext: ciphertext.into(),
        }
    }
}

/// One stored unit in the buffer
///
/// Immutable once stored. `id` identifies the item for subset deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferedItem {
    pub id: String,

    pub payload: EncryptedMessage,

    /// UTC day index at which the item arrived
    pub arrival_day_index: u32,
}

impl BufferedItem {
    pub fn new(id: impl Into<String>, payload: EncryptedMessage, arrival_day_index: u32) -> Self {
        Self {
            id: id.into(),
            payload,
            arrival_day_index,
        }
    }

    /// Age in whole days relative to `current_day_index`
    ///
    /// Arrival days later than `current_day_index` count as age zero.
    pub fn age_days(&self, current_day_index: u32) -> u32 {
        current_day_index.saturating_sub(self.arrival_day_index)
    }
}

/// Ordered chunk of payloads for a single transmission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationBatch {
    pub key: GroupKey,
    pub payloads: Vec<EncryptedMessage>,
}

impl ObservationBatch {
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }
}

/// Convert a UTC instant to a day index (days since the Unix epoch)
///
/// Instants before the epoch map to day zero.
pub fn day_index_utc(now: DateTime<Utc>) -> u32 {
    let days = now.timestamp().div_euclid(SECONDS_PER_DAY);
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}
