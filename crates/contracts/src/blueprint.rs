//! ShufflerBlueprint - Config Loader output
//!
//! Describes the complete dispatcher configuration: dispatch policy and analyzer
//! connection parameters.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ShufflerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatch policy
    #[validate(nested)]
    pub dispatch: DispatchPolicy,

    /// Analyzer connection
    #[validate(nested)]
    pub analyzer: AnalyzerConfig,
}

/// Dispatch policy: thresholds, cadence, retention and chunking
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DispatchPolicy {
    /// Minimum buffered item count for a group to qualify for dispatch
    pub threshold: u32,

    /// Minimum elapsed hours between dispatch cycles
    pub frequency_in_hours: u32,

    /// Maximum age in days a sub-threshold item may stay buffered
    pub disposal_age_days: u32,

    /// Maximum items per transmitted batch
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1))]
    pub batch_size: usize,

    /// Delay after each key and each batch send (milliseconds)
    #[serde(default = "default_pacing_delay_ms")]
    pub pacing_delay_ms: u64,

    /// Minimum sleep between loop iterations (seconds)
    #[serde(default = "default_min_wait_secs")]
    #[validate(range(min = 1))]
    pub min_wait_secs: u64,

    /// What happens to dispatched items when a send fails
    #[serde(default)]
    pub delivery: DeliveryPolicy,
}

fn default_batch_size() -> usize {
    100
}

fn default_pacing_delay_ms() -> u64 {
    2_000
}

fn default_min_wait_secs() -> u64 {
    3
}

impl DispatchPolicy {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn min_wait(&self) -> Duration {
        Duration::from_secs(self.min_wait_secs)
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            threshold: 100,
            frequency_in_hours: 24,
            disposal_age_days: 4,
            batch_size: default_batch_size(),
            pacing_delay_ms: default_pacing_delay_ms(),
            min_wait_secs: default_min_wait_secs(),
            delivery: DeliveryPolicy::default(),
        }
    }
}

/// Delivery guarantee for dispatched groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Delete dispatched items after every batch was attempted, even if some sends failed
    #[default]
    AtMostOnce,
    /// Keep the group's items buffered if any batch failed to send
    RetainOnFailure,
}

impl DeliveryPolicy {
    /// Whether dispatched items should be deleted given the number of failed sends
    pub fn should_delete(self, failed_batches: usize) -> bool {
        match self {
            DeliveryPolicy::AtMostOnce => true,
            DeliveryPolicy::RetainOnFailure => failed_batches == 0,
        }
    }
}

/// Analyzer connection parameters
///
/// If `enable_tls` is false a plaintext connection is used and `ca_file` is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalyzerConfig {
    /// Analyzer endpoint (`host:port` or full URI)
    #[validate(length(min = 1))]
    pub url: String,

    /// Require TLS
    #[serde(default)]
    pub enable_tls: bool,

    /// PEM bundle of trusted roots (optional; native roots otherwise)
    #[serde(default)]
    pub ca_file: Option<PathBuf>,

    /// Connect and request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl AnalyzerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
