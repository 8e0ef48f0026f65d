//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
///
/// Every variant is fatal for the engine; per-key and per-batch failures are logged
/// inside the dispatch cycle and never surface here.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Invalid start-up configuration
    #[error("invalid dispatcher config at '{field}': {message}")]
    InvalidConfig { field: String, message: String },

    /// A required collaborator was not supplied to the builder
    #[error("dispatcher {component} is not set")]
    MissingComponent { component: &'static str },

    /// A dispatcher was already launched in this process
    #[error("dispatcher already running; launch must not be invoked twice")]
    AlreadyRunning,

    /// Analyzer connection could not be (re-)established
    #[error("analyzer connection failed: {0}")]
    Connection(#[source] contracts::ContractError),
}

impl DispatcherError {
    /// Create an invalid config error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
