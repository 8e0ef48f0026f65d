//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Analyzer could not be reached at start-up
    #[error("Failed to connect to analyzer at {url}: {message}")]
    AnalyzerConnection { url: String, message: String },

    /// Seed file could not be loaded into the buffer
    #[error("Failed to load seed file {path}: {message}")]
    Seed { path: String, message: String },

    /// The dispatcher loop ended with an error
    #[error("Dispatcher failed: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// Dispatcher task could not be joined
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn analyzer_connection(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AnalyzerConnection {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn seed(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Seed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}
