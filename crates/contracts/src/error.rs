//! Layered error definitions
//!
//! Categorized by source: config / store / transport

use thiserror::Error;

use crate::GroupKey;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Store Errors =====
    /// Listing group keys failed
    #[error("store error listing keys: {message}")]
    StoreListKeys { message: String },

    /// Reading items (count or fetch) for a key failed
    #[error("store read error for key {key}: {message}")]
    StoreRead { key: GroupKey, message: String },

    /// Deleting items for a key failed
    #[error("store delete error for key {key}: {message}")]
    StoreDelete { key: GroupKey, message: String },

    // ===== Transport Errors =====
    /// Connection could not be established
    #[error("transport '{transport}' connection error: {message}")]
    TransportConnection { transport: String, message: String },

    /// A batch could not be delivered
    #[error("transport '{transport}' send error: {message}")]
    TransportSend { transport: String, message: String },

    /// Send attempted while the connection is closed
    #[error("transport '{transport}' is closed")]
    TransportClosed { transport: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create store read error
    pub fn store_read(key: &GroupKey, message: impl Into<String>) -> Self {
        Self::StoreRead {
            key: *key,
            message: message.into(),
        }
    }

    /// Create store delete error
    pub fn store_delete(key: &GroupKey, message: impl Into<String>) -> Self {
        Self::StoreDelete {
            key: *key,
            message: message.into(),
        }
    }

    /// Create transport connection error
    pub fn transport_connection(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportConnection {
            transport: transport.into(),
            message: message.into(),
        }
    }

    /// Create transport send error
    pub fn transport_send(transport: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportSend {
            transport: transport.into(),
            message: message.into(),
        }
    }
}
