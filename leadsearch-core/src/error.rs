//! Core error types for `LeadSearch`.

use thiserror::Error;

/// Core error type for `LeadSearch` operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A backing store (usage ledger, URL log) could not be reached.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data, e.g. a malformed result URL.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl CoreError {
    /// Returns true if this error means the backing store was unreachable.
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, CoreError::StorageUnavailable(_))
    }
}
