use thiserror::Error;

use crate::Version;

/// Errors that can occur when interacting with a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer committed first: the expected version did not match the
    /// stored one. Nothing was written.
    #[error(
        "Concurrency conflict for {aggregate_type} {aggregate_key}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: String,
        aggregate_key: String,
        expected: Version,
        actual: Version,
    },

    /// The record was rejected before reaching storage.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The backing storage could not complete the write.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for failures that a caller may resolve by reloading and
    /// reapplying its change.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
