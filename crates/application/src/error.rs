//! Orchestration error types.

use domain::{OrderError, RepositoryError, StockError, ValidationError};
use thiserror::Error;

/// Errors that can occur while executing a command.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The intent carried malformed input.
    #[error("Invalid command: {0}")]
    Validation(#[from] ValidationError),

    /// The order rejected the operation.
    #[error("Order rejected command: {0}")]
    Order(#[from] OrderError),

    /// The stock item rejected the operation.
    #[error("Stock item rejected command: {0}")]
    Stock(#[from] StockError),

    /// Loading or saving failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A create command targeted an identity that is already taken.
    #[error("{aggregate_type} {id} already exists")]
    AlreadyExists {
        aggregate_type: &'static str,
        id: String,
    },
}

impl ApplicationError {
    /// Returns true if reloading and reapplying the command may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApplicationError::Repository(e) if e.is_conflict())
    }

    /// Returns true if the target aggregate does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ApplicationError::Repository(RepositoryError::NotFound { .. })
        )
    }
}

/// Convenience type alias for orchestration results.
pub type Result<T> = std::result::Result<T, ApplicationError>;
