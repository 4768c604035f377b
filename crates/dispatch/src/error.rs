//! Handler error types.

use std::time::Duration;

use thiserror::Error;

/// Errors a handler can report for a single delivery.
///
/// Handler errors are isolated: the dispatcher records them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// The handler could not complete its work.
    #[error("Handler failed: {0}")]
    Failed(String),

    /// The handler did not finish within the configured timeout.
    #[error("Handler timed out after {0:?}")]
    TimedOut(Duration),
}

impl HandlerError {
    /// Creates a failure from any displayable error.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }
}

/// Result type for handler operations.
pub type Result<T> = std::result::Result<T, HandlerError>;
