//! Demo error types.

use application::ApplicationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop the demo.
#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Tracing or metrics could not be installed.
    #[error("Telemetry setup failed: {0}")]
    Telemetry(String),

    /// A step that should have succeeded was rejected.
    #[error("Command failed: {0}")]
    Command(#[from] ApplicationError),

    /// A step produced a different outcome than the scenario expects.
    #[error("Unexpected outcome: {0}")]
    Unexpected(String),
}

pub type Result<T> = std::result::Result<T, DemoError>;
