//! Stock item aggregate.
//!
//! Stock is its own consistency boundary: orders never touch it directly.
//! Reservations are made and released by event handlers reacting to order
//! events, each in a transaction of its own.

mod aggregate;
mod events;

pub use aggregate::{Reservation, StockItem, StockItemSnapshot};
pub use events::{
    StockDiscontinuedData, StockEvent, StockReceivedData, StockReleasedData, StockReservedData,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::LifecycleState;
use crate::error::{InvalidTransitionError, PreconditionError, ValidationError};

/// The status of a stock item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StockStatus {
    /// Stock can be received and reserved.
    #[default]
    Active,

    /// Item is no longer sold (terminal state).
    Discontinued,
}

impl LifecycleState for StockStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, StockStatus::Discontinued)
    }
}

impl std::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockStatus::Active => f.write_str("Active"),
            StockStatus::Discontinued => f.write_str("Discontinued"),
        }
    }
}

/// Errors that can occur during stock operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError<StockStatus>),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}
