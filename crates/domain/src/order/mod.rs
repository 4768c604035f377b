//! Order aggregate and related types.

mod aggregate;
mod events;
mod line;
mod state;

pub use aggregate::{MAX_OPEN_LINES, Order, OrderSnapshot};
pub use events::{
    LineSnapshot, OrderCancelledData, OrderCompletedData, OrderConfirmedData, OrderEvent,
    OrderPlacedData,
};
pub use line::{LineStatus, OrderLine, OrderLineId, OrderLineRecord};
pub use state::OrderStatus;

use thiserror::Error;

use crate::error::{
    DimensionMismatchError, InvalidTransitionError, PreconditionError, StateConflictError,
    ValidationError,
};

/// Errors that can occur during order operations.
///
/// A failed operation leaves the order exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    DimensionMismatch(#[from] DimensionMismatchError),

    #[error(transparent)]
    StateConflict(#[from] StateConflictError),

    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransitionError<OrderStatus>),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),
}
