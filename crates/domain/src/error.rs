//! Error taxonomy shared by value types, entities and aggregates.
//!
//! Every kind here is raised synchronously by domain code that performs no
//! I/O, and every one is caller-fixable: none of them is retried internally.

use std::fmt;

use common::AggregateId;
use thiserror::Error;

use crate::value_objects::Currency;

/// A value failed self-validation at construction time, or an intent carried
/// malformed input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field was missing or blank.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// A numeric field fell outside its permitted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// A textual field did not match its expected format.
    #[error("{field} has an invalid format: {reason}")]
    InvalidFormat { field: &'static str, reason: String },
}

impl ValidationError {
    pub(crate) fn out_of_range(field: &'static str, value: i64, min: i64, max: i64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    pub(crate) fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            field,
            reason: reason.into(),
        }
    }

    /// Returns the name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Required { field }
            | Self::OutOfRange { field, .. }
            | Self::InvalidFormat { field, .. } => field,
        }
    }
}

/// Two values of incompatible dimensions were combined.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {operation} {left} with {right}: currencies differ")]
pub struct DimensionMismatchError {
    pub operation: &'static str,
    pub left: Currency,
    pub right: Currency,
}

/// An entity-level operation was attempted while the entity was in a state
/// that does not permit it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {operation} {entity}: it is {current}, operation requires {required}")]
pub struct StateConflictError {
    pub entity: &'static str,
    pub operation: &'static str,
    pub current: String,
    pub required: String,
}

/// An aggregate lifecycle operation was attempted from a state outside its
/// allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {attempted} from {current} state")]
pub struct InvalidTransitionError<S: fmt::Debug + fmt::Display> {
    pub current: S,
    pub attempted: &'static str,
}

/// An operation-specific business rule failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    /// An order cannot be placed without lines.
    #[error("order has no lines")]
    NoLines,

    /// The addressed line does not belong to the order.
    #[error("order has no line {line_id}")]
    LineNotFound { line_id: String },

    /// The order already holds the maximum number of open lines.
    #[error("order cannot hold more than {max} open lines")]
    TooManyLines { max: usize },

    /// Not enough unreserved stock to satisfy a reservation.
    #[error("insufficient stock for {sku}: requested {requested}, available {available}")]
    InsufficientStock {
        sku: String,
        requested: u32,
        available: u32,
    },

    /// The order already holds a reservation on this stock item.
    #[error("order {order_id} already holds a reservation")]
    DuplicateReservation { order_id: AggregateId },

    /// No reservation is held for the order.
    #[error("no reservation held for order {order_id}")]
    UnknownReservation { order_id: AggregateId },

    /// Stock cannot be discontinued while orders still hold reservations.
    #[error("{count} reservations are still outstanding")]
    OutstandingReservations { count: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_its_field() {
        let err = ValidationError::out_of_range("quantity", 0, 1, 10);
        assert_eq!(err.field(), "quantity");
        assert_eq!(
            err.to_string(),
            "quantity must be between 1 and 10, got 0"
        );
    }

    #[test]
    fn invalid_transition_message_cites_both_sides() {
        let err = InvalidTransitionError {
            current: "Placed",
            attempted: "place",
        };
        assert_eq!(err.to_string(), "cannot place from Placed state");
    }
}
