//! Order lifecycle.

use serde::{Deserialize, Serialize};

use crate::aggregate::LifecycleState;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Draft ──► Placed ──► Confirmed ──► Completed
///   │         │           │
///   └─────────┴───────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    /// Order is being assembled; lines can be added, changed and removed.
    #[default]
    Draft,

    /// Customer committed to the order.
    Placed,

    /// Order was accepted for fulfilment.
    Confirmed,

    /// Order was fulfilled (terminal state).
    Completed,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// States from which lines may be edited.
    pub const EDITABLE: &'static [OrderStatus] = &[OrderStatus::Draft];

    /// States from which the order may be cancelled.
    pub const CANCELLABLE: &'static [OrderStatus] = &[
        OrderStatus::Draft,
        OrderStatus::Placed,
        OrderStatus::Confirmed,
    ];

    /// Returns true if the order can be cancelled in this state.
    pub fn can_cancel(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "Draft",
            OrderStatus::Placed => "Placed",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

impl LifecycleState for OrderStatus {
    fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
