//! Order domain events.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{DomainEvent, EventMetadata};
use crate::value_objects::{CustomerId, EmailAddress, Money, Quantity, Sku};

use super::{OrderLineId, OrderStatus};

/// Events raised by the order aggregate, one per lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    /// The customer committed to the order.
    OrderPlaced(OrderPlacedData),

    /// The order was accepted for fulfilment.
    OrderConfirmed(OrderConfirmedData),

    /// The order was fulfilled.
    OrderCompleted(OrderCompletedData),

    /// The order was cancelled.
    OrderCancelled(OrderCancelledData),
}

impl OrderEvent {
    pub const PLACED: &'static str = "OrderPlaced";
    pub const CONFIRMED: &'static str = "OrderConfirmed";
    pub const COMPLETED: &'static str = "OrderCompleted";
    pub const CANCELLED: &'static str = "OrderCancelled";

    /// Returns the order the event is about.
    pub fn order_id(&self) -> AggregateId {
        match self {
            OrderEvent::OrderPlaced(data) => data.order_id,
            OrderEvent::OrderConfirmed(data) => data.order_id,
            OrderEvent::OrderCompleted(data) => data.order_id,
            OrderEvent::OrderCancelled(data) => data.order_id,
        }
    }
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderPlaced(_) => Self::PLACED,
            OrderEvent::OrderConfirmed(_) => Self::CONFIRMED,
            OrderEvent::OrderCompleted(_) => Self::COMPLETED,
            OrderEvent::OrderCancelled(_) => Self::CANCELLED,
        }
    }

    fn metadata(&self) -> &EventMetadata {
        match self {
            OrderEvent::OrderPlaced(data) => &data.metadata,
            OrderEvent::OrderConfirmed(data) => &data.metadata,
            OrderEvent::OrderCompleted(data) => &data.metadata,
            OrderEvent::OrderCancelled(data) => &data.metadata,
        }
    }
}

/// Snapshot of one open line at the time of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSnapshot {
    pub line_id: OrderLineId,
    pub sku: Sku,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub line_total: Money,
}

/// Data for OrderPlaced event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPlacedData {
    pub metadata: EventMetadata,

    /// The order that was placed.
    pub order_id: AggregateId,

    /// The customer who placed it.
    pub customer_id: CustomerId,

    /// Where to send notifications, if the customer gave an address.
    pub contact_email: Option<EmailAddress>,

    /// Open lines at placement time.
    pub lines: Vec<LineSnapshot>,

    /// Order total at placement time.
    pub total: Money,

    pub placed_at: DateTime<Utc>,
}

/// Data for OrderConfirmed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderConfirmedData {
    pub metadata: EventMetadata,
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub total: Money,
    pub confirmed_at: DateTime<Utc>,
}

/// Data for OrderCompleted event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCompletedData {
    pub metadata: EventMetadata,
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub total: Money,
    pub completed_at: DateTime<Utc>,
}

/// Data for OrderCancelled event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCancelledData {
    pub metadata: EventMetadata,
    pub order_id: AggregateId,
    pub customer_id: CustomerId,

    /// Why the order was cancelled.
    pub reason: String,

    /// Status the order was in when cancelled. Stock is only held for orders
    /// that got past Draft.
    pub previous_status: OrderStatus,

    /// Open lines at cancellation time.
    pub lines: Vec<LineSnapshot>,

    pub total: Money,
    pub cancelled_at: DateTime<Utc>,
}
