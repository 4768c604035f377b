//! Stock domain events.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{DomainEvent, EventMetadata};
use crate::value_objects::{Quantity, Sku};

/// Events raised by the stock item aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum StockEvent {
    StockReceived(StockReceivedData),
    StockReserved(StockReservedData),
    StockReleased(StockReleasedData),
    StockDiscontinued(StockDiscontinuedData),
}

impl StockEvent {
    pub const RECEIVED: &'static str = "StockReceived";
    pub const RESERVED: &'static str = "StockReserved";
    pub const RELEASED: &'static str = "StockReleased";
    pub const DISCONTINUED: &'static str = "StockDiscontinued";
}

impl DomainEvent for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::StockReceived(_) => Self::RECEIVED,
            StockEvent::StockReserved(_) => Self::RESERVED,
            StockEvent::StockReleased(_) => Self::RELEASED,
            StockEvent::StockDiscontinued(_) => Self::DISCONTINUED,
        }
    }

    fn metadata(&self) -> &EventMetadata {
        match self {
            StockEvent::StockReceived(data) => &data.metadata,
            StockEvent::StockReserved(data) => &data.metadata,
            StockEvent::StockReleased(data) => &data.metadata,
            StockEvent::StockDiscontinued(data) => &data.metadata,
        }
    }
}

/// Data for StockReceived event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReceivedData {
    pub metadata: EventMetadata,
    pub sku: Sku,
    pub quantity: Quantity,
    pub on_hand: u32,
}

/// Data for StockReserved event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReservedData {
    pub metadata: EventMetadata,
    pub sku: Sku,
    pub order_id: AggregateId,
    pub units: u32,

    /// Units still free after the reservation.
    pub available: u32,
}

/// Data for StockReleased event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockReleasedData {
    pub metadata: EventMetadata,
    pub sku: Sku,
    pub order_id: AggregateId,
    pub units: u32,
    pub available: u32,
}

/// Data for StockDiscontinued event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockDiscontinuedData {
    pub metadata: EventMetadata,
    pub sku: Sku,
    pub on_hand: u32,
}
