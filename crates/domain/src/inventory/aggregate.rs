//! Stock item aggregate implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};
use store::Version;

use crate::aggregate::{AggregateRoot, EventBuffer, EventMetadata, ensure_transition};
use crate::entity::{Entity, identity_equality};
use crate::error::{PreconditionError, ValidationError};
use crate::value_objects::{Quantity, Sku};

use super::{
    StockError, StockEvent, StockStatus,
    events::{StockDiscontinuedData, StockReceivedData, StockReleasedData, StockReservedData},
};

const ACTIVE: &[StockStatus] = &[StockStatus::Active];

/// Stock held for one SKU, and the orders it is reserved for.
///
/// Invariant: the reserved total never exceeds the units on hand.
#[derive(Debug, Clone)]
pub struct StockItem {
    sku: Sku,
    version: Version,
    status: StockStatus,
    on_hand: u32,
    reservations: BTreeMap<AggregateId, u32>,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: EventBuffer<StockEvent>,
}

identity_equality!(StockItem);

impl Entity for StockItem {
    type Id = Sku;

    fn id(&self) -> &Sku {
        &self.sku
    }
}

/// Units held for a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub order_id: AggregateId,
    pub units: u32,
}

/// Flat persisted form of a stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItemSnapshot {
    pub sku: Sku,
    pub status: StockStatus,
    pub on_hand: u32,
    pub reservations: Vec<Reservation>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AggregateRoot for StockItem {
    type Id = Sku;
    type Event = StockEvent;
    type Snapshot = StockItemSnapshot;

    fn aggregate_type() -> &'static str {
        "StockItem"
    }

    fn aggregate_id(&self) -> &Sku {
        &self.sku
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn pending_events(&self) -> &[StockEvent] {
        self.events.pending()
    }

    fn take_pending_events(&mut self) -> Vec<StockEvent> {
        self.events.drain()
    }

    fn snapshot(&self) -> StockItemSnapshot {
        StockItemSnapshot {
            sku: self.sku.clone(),
            status: self.status,
            on_hand: self.on_hand,
            reservations: self
                .reservations
                .iter()
                .map(|(order_id, units)| Reservation {
                    order_id: *order_id,
                    units: *units,
                })
                .collect(),
            registered_at: self.registered_at,
            updated_at: self.updated_at,
        }
    }

    fn reconstitute(snapshot: StockItemSnapshot, version: Version) -> Self {
        Self {
            sku: snapshot.sku,
            version,
            status: snapshot.status,
            on_hand: snapshot.on_hand,
            reservations: snapshot
                .reservations
                .into_iter()
                .map(|r| (r.order_id, r.units))
                .collect(),
            registered_at: snapshot.registered_at,
            updated_at: snapshot.updated_at,
            events: EventBuffer::new(),
        }
    }
}

impl StockItem {
    /// Registers a SKU with an opening balance. Raises no event.
    pub fn register(sku: Sku, on_hand: u32) -> Self {
        let now = Utc::now();
        Self {
            sku,
            version: Version::initial(),
            status: StockStatus::Active,
            on_hand,
            reservations: BTreeMap::new(),
            registered_at: now,
            updated_at: now,
            events: EventBuffer::new(),
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    /// Returns the physical units held.
    pub fn on_hand(&self) -> u32 {
        self.on_hand
    }

    /// Returns the units held for orders.
    pub fn reserved(&self) -> u32 {
        self.reservations.values().sum()
    }

    /// Returns the units that can still be reserved.
    pub fn available(&self) -> u32 {
        self.on_hand.saturating_sub(self.reserved())
    }

    /// Returns the reservation held for an order, if any.
    pub fn reservation_for(&self, order_id: &AggregateId) -> Option<u32> {
        self.reservations.get(order_id).copied()
    }

    /// Adds delivered units to the balance.
    pub fn receive(&mut self, quantity: Quantity) -> Result<(), StockError> {
        ensure_transition(self.status, ACTIVE, "receive stock")?;
        let on_hand = self.on_hand.checked_add(quantity.get()).ok_or_else(|| {
            ValidationError::out_of_range(
                "on hand",
                i64::from(self.on_hand) + i64::from(quantity.get()),
                0,
                i64::from(u32::MAX),
            )
        })?;

        self.on_hand = on_hand;
        self.updated_at = Utc::now();
        self.events.record(StockEvent::StockReceived(StockReceivedData {
            metadata: self.event_metadata(),
            sku: self.sku.clone(),
            quantity,
            on_hand,
        }));
        Ok(())
    }

    /// Holds units for an order.
    ///
    /// The amount is an order's whole demand for the SKU, which may span
    /// several lines, so it is bounded by availability rather than by
    /// [`Quantity::MAX`].
    pub fn reserve(&mut self, order_id: AggregateId, units: u32) -> Result<(), StockError> {
        ensure_transition(self.status, ACTIVE, "reserve stock")?;
        if units == 0 {
            return Err(
                ValidationError::out_of_range("reserved units", 0, 1, i64::from(u32::MAX)).into(),
            );
        }
        if self.reservations.contains_key(&order_id) {
            return Err(PreconditionError::DuplicateReservation { order_id }.into());
        }
        let available = self.available();
        if units > available {
            return Err(PreconditionError::InsufficientStock {
                sku: self.sku.to_string(),
                requested: units,
                available,
            }
            .into());
        }

        self.reservations.insert(order_id, units);
        self.updated_at = Utc::now();
        self.events.record(StockEvent::StockReserved(StockReservedData {
            metadata: self.event_metadata(),
            sku: self.sku.clone(),
            order_id,
            units,
            available: self.available(),
        }));
        Ok(())
    }

    /// Returns the units held for an order to the free pool.
    pub fn release(&mut self, order_id: AggregateId) -> Result<(), StockError> {
        ensure_transition(self.status, ACTIVE, "release stock")?;
        let Some(units) = self.reservations.remove(&order_id) else {
            return Err(PreconditionError::UnknownReservation { order_id }.into());
        };

        self.updated_at = Utc::now();
        self.events.record(StockEvent::StockReleased(StockReleasedData {
            metadata: self.event_metadata(),
            sku: self.sku.clone(),
            order_id,
            units,
            available: self.available(),
        }));
        Ok(())
    }

    /// Retires the SKU. Only possible once no order holds a reservation.
    pub fn discontinue(&mut self) -> Result<(), StockError> {
        ensure_transition(self.status, ACTIVE, "discontinue")?;
        if !self.reservations.is_empty() {
            return Err(PreconditionError::OutstandingReservations {
                count: self.reservations.len(),
            }
            .into());
        }

        self.status = StockStatus::Discontinued;
        self.updated_at = Utc::now();
        self.events
            .record(StockEvent::StockDiscontinued(StockDiscontinuedData {
                metadata: self.event_metadata(),
                sku: self.sku.clone(),
                on_hand: self.on_hand,
            }));
        Ok(())
    }

    fn event_metadata(&self) -> EventMetadata {
        EventMetadata::new(Self::aggregate_type(), &self.sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;

    fn item(on_hand: u32) -> StockItem {
        StockItem::register(Sku::new("SKU-1").unwrap(), on_hand)
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn register_raises_no_event() {
        let stock = item(10);
        assert_eq!(stock.available(), 10);
        assert!(stock.pending_events().is_empty());
    }

    #[test]
    fn reserve_reduces_availability() {
        let mut stock = item(10);
        let order = AggregateId::new();

        stock.reserve(order, 4).unwrap();

        assert_eq!(stock.reserved(), 4);
        assert_eq!(stock.available(), 6);
        assert_eq!(stock.reservation_for(&order), Some(4));
        assert_eq!(stock.pending_events()[0].event_type(), StockEvent::RESERVED);
    }

    #[test]
    fn reserve_beyond_available_fails_unchanged() {
        let mut stock = item(3);
        stock.reserve(AggregateId::new(), 2).unwrap();
        stock.take_pending_events();
        let before = stock.snapshot();

        let err = stock.reserve(AggregateId::new(), 2).unwrap_err();

        assert_eq!(
            err,
            StockError::Precondition(PreconditionError::InsufficientStock {
                sku: "SKU-1".to_string(),
                requested: 2,
                available: 1,
            })
        );
        assert_eq!(stock.snapshot(), before);
        assert!(stock.pending_events().is_empty());
    }

    #[test]
    fn reserve_is_not_capped_at_line_quantity() {
        let mut stock = item(20_000);
        let order = AggregateId::new();

        stock.reserve(order, 12_000).unwrap();

        assert_eq!(stock.reservation_for(&order), Some(12_000));
        assert_eq!(stock.available(), 8_000);
    }

    #[test]
    fn reserve_zero_units_is_invalid() {
        let mut stock = item(5);

        let err = stock.reserve(AggregateId::new(), 0).unwrap_err();

        assert!(matches!(err, StockError::Validation(_)));
        assert_eq!(stock.reserved(), 0);
        assert!(stock.pending_events().is_empty());
    }

    #[test]
    fn second_reservation_for_same_order_is_rejected() {
        let mut stock = item(10);
        let order = AggregateId::new();
        stock.reserve(order, 1).unwrap();

        let err = stock.reserve(order, 1).unwrap_err();

        assert_eq!(
            err,
            StockError::Precondition(PreconditionError::DuplicateReservation { order_id: order })
        );
    }

    #[test]
    fn release_returns_units() {
        let mut stock = item(5);
        let order = AggregateId::new();
        stock.reserve(order, 5).unwrap();

        stock.release(order).unwrap();

        assert_eq!(stock.available(), 5);
        assert!(matches!(
            stock.release(order),
            Err(StockError::Precondition(
                PreconditionError::UnknownReservation { .. }
            ))
        ));
    }

    #[test]
    fn receive_adds_units() {
        let mut stock = item(1);
        stock.receive(qty(9)).unwrap();
        assert_eq!(stock.on_hand(), 10);
    }

    #[test]
    fn receive_overflow_is_out_of_range() {
        let mut stock = item(u32::MAX);
        let err = stock.receive(qty(1)).unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
        assert_eq!(stock.on_hand(), u32::MAX);
    }

    #[test]
    fn discontinue_requires_no_reservations_and_is_terminal() {
        let mut stock = item(5);
        let order = AggregateId::new();
        stock.reserve(order, 1).unwrap();

        assert!(matches!(
            stock.discontinue(),
            Err(StockError::Precondition(
                PreconditionError::OutstandingReservations { count: 1 }
            ))
        ));

        stock.release(order).unwrap();
        stock.discontinue().unwrap();

        assert_eq!(stock.status(), StockStatus::Discontinued);
        assert!(matches!(
            stock.receive(qty(1)),
            Err(StockError::InvalidTransition(_))
        ));
        assert!(matches!(
            stock.reserve(AggregateId::new(), 1),
            Err(StockError::InvalidTransition(_))
        ));
    }

    #[test]
    fn reconstitute_keeps_reservations() {
        let mut stock = item(8);
        let order = AggregateId::new();
        stock.reserve(order, 3).unwrap();

        let restored = StockItem::reconstitute(stock.snapshot(), Version::first());

        assert_eq!(restored.snapshot(), stock.snapshot());
        assert_eq!(restored.available(), 5);
        assert!(restored.pending_events().is_empty());
    }
}
