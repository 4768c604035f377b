//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};
use store::Version;

use crate::aggregate::{
    AggregateRoot, EventBuffer, EventMetadata, LifecycleState, ensure_transition,
};
use crate::entity::{Entity, identity_equality};
use crate::error::{DimensionMismatchError, PreconditionError, ValidationError};
use crate::value_objects::{Currency, CustomerId, EmailAddress, Money, Quantity, Sku};

use super::{
    LineSnapshot, OrderError, OrderEvent, OrderLine, OrderLineId, OrderLineRecord, OrderStatus,
    events::{OrderCancelledData, OrderCompletedData, OrderConfirmedData, OrderPlacedData},
};

/// Maximum number of open lines a single order may hold.
pub const MAX_OPEN_LINES: usize = 100;

// An order total at the largest price, quantity and line count still fits in
// an i64, so line and order totals never saturate.
const _: () = assert!(
    Money::MAX_AMOUNT_MINOR as i128 * Quantity::MAX as i128 * MAX_OPEN_LINES as i128
        <= i64::MAX as i128
);

/// Order aggregate root.
///
/// Owns its lines: they are created, changed and voided only through the
/// operations below, and the total is always recomputed from the open lines.
/// Every operation validates first and works on a candidate copy of the
/// lines, so a failed call leaves the order untouched.
#[derive(Debug, Clone)]
pub struct Order {
    id: AggregateId,
    version: Version,
    customer_id: CustomerId,
    currency: Currency,
    contact_email: Option<EmailAddress>,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    total: Money,
    cancellation_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: EventBuffer<OrderEvent>,
}

identity_equality!(Order);

impl Entity for Order {
    type Id = AggregateId;

    fn id(&self) -> &AggregateId {
        &self.id
    }
}

/// Flat persisted form of an order and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: AggregateId,
    pub customer_id: CustomerId,
    pub currency: Currency,
    pub contact_email: Option<EmailAddress>,
    pub status: OrderStatus,
    pub lines: Vec<OrderLineRecord>,
    pub total: Money,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AggregateRoot for Order {
    type Id = AggregateId;
    type Event = OrderEvent;
    type Snapshot = OrderSnapshot;

    fn aggregate_type() -> &'static str {
        "Order"
    }

    fn aggregate_id(&self) -> &AggregateId {
        &self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn pending_events(&self) -> &[OrderEvent] {
        self.events.pending()
    }

    fn take_pending_events(&mut self) -> Vec<OrderEvent> {
        self.events.drain()
    }

    fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.id,
            customer_id: self.customer_id.clone(),
            currency: self.currency,
            contact_email: self.contact_email.clone(),
            status: self.status,
            lines: self.lines.iter().map(OrderLine::to_record).collect(),
            total: self.total,
            cancellation_reason: self.cancellation_reason.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn reconstitute(snapshot: OrderSnapshot, version: Version) -> Self {
        Self {
            id: snapshot.order_id,
            version,
            customer_id: snapshot.customer_id,
            currency: snapshot.currency,
            contact_email: snapshot.contact_email,
            status: snapshot.status,
            lines: snapshot.lines.into_iter().map(OrderLine::restore).collect(),
            total: snapshot.total,
            cancellation_reason: snapshot.cancellation_reason,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: EventBuffer::new(),
        }
    }
}

// Query methods
impl Order {
    /// Returns the customer who owns the order.
    pub fn customer_id(&self) -> &CustomerId {
        &self.customer_id
    }

    /// Returns the currency all prices on this order are in.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn contact_email(&self) -> Option<&EmailAddress> {
        self.contact_email.as_ref()
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns every line, voided ones included, in insertion order.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the lines that count towards the total.
    pub fn open_lines(&self) -> impl Iterator<Item = &OrderLine> {
        self.lines.iter().filter(|line| line.is_open())
    }

    /// Returns a line by id.
    pub fn line(&self, line_id: OrderLineId) -> Option<&OrderLine> {
        self.lines.iter().find(|line| *line.id() == line_id)
    }

    /// Returns the sum of all open line totals.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if the order is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Construction
impl Order {
    /// Starts a new draft order.
    ///
    /// All inputs are already validated value types, so construction cannot
    /// fail. No event is raised: the order becomes a business fact when it is
    /// placed.
    pub fn create(
        id: AggregateId,
        customer_id: CustomerId,
        currency: Currency,
        contact_email: Option<EmailAddress>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            version: Version::initial(),
            customer_id,
            currency,
            contact_email,
            status: OrderStatus::Draft,
            lines: Vec::new(),
            total: Money::zero(currency),
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            events: EventBuffer::new(),
        }
    }
}

// Draft editing. These shape an order that has not been placed yet and raise
// no events.
impl Order {
    /// Adds a line, merging into an open line with the same SKU and unit
    /// price. Returns the id of the line that now holds the quantity.
    pub fn add_line(
        &mut self,
        sku: Sku,
        quantity: Quantity,
        unit_price: Money,
    ) -> Result<OrderLineId, OrderError> {
        ensure_transition(self.status, OrderStatus::EDITABLE, "add line")?;
        if unit_price.currency() != self.currency {
            return Err(DimensionMismatchError {
                operation: "combine",
                left: self.currency,
                right: unit_price.currency(),
            }
            .into());
        }

        let mut lines = self.lines.clone();
        let existing = lines.iter().position(|line| {
            line.is_open() && *line.sku() == sku && line.unit_price() == unit_price
        });

        let line_id = match existing {
            Some(index) => {
                lines[index].increase(quantity)?;
                *lines[index].id()
            }
            None => {
                let open = lines.iter().filter(|line| line.is_open()).count();
                if open >= MAX_OPEN_LINES {
                    return Err(PreconditionError::TooManyLines {
                        max: MAX_OPEN_LINES,
                    }
                    .into());
                }
                let line = OrderLine::open(sku, quantity, unit_price);
                let line_id = *line.id();
                lines.push(line);
                line_id
            }
        };

        self.commit_lines(lines)?;
        Ok(line_id)
    }

    /// Replaces the quantity of an open line.
    pub fn change_line_quantity(
        &mut self,
        line_id: OrderLineId,
        quantity: Quantity,
    ) -> Result<(), OrderError> {
        ensure_transition(self.status, OrderStatus::EDITABLE, "change line quantity")?;
        let mut lines = self.lines.clone();
        let index = self.line_index(line_id)?;
        lines[index].change_quantity(quantity)?;
        self.commit_lines(lines)
    }

    /// Voids an open line. The line stays on the order as history.
    pub fn remove_line(&mut self, line_id: OrderLineId) -> Result<(), OrderError> {
        ensure_transition(self.status, OrderStatus::EDITABLE, "remove line")?;
        let mut lines = self.lines.clone();
        let index = self.line_index(line_id)?;
        lines[index].void()?;
        self.commit_lines(lines)
    }

    fn line_index(&self, line_id: OrderLineId) -> Result<usize, PreconditionError> {
        self.lines
            .iter()
            .position(|line| *line.id() == line_id)
            .ok_or_else(|| PreconditionError::LineNotFound {
                line_id: line_id.to_string(),
            })
    }

    /// Recomputes the total from the candidate lines and, only if that
    /// succeeds, installs both.
    fn commit_lines(&mut self, lines: Vec<OrderLine>) -> Result<(), OrderError> {
        let total = Self::total_of(self.currency, &lines)?;
        self.lines = lines;
        self.total = total;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn total_of(currency: Currency, lines: &[OrderLine]) -> Result<Money, DimensionMismatchError> {
        let line_totals: Vec<Money> = lines
            .iter()
            .filter(|line| line.is_open())
            .map(OrderLine::line_total)
            .collect();
        Money::sum(currency, &line_totals)
    }
}

// Lifecycle transitions. Each appends exactly one event.
impl Order {
    /// Commits the customer to the order.
    pub fn place(&mut self) -> Result<(), OrderError> {
        ensure_transition(self.status, &[OrderStatus::Draft], "place")?;
        if self.open_lines().next().is_none() {
            return Err(PreconditionError::NoLines.into());
        }

        let total = Self::total_of(self.currency, &self.lines)?;
        let now = Utc::now();
        let event = OrderEvent::OrderPlaced(OrderPlacedData {
            metadata: self.event_metadata(),
            order_id: self.id,
            customer_id: self.customer_id.clone(),
            contact_email: self.contact_email.clone(),
            lines: self.line_snapshots(),
            total,
            placed_at: now,
        });

        self.status = OrderStatus::Placed;
        self.total = total;
        self.updated_at = now;
        self.events.record(event);
        Ok(())
    }

    /// Accepts a placed order for fulfilment.
    pub fn confirm(&mut self) -> Result<(), OrderError> {
        ensure_transition(self.status, &[OrderStatus::Placed], "confirm")?;

        let now = Utc::now();
        let event = OrderEvent::OrderConfirmed(OrderConfirmedData {
            metadata: self.event_metadata(),
            order_id: self.id,
            customer_id: self.customer_id.clone(),
            total: self.total,
            confirmed_at: now,
        });

        self.status = OrderStatus::Confirmed;
        self.updated_at = now;
        self.events.record(event);
        Ok(())
    }

    /// Marks a confirmed order as fulfilled.
    pub fn complete(&mut self) -> Result<(), OrderError> {
        ensure_transition(self.status, &[OrderStatus::Confirmed], "complete")?;

        let now = Utc::now();
        let event = OrderEvent::OrderCompleted(OrderCompletedData {
            metadata: self.event_metadata(),
            order_id: self.id,
            customer_id: self.customer_id.clone(),
            total: self.total,
            completed_at: now,
        });

        self.status = OrderStatus::Completed;
        self.updated_at = now;
        self.events.record(event);
        Ok(())
    }

    /// Cancels the order. Allowed until the order is completed.
    pub fn cancel(&mut self, reason: &str) -> Result<(), OrderError> {
        ensure_transition(self.status, OrderStatus::CANCELLABLE, "cancel")?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::Required {
                field: "cancellation_reason",
            }
            .into());
        }

        let now = Utc::now();
        let event = OrderEvent::OrderCancelled(OrderCancelledData {
            metadata: self.event_metadata(),
            order_id: self.id,
            customer_id: self.customer_id.clone(),
            reason: reason.to_string(),
            previous_status: self.status,
            lines: self.line_snapshots(),
            total: self.total,
            cancelled_at: now,
        });

        self.status = OrderStatus::Cancelled;
        self.cancellation_reason = Some(reason.to_string());
        self.updated_at = now;
        self.events.record(event);
        Ok(())
    }

    fn event_metadata(&self) -> EventMetadata {
        EventMetadata::new(Self::aggregate_type(), self.id)
    }

    fn line_snapshots(&self) -> Vec<LineSnapshot> {
        self.open_lines()
            .map(|line| LineSnapshot {
                line_id: *line.id(),
                sku: line.sku().clone(),
                quantity: line.quantity(),
                unit_price: line.unit_price(),
                line_total: line.line_total(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DomainEvent;
    use crate::error::InvalidTransitionError;

    fn usd(minor: i64) -> Money {
        Money::new(minor, Currency::USD).unwrap()
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn sku(code: &str) -> Sku {
        Sku::new(code).unwrap()
    }

    fn draft() -> Order {
        Order::create(
            AggregateId::new(),
            CustomerId::new("C1").unwrap(),
            Currency::USD,
            None,
        )
    }

    #[test]
    fn create_starts_empty_draft_without_events() {
        let order = draft();
        assert_eq!(order.status(), OrderStatus::Draft);
        assert!(order.total().is_zero());
        assert!(order.lines().is_empty());
        assert!(order.pending_events().is_empty());
        assert!(order.version().is_initial());
    }

    #[test]
    fn add_line_recomputes_total_and_raises_nothing() {
        let mut order = draft();
        order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();
        order.add_line(sku("SKU-2"), qty(1), usd(550)).unwrap();

        assert_eq!(order.total(), usd(2550));
        assert_eq!(order.lines().len(), 2);
        assert!(order.pending_events().is_empty());
    }

    #[test]
    fn add_line_merges_same_sku_and_price() {
        let mut order = draft();
        let first = order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();
        let second = order.add_line(sku("sku-1"), qty(3), usd(1000)).unwrap();

        assert_eq!(first, second);
        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.line(first).unwrap().quantity().get(), 5);
        assert_eq!(order.total(), usd(5000));
    }

    #[test]
    fn add_line_keeps_separate_lines_for_different_prices() {
        let mut order = draft();
        let first = order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        let second = order.add_line(sku("SKU-1"), qty(1), usd(900)).unwrap();

        assert_ne!(first, second);
        assert_eq!(order.total(), usd(1900));
    }

    #[test]
    fn add_line_in_other_currency_is_rejected() {
        let mut order = draft();
        let before = order.snapshot();

        let err = order
            .add_line(sku("SKU-1"), qty(1), Money::new(500, Currency::EUR).unwrap())
            .unwrap_err();

        assert!(matches!(err, OrderError::DimensionMismatch(_)));
        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn merge_past_maximum_quantity_leaves_order_unchanged() {
        let mut order = draft();
        order
            .add_line(sku("SKU-1"), qty(Quantity::MAX), usd(100))
            .unwrap();
        let before = order.snapshot();

        let err = order.add_line(sku("SKU-1"), qty(1), usd(100)).unwrap_err();

        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn too_many_open_lines_is_a_precondition_failure() {
        let mut order = draft();
        for i in 0..MAX_OPEN_LINES {
            order
                .add_line(sku(&format!("SKU-{i}")), qty(1), usd(100))
                .unwrap();
        }
        let before = order.snapshot();

        let err = order.add_line(sku("ONE-MORE"), qty(1), usd(100)).unwrap_err();

        assert_eq!(
            err,
            OrderError::Precondition(PreconditionError::TooManyLines {
                max: MAX_OPEN_LINES
            })
        );
        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn change_quantity_updates_total() {
        let mut order = draft();
        let line = order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();

        order.change_line_quantity(line, qty(4)).unwrap();

        assert_eq!(order.total(), usd(4000));
    }

    #[test]
    fn remove_line_voids_and_excludes_from_total() {
        let mut order = draft();
        let kept = order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        let removed = order.add_line(sku("SKU-2"), qty(1), usd(500)).unwrap();

        order.remove_line(removed).unwrap();

        assert_eq!(order.total(), usd(1000));
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.open_lines().count(), 1);
        assert!(order.line(kept).unwrap().is_open());
        assert!(!order.line(removed).unwrap().is_open());
    }

    #[test]
    fn editing_voided_line_is_a_state_conflict() {
        let mut order = draft();
        order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        let line = order.add_line(sku("SKU-2"), qty(1), usd(500)).unwrap();
        order.remove_line(line).unwrap();
        let before = order.snapshot();

        let err = order.change_line_quantity(line, qty(3)).unwrap_err();
        assert!(matches!(err, OrderError::StateConflict(_)));

        let err = order.remove_line(line).unwrap_err();
        assert!(matches!(err, OrderError::StateConflict(_)));

        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn unknown_line_is_not_found() {
        let mut order = draft();
        let foreign = OrderLineId::new();

        let err = order.remove_line(foreign).unwrap_err();

        assert_eq!(
            err,
            OrderError::Precondition(PreconditionError::LineNotFound {
                line_id: foreign.to_string()
            })
        );
    }

    #[test]
    fn place_raises_one_event_with_snapshot() {
        let mut order = draft();
        let line = order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();

        order.place().unwrap();

        assert_eq!(order.status(), OrderStatus::Placed);
        let events = order.pending_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), OrderEvent::PLACED);
        match &events[0] {
            OrderEvent::OrderPlaced(data) => {
                assert_eq!(data.order_id, *order.aggregate_id());
                assert_eq!(data.customer_id.as_str(), "C1");
                assert_eq!(data.lines.len(), 1);
                assert_eq!(data.lines[0].line_id, line);
                assert_eq!(data.lines[0].line_total, usd(2000));
                assert_eq!(data.total, usd(2000));
                assert_eq!(data.metadata.aggregate_type, "Order");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn place_ignores_voided_lines() {
        let mut order = draft();
        let line = order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();
        order.remove_line(line).unwrap();
        let before = order.snapshot();

        let err = order.place().unwrap_err();

        assert_eq!(err, OrderError::Precondition(PreconditionError::NoLines));
        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn lines_are_frozen_after_place() {
        let mut order = draft();
        let line = order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();
        order.place().unwrap();

        let err = order.change_line_quantity(line, qty(5)).unwrap_err();

        assert_eq!(
            err,
            OrderError::InvalidTransition(InvalidTransitionError {
                current: OrderStatus::Placed,
                attempted: "change line quantity",
            })
        );
        assert_eq!(order.total(), usd(2000));
    }

    #[test]
    fn full_lifecycle_raises_one_event_per_transition() {
        let mut order = draft();
        order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        order.place().unwrap();
        order.confirm().unwrap();
        order.complete().unwrap();

        let types: Vec<_> = order
            .take_pending_events()
            .iter()
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            types,
            vec![OrderEvent::PLACED, OrderEvent::CONFIRMED, OrderEvent::COMPLETED]
        );
        assert!(order.is_terminal());
    }

    #[test]
    fn confirm_requires_placed() {
        let mut order = draft();
        let err = order.confirm().unwrap_err();
        assert_eq!(
            err,
            OrderError::InvalidTransition(InvalidTransitionError {
                current: OrderStatus::Draft,
                attempted: "confirm",
            })
        );
    }

    #[test]
    fn cancel_records_reason_and_previous_status() {
        let mut order = draft();
        order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        order.place().unwrap();
        order.take_pending_events();

        order.cancel("  customer request ").unwrap();

        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(order.cancellation_reason(), Some("customer request"));
        match order.pending_events() {
            [OrderEvent::OrderCancelled(data)] => {
                assert_eq!(data.previous_status, OrderStatus::Placed);
                assert_eq!(data.reason, "customer request");
                assert_eq!(data.lines.len(), 1);
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn cancel_requires_reason() {
        let mut order = draft();
        let before = order.snapshot();

        let err = order.cancel("   ").unwrap_err();

        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(order.snapshot(), before);
    }

    #[test]
    fn terminal_order_rejects_everything() {
        let mut order = draft();
        let line = order.add_line(sku("SKU-1"), qty(1), usd(1000)).unwrap();
        order.cancel("changed mind").unwrap();
        order.take_pending_events();
        let before = order.snapshot();

        assert!(matches!(
            order.add_line(sku("SKU-2"), qty(1), usd(100)),
            Err(OrderError::InvalidTransition(_))
        ));
        assert!(matches!(
            order.change_line_quantity(line, qty(2)),
            Err(OrderError::InvalidTransition(_))
        ));
        assert!(matches!(
            order.remove_line(line),
            Err(OrderError::InvalidTransition(_))
        ));
        assert!(matches!(order.place(), Err(OrderError::InvalidTransition(_))));
        assert!(matches!(order.confirm(), Err(OrderError::InvalidTransition(_))));
        assert!(matches!(order.complete(), Err(OrderError::InvalidTransition(_))));
        assert!(matches!(
            order.cancel("again"),
            Err(OrderError::InvalidTransition(_))
        ));

        assert_eq!(order.snapshot(), before);
        assert!(order.pending_events().is_empty());
    }

    #[test]
    fn reconstitute_restores_state_without_events() {
        let mut order = draft();
        order.add_line(sku("SKU-1"), qty(2), usd(1000)).unwrap();
        let voided = order.add_line(sku("SKU-2"), qty(1), usd(300)).unwrap();
        order.remove_line(voided).unwrap();
        order.place().unwrap();

        let restored = Order::reconstitute(order.snapshot(), Version::new(3));

        assert_eq!(restored, order);
        assert_eq!(restored.snapshot(), order.snapshot());
        assert_eq!(restored.version(), Version::new(3));
        assert!(restored.pending_events().is_empty());
    }

    #[test]
    fn orders_compare_by_identity() {
        let a = draft();
        let mut b = a.clone();
        b.add_line(sku("SKU-1"), qty(1), usd(100)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, draft());
    }
}
