//! Order line entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{Entity, identity_equality};
use crate::error::StateConflictError;
use crate::value_objects::{Money, Quantity, Sku};

use super::OrderError;

/// Identity of a line within its order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderLineId(Uuid);

impl OrderLineId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for OrderLineId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderLineId> for Uuid {
    fn from(id: OrderLineId) -> Self {
        id.0
    }
}

impl std::fmt::Display for OrderLineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a line. Voided lines stay in the order as history and no
/// longer count towards its total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineStatus {
    Open,
    Voided,
}

impl std::fmt::Display for LineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineStatus::Open => f.write_str("Open"),
            LineStatus::Voided => f.write_str("Voided"),
        }
    }
}

/// One product line of an order.
///
/// Lines are internal to the order aggregate: only the order creates or
/// mutates them. Outside code gets read access through the order.
#[derive(Debug, Clone)]
pub struct OrderLine {
    id: OrderLineId,
    sku: Sku,
    quantity: Quantity,
    unit_price: Money,
    status: LineStatus,
}

identity_equality!(OrderLine);

impl Entity for OrderLine {
    type Id = OrderLineId;

    fn id(&self) -> &OrderLineId {
        &self.id
    }
}

/// Persisted form of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLineRecord {
    pub line_id: OrderLineId,
    pub sku: Sku,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub status: LineStatus,
}

impl OrderLine {
    pub(crate) fn open(sku: Sku, quantity: Quantity, unit_price: Money) -> Self {
        Self {
            id: OrderLineId::new(),
            sku,
            quantity,
            unit_price,
            status: LineStatus::Open,
        }
    }

    pub(crate) fn restore(record: OrderLineRecord) -> Self {
        Self {
            id: record.line_id,
            sku: record.sku,
            quantity: record.quantity,
            unit_price: record.unit_price,
            status: record.status,
        }
    }

    pub(crate) fn to_record(&self) -> OrderLineRecord {
        OrderLineRecord {
            line_id: self.id,
            sku: self.sku.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
            status: self.status,
        }
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn status(&self) -> LineStatus {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status == LineStatus::Open
    }

    /// Returns unit price times quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    /// Adds to the ordered quantity.
    pub(crate) fn increase(&mut self, by: Quantity) -> Result<(), OrderError> {
        self.ensure_open("increase")?;
        self.quantity = self.quantity.add(by)?;
        Ok(())
    }

    /// Replaces the ordered quantity.
    pub(crate) fn change_quantity(&mut self, quantity: Quantity) -> Result<(), StateConflictError> {
        self.ensure_open("change quantity of")?;
        self.quantity = quantity;
        Ok(())
    }

    /// Archives the line.
    pub(crate) fn void(&mut self) -> Result<(), StateConflictError> {
        self.ensure_open("void")?;
        self.status = LineStatus::Voided;
        Ok(())
    }

    fn ensure_open(&self, operation: &'static str) -> Result<(), StateConflictError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StateConflictError {
                entity: "order line",
                operation,
                current: self.status.to_string(),
                required: LineStatus::Open.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Currency;

    fn line(qty: u32) -> OrderLine {
        OrderLine::open(
            Sku::new("SKU-1").unwrap(),
            Quantity::new(qty).unwrap(),
            Money::new(1000, Currency::USD).unwrap(),
        )
    }

    #[test]
    fn equality_is_identity_only() {
        let a = line(1);
        let mut same = a.clone();
        same.change_quantity(Quantity::new(7).unwrap()).unwrap();
        assert_eq!(a, same);
        assert!(a.same_identity_as(&same));

        let other = line(1);
        assert_eq!(a.to_record().sku, other.to_record().sku);
        assert_ne!(a, other);
    }

    #[test]
    fn line_total_multiplies_price() {
        assert_eq!(
            line(3).line_total(),
            Money::new(3000, Currency::USD).unwrap()
        );
    }

    #[test]
    fn increase_combines_quantities() {
        let mut l = line(2);
        l.increase(Quantity::new(3).unwrap()).unwrap();
        assert_eq!(l.quantity().get(), 5);
    }

    #[test]
    fn increase_past_maximum_leaves_line_unchanged() {
        let mut l = line(Quantity::MAX);
        let err = l.increase(Quantity::new(1).unwrap()).unwrap_err();
        assert!(matches!(err, OrderError::Validation(_)));
        assert_eq!(l.quantity().get(), Quantity::MAX);
    }

    #[test]
    fn voided_line_rejects_mutation() {
        let mut l = line(2);
        l.void().unwrap();

        let err = l.change_quantity(Quantity::new(4).unwrap()).unwrap_err();
        assert_eq!(err.current, "Voided");
        assert_eq!(err.required, "Open");
        assert_eq!(l.quantity().get(), 2);

        assert!(l.void().is_err());
        assert!(matches!(
            l.increase(Quantity::new(1).unwrap()),
            Err(OrderError::StateConflict(_))
        ));
    }

    #[test]
    fn record_roundtrip_preserves_attributes() {
        let mut l = line(2);
        l.void().unwrap();
        let restored = OrderLine::restore(l.to_record());
        assert_eq!(restored.to_record(), l.to_record());
    }
}
