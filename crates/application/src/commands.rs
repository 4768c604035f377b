//! Command intents.
//!
//! Intents carry raw, externally supplied values. They are turned into value
//! types here, at the input boundary, so malformed input fails with a
//! `ValidationError` before any aggregate is loaded.

use common::AggregateId;
use domain::{
    Currency, CustomerId, EmailAddress, Money, OrderLineId, Quantity, Sku, ValidationError,
};
use uuid::Uuid;

/// Command to start a new draft order.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    /// The order ID to create.
    pub order_id: AggregateId,

    /// The customer placing the order.
    pub customer_id: String,

    /// ISO currency code every line must be priced in.
    pub currency: String,

    /// Where to send notifications, if anywhere.
    pub contact_email: Option<String>,
}

impl CreateOrder {
    /// Creates a new CreateOrder command.
    pub fn new(
        order_id: AggregateId,
        customer_id: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            customer_id: customer_id.into(),
            currency: currency.into(),
            contact_email: None,
        }
    }

    /// Creates a new CreateOrder command with a generated order ID.
    pub fn for_customer(customer_id: impl Into<String>, currency: impl Into<String>) -> Self {
        Self::new(AggregateId::new(), customer_id, currency)
    }

    /// Sets the contact email.
    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    pub(crate) fn parse(
        &self,
    ) -> Result<(CustomerId, Currency, Option<EmailAddress>), ValidationError> {
        let customer_id = CustomerId::new(&self.customer_id)?;
        let currency = Currency::new(&self.currency)?;
        let contact_email = self
            .contact_email
            .as_deref()
            .map(EmailAddress::new)
            .transpose()?;
        Ok((customer_id, currency, contact_email))
    }
}

/// Command to add a product line to a draft order.
#[derive(Debug, Clone)]
pub struct AddOrderLine {
    pub order_id: AggregateId,
    pub sku: String,
    pub quantity: u32,

    /// Unit price in minor currency units (cents).
    pub unit_price_minor: i64,
    pub currency: String,
}

impl AddOrderLine {
    /// Creates a new AddOrderLine command.
    pub fn new(
        order_id: AggregateId,
        sku: impl Into<String>,
        quantity: u32,
        unit_price_minor: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            sku: sku.into(),
            quantity,
            unit_price_minor,
            currency: currency.into(),
        }
    }

    pub(crate) fn parse(&self) -> Result<(Sku, Quantity, Money), ValidationError> {
        let sku = Sku::new(&self.sku)?;
        let quantity = Quantity::new(self.quantity)?;
        let unit_price = Money::new(self.unit_price_minor, Currency::new(&self.currency)?)?;
        Ok((sku, quantity, unit_price))
    }
}

/// Command to change the quantity of a line on a draft order.
#[derive(Debug, Clone)]
pub struct ChangeLineQuantity {
    pub order_id: AggregateId,
    pub line_id: Uuid,
    pub quantity: u32,
}

impl ChangeLineQuantity {
    pub fn new(order_id: AggregateId, line_id: impl Into<Uuid>, quantity: u32) -> Self {
        Self {
            order_id,
            line_id: line_id.into(),
            quantity,
        }
    }

    pub(crate) fn parse(&self) -> Result<(OrderLineId, Quantity), ValidationError> {
        Ok((OrderLineId::from(self.line_id), Quantity::new(self.quantity)?))
    }
}

/// Command to remove a line from a draft order.
#[derive(Debug, Clone)]
pub struct RemoveOrderLine {
    pub order_id: AggregateId,
    pub line_id: Uuid,
}

impl RemoveOrderLine {
    pub fn new(order_id: AggregateId, line_id: impl Into<Uuid>) -> Self {
        Self {
            order_id,
            line_id: line_id.into(),
        }
    }
}

/// Command to place an order.
#[derive(Debug, Clone, Copy)]
pub struct PlaceOrder {
    pub order_id: AggregateId,
}

impl PlaceOrder {
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

/// Command to confirm a placed order.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmOrder {
    pub order_id: AggregateId,
}

impl ConfirmOrder {
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

/// Command to complete a confirmed order.
#[derive(Debug, Clone, Copy)]
pub struct CompleteOrder {
    pub order_id: AggregateId,
}

impl CompleteOrder {
    pub fn new(order_id: AggregateId) -> Self {
        Self { order_id }
    }
}

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrder {
    pub order_id: AggregateId,
    pub reason: String,
}

impl CancelOrder {
    pub fn new(order_id: AggregateId, reason: impl Into<String>) -> Self {
        Self {
            order_id,
            reason: reason.into(),
        }
    }
}

/// Any order command, for callers that route intents generically.
#[derive(Debug, Clone)]
pub enum OrderCommand {
    Create(CreateOrder),
    AddLine(AddOrderLine),
    ChangeLineQuantity(ChangeLineQuantity),
    RemoveLine(RemoveOrderLine),
    Place(PlaceOrder),
    Confirm(ConfirmOrder),
    Complete(CompleteOrder),
    Cancel(CancelOrder),
}

impl OrderCommand {
    /// Returns the order the command targets.
    pub fn order_id(&self) -> AggregateId {
        match self {
            OrderCommand::Create(cmd) => cmd.order_id,
            OrderCommand::AddLine(cmd) => cmd.order_id,
            OrderCommand::ChangeLineQuantity(cmd) => cmd.order_id,
            OrderCommand::RemoveLine(cmd) => cmd.order_id,
            OrderCommand::Place(cmd) => cmd.order_id,
            OrderCommand::Confirm(cmd) => cmd.order_id,
            OrderCommand::Complete(cmd) => cmd.order_id,
            OrderCommand::Cancel(cmd) => cmd.order_id,
        }
    }

    /// Returns the command name used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::Create(_) => "create_order",
            OrderCommand::AddLine(_) => "add_order_line",
            OrderCommand::ChangeLineQuantity(_) => "change_line_quantity",
            OrderCommand::RemoveLine(_) => "remove_order_line",
            OrderCommand::Place(_) => "place_order",
            OrderCommand::Confirm(_) => "confirm_order",
            OrderCommand::Complete(_) => "complete_order",
            OrderCommand::Cancel(_) => "cancel_order",
        }
    }
}

/// Command to register a SKU with an opening balance.
#[derive(Debug, Clone)]
pub struct RegisterStock {
    pub sku: String,
    pub on_hand: u32,
}

impl RegisterStock {
    pub fn new(sku: impl Into<String>, on_hand: u32) -> Self {
        Self {
            sku: sku.into(),
            on_hand,
        }
    }
}

/// Command to book delivered units.
#[derive(Debug, Clone)]
pub struct ReceiveStock {
    pub sku: String,
    pub quantity: u32,
}

impl ReceiveStock {
    pub fn new(sku: impl Into<String>, quantity: u32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// Command to retire a SKU.
#[derive(Debug, Clone)]
pub struct DiscontinueStock {
    pub sku: String,
}

impl DiscontinueStock {
    pub fn new(sku: impl Into<String>) -> Self {
        Self { sku: sku.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_parses_all_fields() {
        let cmd = CreateOrder::for_customer(" C1 ", "usd").with_contact_email("A@Example.COM");
        let (customer, currency, email) = cmd.parse().unwrap();

        assert_eq!(customer.as_str(), "C1");
        assert_eq!(currency, Currency::USD);
        assert_eq!(email.unwrap().as_str(), "A@example.com");
    }

    #[test]
    fn create_order_rejects_blank_customer() {
        let err = CreateOrder::for_customer("  ", "USD").parse().unwrap_err();
        assert_eq!(err.field(), "customer_id");
    }

    #[test]
    fn add_line_validates_each_primitive() {
        let order_id = AggregateId::new();

        assert_eq!(
            AddOrderLine::new(order_id, "", 1, 100, "USD")
                .parse()
                .unwrap_err()
                .field(),
            "sku"
        );
        assert_eq!(
            AddOrderLine::new(order_id, "SKU-1", 0, 100, "USD")
                .parse()
                .unwrap_err()
                .field(),
            "quantity"
        );
        assert_eq!(
            AddOrderLine::new(order_id, "SKU-1", 1, -5, "USD")
                .parse()
                .unwrap_err()
                .field(),
            "amount"
        );
        assert_eq!(
            AddOrderLine::new(order_id, "SKU-1", 1, 100, "DOLLARS")
                .parse()
                .unwrap_err()
                .field(),
            "currency"
        );
    }

    #[test]
    fn command_names_and_targets() {
        let order_id = AggregateId::new();
        let cmd = OrderCommand::Cancel(CancelOrder::new(order_id, "changed mind"));
        assert_eq!(cmd.order_id(), order_id);
        assert_eq!(cmd.name(), "cancel_order");
    }
}
