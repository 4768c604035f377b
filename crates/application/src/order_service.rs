//! Order service providing the command API for orders.

use std::sync::Arc;

use common::AggregateId;
use dispatch::EventDispatcher;
use domain::{Order, OrderEvent, OrderLineId};
use store::RecordStore;

use crate::command::{CommandHandler, CommandResult};
use crate::commands::{
    AddOrderLine, CancelOrder, ChangeLineQuantity, CompleteOrder, ConfirmOrder, CreateOrder,
    OrderCommand, PlaceOrder, RemoveOrderLine,
};
use crate::config::ServiceConfig;
use crate::error::Result;

/// Summary of an executed order command.
#[derive(Debug)]
pub struct CommandOutcome {
    pub order_id: AggregateId,

    /// The line created or changed, for line commands.
    pub line_id: Option<OrderLineId>,

    pub result: CommandResult<Order>,
}

/// Service for managing orders.
///
/// Each method converts one intent to value types, then runs exactly one
/// order operation as its own transaction.
pub struct OrderCommandService<S: RecordStore> {
    handler: CommandHandler<S, Order>,
}

impl<S: RecordStore> OrderCommandService<S> {
    /// Creates a new order service.
    pub fn new(
        store: S,
        dispatcher: Arc<EventDispatcher<OrderEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            handler: CommandHandler::new(store, dispatcher, config),
        }
    }

    /// Returns a reference to the underlying command handler.
    pub fn handler(&self) -> &CommandHandler<S, Order> {
        &self.handler
    }

    /// Loads an order by ID.
    pub async fn get_order(&self, order_id: AggregateId) -> Result<Option<Order>> {
        self.handler.load(&order_id).await
    }

    /// Routes any order command to its method.
    pub async fn execute(&self, command: OrderCommand) -> Result<CommandOutcome> {
        match command {
            OrderCommand::Create(cmd) => self.create_order(cmd).await,
            OrderCommand::AddLine(cmd) => self.add_line(cmd).await,
            OrderCommand::ChangeLineQuantity(cmd) => self.change_line_quantity(cmd).await,
            OrderCommand::RemoveLine(cmd) => self.remove_line(cmd).await,
            OrderCommand::Place(cmd) => self.place_order(cmd).await,
            OrderCommand::Confirm(cmd) => self.confirm_order(cmd).await,
            OrderCommand::Complete(cmd) => self.complete_order(cmd).await,
            OrderCommand::Cancel(cmd) => self.cancel_order(cmd).await,
        }
    }

    /// Starts a new draft order.
    #[tracing::instrument(skip(self))]
    pub async fn create_order(&self, cmd: CreateOrder) -> Result<CommandOutcome> {
        let (customer_id, currency, contact_email) = cmd.parse()?;
        let order = Order::create(cmd.order_id, customer_id, currency, contact_email);

        let result = self.handler.create("create_order", order).await?;
        Ok(outcome(cmd.order_id, None, result))
    }

    /// Adds a line to a draft order.
    #[tracing::instrument(skip(self))]
    pub async fn add_line(&self, cmd: AddOrderLine) -> Result<CommandOutcome> {
        let (sku, quantity, unit_price) = cmd.parse()?;

        let result = self
            .handler
            .execute("add_order_line", &cmd.order_id, |order| {
                order.add_line(sku.clone(), quantity, unit_price)
            })
            .await?;
        let line_id = result.output;
        Ok(outcome(cmd.order_id, Some(line_id), unit_result(result)))
    }

    /// Changes the quantity of a line on a draft order.
    #[tracing::instrument(skip(self))]
    pub async fn change_line_quantity(&self, cmd: ChangeLineQuantity) -> Result<CommandOutcome> {
        let (line_id, quantity) = cmd.parse()?;

        let result = self
            .handler
            .execute("change_line_quantity", &cmd.order_id, |order| {
                order.change_line_quantity(line_id, quantity)
            })
            .await?;
        Ok(outcome(cmd.order_id, Some(line_id), result))
    }

    /// Removes a line from a draft order.
    #[tracing::instrument(skip(self))]
    pub async fn remove_line(&self, cmd: RemoveOrderLine) -> Result<CommandOutcome> {
        let line_id = OrderLineId::from(cmd.line_id);

        let result = self
            .handler
            .execute("remove_order_line", &cmd.order_id, |order| {
                order.remove_line(line_id)
            })
            .await?;
        Ok(outcome(cmd.order_id, Some(line_id), result))
    }

    /// Places an order.
    #[tracing::instrument(skip(self))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<CommandOutcome> {
        let result = self
            .handler
            .execute("place_order", &cmd.order_id, Order::place)
            .await?;
        Ok(outcome(cmd.order_id, None, result))
    }

    /// Confirms a placed order.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_order(&self, cmd: ConfirmOrder) -> Result<CommandOutcome> {
        let result = self
            .handler
            .execute("confirm_order", &cmd.order_id, Order::confirm)
            .await?;
        Ok(outcome(cmd.order_id, None, result))
    }

    /// Completes a confirmed order.
    #[tracing::instrument(skip(self))]
    pub async fn complete_order(&self, cmd: CompleteOrder) -> Result<CommandOutcome> {
        let result = self
            .handler
            .execute("complete_order", &cmd.order_id, Order::complete)
            .await?;
        Ok(outcome(cmd.order_id, None, result))
    }

    /// Cancels an order.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_order(&self, cmd: CancelOrder) -> Result<CommandOutcome> {
        let result = self
            .handler
            .execute("cancel_order", &cmd.order_id, |order| {
                order.cancel(&cmd.reason)
            })
            .await?;
        Ok(outcome(cmd.order_id, None, result))
    }
}

fn outcome(
    order_id: AggregateId,
    line_id: Option<OrderLineId>,
    result: CommandResult<Order>,
) -> CommandOutcome {
    CommandOutcome {
        order_id,
        line_id,
        result,
    }
}

/// Drops the operation output once it has been read.
fn unit_result<T>(result: CommandResult<Order, T>) -> CommandResult<Order> {
    CommandResult {
        aggregate: result.aggregate,
        output: (),
        events: result.events,
        new_version: result.new_version,
        dispatch: result.dispatch,
    }
}
