//! Stock service providing the command API for stock items.

use std::sync::Arc;

use common::AggregateId;
use dispatch::EventDispatcher;
use domain::{Quantity, Sku, StockEvent, StockItem};
use store::RecordStore;

use crate::command::{CommandHandler, CommandResult};
use crate::commands::{DiscontinueStock, ReceiveStock, RegisterStock};
use crate::config::ServiceConfig;
use crate::error::Result;

/// Service for managing stock items.
pub struct StockService<S: RecordStore> {
    handler: CommandHandler<S, StockItem>,
}

impl<S: RecordStore> StockService<S> {
    /// Creates a new stock service.
    pub fn new(
        store: S,
        dispatcher: Arc<EventDispatcher<StockEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            handler: CommandHandler::new(store, dispatcher, config),
        }
    }

    /// Loads a stock item by SKU.
    pub async fn get_item(&self, sku: &Sku) -> Result<Option<StockItem>> {
        self.handler.load(sku).await
    }

    /// Registers a SKU with an opening balance.
    #[tracing::instrument(skip(self))]
    pub async fn register(&self, cmd: RegisterStock) -> Result<CommandResult<StockItem>> {
        let sku = Sku::new(&cmd.sku)?;
        self.handler
            .create("register_stock", StockItem::register(sku, cmd.on_hand))
            .await
    }

    /// Books delivered units.
    #[tracing::instrument(skip(self))]
    pub async fn receive(&self, cmd: ReceiveStock) -> Result<CommandResult<StockItem>> {
        let sku = Sku::new(&cmd.sku)?;
        let quantity = Quantity::new(cmd.quantity)?;
        self.handler
            .execute("receive_stock", &sku, |item| item.receive(quantity))
            .await
    }

    /// Retires a SKU.
    #[tracing::instrument(skip(self))]
    pub async fn discontinue(&self, cmd: DiscontinueStock) -> Result<CommandResult<StockItem>> {
        let sku = Sku::new(&cmd.sku)?;
        self.handler
            .execute("discontinue_stock", &sku, StockItem::discontinue)
            .await
    }

    /// Holds units of one SKU for an order.
    pub async fn reserve(
        &self,
        sku: &Sku,
        order_id: AggregateId,
        units: u32,
    ) -> Result<CommandResult<StockItem>> {
        self.handler
            .execute("reserve_stock", sku, |item| item.reserve(order_id, units))
            .await
    }

    /// Returns the units of one SKU held for an order.
    pub async fn release(
        &self,
        sku: &Sku,
        order_id: AggregateId,
    ) -> Result<CommandResult<StockItem>> {
        self.handler
            .execute("release_stock", sku, |item| item.release(order_id))
            .await
    }
}
