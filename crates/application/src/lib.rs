//! Command orchestration for the order domain.
//!
//! This crate turns externally supplied intents into single-aggregate
//! transactions. Every command follows the same cycle:
//! 1. Convert raw input to value types
//! 2. Load the aggregate (or construct it)
//! 3. Invoke exactly one aggregate operation
//! 4. Save with an optimistic version check
//! 5. Publish the raised events, only after the save succeeded
//!
//! Work that spans aggregates, such as reserving stock for a placed order,
//! runs in event handlers, each change in its own transaction.

pub mod command;
pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod order_service;
pub mod services;
pub mod stock_service;

pub use command::{CommandHandler, CommandResult};
pub use commands::{
    AddOrderLine, CancelOrder, ChangeLineQuantity, CompleteOrder, ConfirmOrder, CreateOrder,
    DiscontinueStock, OrderCommand, PlaceOrder, ReceiveStock, RegisterStock, RemoveOrderLine,
};
pub use config::ServiceConfig;
pub use error::{ApplicationError, Result};
pub use handlers::{CustomerNotificationHandler, StockReservationHandler};
pub use order_service::{CommandOutcome, OrderCommandService};
pub use services::{InMemoryNotifier, Notification, Notifier, NotifyError};
pub use stock_service::StockService;
