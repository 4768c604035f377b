//! Runnable wiring of the order domain.
//!
//! Builds an in-memory record store, one dispatcher per aggregate type with
//! its handlers registered up front, and the command services on top, then
//! drives them through a reference scenario.

pub mod config;
pub mod error;
pub mod scenario;
pub mod telemetry;

use std::sync::Arc;

use application::{
    CustomerNotificationHandler, InMemoryNotifier, OrderCommandService, StockReservationHandler,
    StockService,
};
use dispatch::{EventDispatcher, LoggingHandler};
use domain::{OrderEvent, StockEvent};
use store::InMemoryRecordStore;

use config::Config;

/// Everything the scenario talks to.
pub struct System {
    pub store: InMemoryRecordStore,
    pub orders: OrderCommandService<InMemoryRecordStore>,
    pub stock: Arc<StockService<InMemoryRecordStore>>,
    pub notifier: Arc<InMemoryNotifier>,
}

/// Creates the store, dispatchers, handlers and services.
pub fn build_system(config: &Config) -> System {
    let store = InMemoryRecordStore::new();

    let mut stock_dispatcher: EventDispatcher<StockEvent> =
        EventDispatcher::new(config.dispatch_config());
    stock_dispatcher.subscribe_all(Arc::new(LoggingHandler::new()));
    let stock = Arc::new(StockService::new(
        store.clone(),
        Arc::new(stock_dispatcher),
        config.service_config(),
    ));

    let notifier = Arc::new(InMemoryNotifier::new());
    let reservations = Arc::new(StockReservationHandler::new(stock.clone()));

    let mut order_dispatcher: EventDispatcher<OrderEvent> =
        EventDispatcher::new(config.dispatch_config());
    order_dispatcher
        .register(OrderEvent::PLACED, reservations.clone())
        .register(OrderEvent::CANCELLED, reservations)
        .register(
            OrderEvent::PLACED,
            Arc::new(CustomerNotificationHandler::new(notifier.clone())),
        )
        .subscribe_all(Arc::new(LoggingHandler::new()));

    let orders = OrderCommandService::new(
        store.clone(),
        Arc::new(order_dispatcher),
        config.service_config(),
    );

    System {
        store,
        orders,
        stock,
        notifier,
    }
}
