//! Integration tests: repository save → collect → publish.

use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use dispatch::{
    DispatchConfig, EventDispatcher, EventHandler, HandlerError, LoggingHandler, RecordingHandler,
    collect,
};
use domain::{
    AggregateRoot, Currency, CustomerId, DomainEvent, Money, Order, OrderEvent, Quantity,
    Repository, Sku, StoreRepository,
};
use store::InMemoryRecordStore;

struct AlwaysFails;

#[async_trait]
impl EventHandler<OrderEvent> for AlwaysFails {
    fn name(&self) -> &'static str {
        "AlwaysFails"
    }

    async fn handle(&self, _event: &OrderEvent) -> dispatch::Result<()> {
        Err(HandlerError::failed("downstream unavailable"))
    }
}

fn draft() -> Order {
    let mut order = Order::create(
        AggregateId::new(),
        CustomerId::new("C1").unwrap(),
        Currency::USD,
        None,
    );
    order
        .add_line(
            Sku::new("SKU-1").unwrap(),
            Quantity::new(2).unwrap(),
            Money::new(1000, Currency::USD).unwrap(),
        )
        .unwrap();
    order
}

#[tokio::test]
async fn events_are_delivered_after_save_in_append_order() {
    let repo: StoreRepository<_, Order> = StoreRepository::new(InMemoryRecordStore::new());
    let recorder = RecordingHandler::<OrderEvent>::new("recorder");
    let mut dispatcher: EventDispatcher<OrderEvent> =
        EventDispatcher::new(DispatchConfig::default());
    dispatcher
        .subscribe_all(Arc::new(recorder.clone()))
        .subscribe_all(Arc::new(LoggingHandler::new()));

    let mut order = draft();
    order.place().unwrap();
    order.confirm().unwrap();
    assert!(recorder.is_empty().await);

    repo.save(&mut order).await.unwrap();
    let report = dispatcher.publish(collect(&mut order)).await;

    assert!(report.is_clean());
    assert_eq!(report.delivered, 4);
    assert_eq!(
        recorder.event_types().await,
        vec![OrderEvent::PLACED, OrderEvent::CONFIRMED]
    );

    // A second collect yields nothing, so nothing is delivered twice.
    let report = dispatcher.publish(collect(&mut order)).await;
    assert_eq!(report.events, 0);
    assert_eq!(recorder.len().await, 2);
}

#[tokio::test]
async fn failed_save_delivers_nothing() {
    let store = InMemoryRecordStore::new();
    let repo: StoreRepository<_, Order> = StoreRepository::new(store.clone());
    let recorder = RecordingHandler::<OrderEvent>::new("recorder");
    let mut dispatcher: EventDispatcher<OrderEvent> =
        EventDispatcher::new(DispatchConfig::default());
    dispatcher.subscribe_all(Arc::new(recorder.clone()));

    let mut order = draft();
    order.place().unwrap();
    store.set_fail_on_save(true);

    if repo.save(&mut order).await.is_ok() {
        dispatcher.publish(collect(&mut order)).await;
    }

    assert!(recorder.is_empty().await);
    assert_eq!(order.pending_events().len(), 1);
}

#[tokio::test]
async fn handler_failure_does_not_undo_the_commit() {
    let repo: StoreRepository<_, Order> = StoreRepository::new(InMemoryRecordStore::new());
    let recorder = RecordingHandler::<OrderEvent>::new("recorder");
    let mut dispatcher: EventDispatcher<OrderEvent> =
        EventDispatcher::new(DispatchConfig::default());
    dispatcher
        .register(OrderEvent::PLACED, Arc::new(AlwaysFails))
        .register(OrderEvent::PLACED, Arc::new(recorder.clone()));

    let mut order = draft();
    order.place().unwrap();
    repo.save(&mut order).await.unwrap();
    let events = collect(&mut order);
    let event_id = events[0].event_id();

    let report = dispatcher.publish(events).await;

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].event_id, event_id);
    assert_eq!(recorder.len().await, 1);

    let stored = repo.get(order.aggregate_id()).await.unwrap();
    assert_eq!(stored.status(), domain::OrderStatus::Placed);
}
