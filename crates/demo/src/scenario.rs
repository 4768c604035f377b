//! Reference scenario: one order fulfilled, one rejected, one cancelled.

use std::fmt::Display;

use application::{
    AddOrderLine, CancelOrder, CompleteOrder, ConfirmOrder, CreateOrder, PlaceOrder,
    RegisterStock,
};
use common::AggregateId;
use domain::{Currency, DomainEvent, Money, OrderEvent, OrderStatus, Sku};

use crate::System;
use crate::error::{DemoError, Result};

const SKU: &str = "SKU-1";
const OPENING_STOCK: u32 = 10;

/// What the scenario observed.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub fulfilled_order: AggregateId,
    pub cancelled_order: AggregateId,

    /// Steps that were refused, with the reason given.
    pub rejections: Vec<String>,

    /// Handler deliveries that failed across all commands.
    pub handler_failures: usize,

    pub notifications_sent: usize,

    /// Unreserved units of the demo SKU at the end.
    pub stock_available: u32,
}

/// Runs the scenario against a freshly built system.
#[tracing::instrument(skip(system))]
pub async fn run(system: &System) -> Result<ScenarioReport> {
    let mut rejections = Vec::new();
    let mut handler_failures = 0;

    system
        .stock
        .register(RegisterStock::new(SKU, OPENING_STOCK))
        .await?;

    // Place a $20.00 order, then walk it to completion.
    let fulfilled_order = create_order(system, "C1").await?;
    system
        .orders
        .add_line(AddOrderLine::new(fulfilled_order, SKU, 2, 1000, "USD"))
        .await?;
    let placed = system.orders.place_order(PlaceOrder::new(fulfilled_order)).await?;
    handler_failures += placed.result.dispatch.failures.len();

    let event_types: Vec<&str> = placed.result.events.iter().map(OrderEvent::event_type).collect();
    if placed.result.aggregate.total().amount_minor() != 2000
        || event_types != [OrderEvent::PLACED]
    {
        return Err(DemoError::Unexpected(format!(
            "placing raised {event_types:?} with total {}",
            placed.result.aggregate.total()
        )));
    }

    expect_rejection(
        "place twice",
        system.orders.place_order(PlaceOrder::new(fulfilled_order)).await,
        &mut rejections,
    )?;

    for outcome in [
        system.orders.confirm_order(ConfirmOrder::new(fulfilled_order)).await?,
        system.orders.complete_order(CompleteOrder::new(fulfilled_order)).await?,
    ] {
        handler_failures += outcome.result.dispatch.failures.len();
    }

    // An order without lines cannot be placed.
    let empty_order = create_order(system, "C2").await?;
    expect_rejection(
        "place empty order",
        system.orders.place_order(PlaceOrder::new(empty_order)).await,
        &mut rejections,
    )?;
    let still_draft = system.orders.get_order(empty_order).await?;
    if still_draft.map(|order| order.status()) != Some(OrderStatus::Draft) {
        return Err(DemoError::Unexpected("empty order left Draft".to_string()));
    }

    // Cancelling a placed order hands its stock back.
    let cancelled_order = create_order(system, "C3").await?;
    system
        .orders
        .add_line(AddOrderLine::new(cancelled_order, SKU, 3, 1000, "USD"))
        .await?;
    for outcome in [
        system.orders.place_order(PlaceOrder::new(cancelled_order)).await?,
        system
            .orders
            .cancel_order(CancelOrder::new(cancelled_order, "customer request"))
            .await?,
    ] {
        handler_failures += outcome.result.dispatch.failures.len();
    }

    // Amounts in different currencies do not combine.
    let dollars =
        Money::new(1000, Currency::USD).map_err(|e| DemoError::Unexpected(e.to_string()))?;
    let euros =
        Money::new(500, Currency::EUR).map_err(|e| DemoError::Unexpected(e.to_string()))?;
    expect_rejection("add USD to EUR", dollars.add(&euros), &mut rejections)?;

    let stock_available = stock_available(system).await?;
    let notifications_sent = system.notifier.sent_count().await;

    tracing::info!(
        %fulfilled_order,
        %cancelled_order,
        rejections = rejections.len(),
        handler_failures,
        notifications_sent,
        stock_available,
        "scenario finished"
    );

    Ok(ScenarioReport {
        fulfilled_order,
        cancelled_order,
        rejections,
        handler_failures,
        notifications_sent,
        stock_available,
    })
}

async fn create_order(system: &System, customer: &str) -> Result<AggregateId> {
    let cmd = CreateOrder::for_customer(customer, "USD")
        .with_contact_email(format!("{}@example.com", customer.to_lowercase()));
    let outcome = system.orders.create_order(cmd).await?;
    Ok(outcome.order_id)
}

async fn stock_available(system: &System) -> Result<u32> {
    let sku = Sku::new(SKU).map_err(|e| DemoError::Unexpected(e.to_string()))?;
    system
        .stock
        .get_item(&sku)
        .await?
        .map(|item| item.available())
        .ok_or_else(|| DemoError::Unexpected(format!("{SKU} disappeared")))
}

fn expect_rejection<T, E: Display>(
    step: &'static str,
    result: std::result::Result<T, E>,
    rejections: &mut Vec<String>,
) -> Result<()> {
    match result {
        Ok(_) => Err(DemoError::Unexpected(format!("{step} was accepted"))),
        Err(err) => {
            tracing::info!(step, error = %err, "rejected as expected");
            rejections.push(format!("{step}: {err}"));
            Ok(())
        }
    }
}
