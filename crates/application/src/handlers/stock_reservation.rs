//! Keeps stock reservations in step with order placement and cancellation.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use dispatch::{EventHandler, HandlerError};
use domain::{LineSnapshot, OrderEvent, OrderStatus, PreconditionError, Sku, StockError};
use store::RecordStore;

use crate::error::ApplicationError;
use crate::stock_service::StockService;

/// Reserves stock when an order is placed and releases it when the order is
/// cancelled.
///
/// Each stock item is changed in its own transaction. If one SKU cannot be
/// reserved, the SKUs already reserved for the order are released again and
/// the delivery fails. Redelivery of the same event is harmless: an existing
/// reservation counts as done, a missing one on release is skipped.
///
/// Compensation runs inside the delivery. When the dispatcher's handler
/// timeout cancels a delivery part way, the SKUs reserved so far stay held
/// and nothing releases them. With `max_attempts` above one the next attempt
/// picks up from there and finishes the remaining SKUs; with a single attempt
/// they are freed when the order is cancelled.
pub struct StockReservationHandler<S: RecordStore> {
    stock: Arc<StockService<S>>,
}

impl<S: RecordStore> StockReservationHandler<S> {
    pub fn new(stock: Arc<StockService<S>>) -> Self {
        Self { stock }
    }

    async fn reserve_all(
        &self,
        order_id: AggregateId,
        lines: &[LineSnapshot],
    ) -> Result<(), HandlerError> {
        let demand = demand_by_sku(lines)?;
        let mut reserved: Vec<Sku> = Vec::with_capacity(demand.len());

        for (sku, units) in demand {
            match self.stock.reserve(&sku, order_id, units).await {
                Ok(_) => reserved.push(sku),
                Err(err) if is_duplicate_reservation(&err) => {
                    tracing::debug!(%order_id, %sku, "reservation already held");
                    reserved.push(sku);
                }
                Err(err) => {
                    tracing::warn!(
                        %order_id,
                        %sku,
                        error = %err,
                        "reservation failed, compensating"
                    );
                    self.release_skus(order_id, &reserved).await;
                    return Err(HandlerError::failed(format!(
                        "could not reserve {sku} for order {order_id}: {err}"
                    )));
                }
            }
        }

        tracing::info!(%order_id, skus = reserved.len(), "stock reserved");
        Ok(())
    }

    async fn release_all(
        &self,
        order_id: AggregateId,
        lines: &[LineSnapshot],
    ) -> Result<(), HandlerError> {
        let skus: Vec<Sku> = lines
            .iter()
            .map(|line| line.sku.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let failures = self.release_skus(order_id, &skus).await;

        if failures == 0 {
            tracing::info!(%order_id, skus = skus.len(), "stock released");
            Ok(())
        } else {
            Err(HandlerError::failed(format!(
                "{failures} of {} releases failed for order {order_id}",
                skus.len()
            )))
        }
    }

    /// Releases the order's reservation on each SKU and returns how many
    /// releases failed.
    async fn release_skus(&self, order_id: AggregateId, skus: &[Sku]) -> usize {
        let mut failures = 0;
        for sku in skus {
            match self.stock.release(sku, order_id).await {
                Ok(_) => {}
                Err(err) if is_unknown_reservation(&err) => {
                    tracing::debug!(%order_id, %sku, "no reservation to release");
                }
                Err(err) => {
                    tracing::warn!(%order_id, %sku, error = %err, "release failed");
                    failures += 1;
                }
            }
        }
        failures
    }
}

#[async_trait]
impl<S: RecordStore> EventHandler<OrderEvent> for StockReservationHandler<S> {
    fn name(&self) -> &'static str {
        "StockReservationHandler"
    }

    async fn handle(&self, event: &OrderEvent) -> dispatch::Result<()> {
        match event {
            OrderEvent::OrderPlaced(data) => self.reserve_all(data.order_id, &data.lines).await,
            // Draft orders never held stock.
            OrderEvent::OrderCancelled(data) if data.previous_status != OrderStatus::Draft => {
                self.release_all(data.order_id, &data.lines).await
            }
            _ => Ok(()),
        }
    }
}

/// Sums line quantities per SKU.
///
/// Lines of one SKU at different prices stay separate on the order, so the
/// sum may exceed what a single line can hold.
fn demand_by_sku(lines: &[LineSnapshot]) -> Result<BTreeMap<Sku, u32>, HandlerError> {
    let mut demand: BTreeMap<Sku, u32> = BTreeMap::new();
    for line in lines {
        let total = demand.entry(line.sku.clone()).or_default();
        *total = total.checked_add(line.quantity.get()).ok_or_else(|| {
            HandlerError::failed(format!("demand for {} overflows", line.sku))
        })?;
    }
    Ok(demand)
}

fn is_duplicate_reservation(err: &ApplicationError) -> bool {
    matches!(
        err,
        ApplicationError::Stock(StockError::Precondition(
            PreconditionError::DuplicateReservation { .. }
        ))
    )
}

fn is_unknown_reservation(err: &ApplicationError) -> bool {
    matches!(
        err,
        ApplicationError::Stock(StockError::Precondition(
            PreconditionError::UnknownReservation { .. }
        ))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{Currency, Money, OrderLineId, Quantity};

    fn line(sku: &str, quantity: u32) -> LineSnapshot {
        let unit_price = Money::new(100, Currency::USD).unwrap();
        let quantity = Quantity::new(quantity).unwrap();
        LineSnapshot {
            line_id: OrderLineId::from(uuid::Uuid::new_v4()),
            sku: Sku::new(sku).unwrap(),
            quantity,
            unit_price,
            line_total: unit_price.multiply(quantity),
        }
    }

    #[test]
    fn demand_merges_lines_with_same_sku() {
        let demand =
            demand_by_sku(&[line("SKU-A", 2), line("SKU-B", 1), line("SKU-A", 3)]).unwrap();

        assert_eq!(demand.len(), 2);
        assert_eq!(demand[&Sku::new("SKU-A").unwrap()], 5);
        assert_eq!(demand[&Sku::new("SKU-B").unwrap()], 1);
    }

    #[test]
    fn demand_may_exceed_one_line_quantity() {
        let demand = demand_by_sku(&[line("SKU-A", 6000), line("SKU-A", 6000)]).unwrap();

        assert_eq!(demand[&Sku::new("SKU-A").unwrap()], 12_000);
    }

    #[test]
    fn demand_of_no_lines_is_empty() {
        assert!(demand_by_sku(&[]).unwrap().is_empty());
    }
}
