//! Tells customers about their orders.

use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{EventHandler, HandlerError};
use domain::OrderEvent;

use crate::services::{Notification, Notifier};

/// Sends a notification for each lifecycle event of an order that has a
/// contact address. Orders without one are skipped.
pub struct CustomerNotificationHandler<N: Notifier> {
    notifier: Arc<N>,
}

impl<N: Notifier> CustomerNotificationHandler<N> {
    pub fn new(notifier: Arc<N>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl<N: Notifier + 'static> EventHandler<OrderEvent> for CustomerNotificationHandler<N> {
    fn name(&self) -> &'static str {
        "CustomerNotificationHandler"
    }

    async fn handle(&self, event: &OrderEvent) -> dispatch::Result<()> {
        let OrderEvent::OrderPlaced(data) = event else {
            return Ok(());
        };
        let Some(recipient) = data.contact_email.clone() else {
            tracing::debug!(order_id = %data.order_id, "no contact email, skipping");
            return Ok(());
        };

        let notification = Notification {
            recipient,
            order_id: data.order_id,
            subject: format!("Order {} placed", data.order_id),
            body: format!(
                "We received your order of {} item line(s), total {}.",
                data.lines.len(),
                data.total
            ),
        };

        self.notifier
            .send(notification)
            .await
            .map_err(HandlerError::failed)?;

        tracing::info!(order_id = %data.order_id, "customer notified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryNotifier;
    use domain::order::OrderPlacedData;
    use domain::{Currency, CustomerId, EmailAddress, EventMetadata, Money};

    fn placed(contact_email: Option<&str>) -> OrderEvent {
        let order_id = common::AggregateId::new();
        OrderEvent::OrderPlaced(OrderPlacedData {
            metadata: EventMetadata::new("Order", order_id),
            order_id,
            customer_id: CustomerId::new("C1").unwrap(),
            contact_email: contact_email.map(|e| EmailAddress::new(e).unwrap()),
            lines: Vec::new(),
            total: Money::new(2500, Currency::USD).unwrap(),
            placed_at: chrono::Utc::now(),
        })
    }

    #[tokio::test]
    async fn notifies_customer_with_contact_email() {
        let notifier = Arc::new(InMemoryNotifier::new());
        let handler = CustomerNotificationHandler::new(notifier.clone());

        handler.handle(&placed(Some("buyer@example.com"))).await.unwrap();

        let sent = notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient.as_str(), "buyer@example.com");
    }

    #[tokio::test]
    async fn skips_order_without_contact_email() {
        let notifier = Arc::new(InMemoryNotifier::new());
        let handler = CustomerNotificationHandler::new(notifier.clone());

        handler.handle(&placed(None)).await.unwrap();

        assert_eq!(notifier.sent_count().await, 0);
    }

    #[tokio::test]
    async fn notifier_failure_becomes_handler_error() {
        let notifier = Arc::new(InMemoryNotifier::new());
        notifier.set_fail_on_send(true).await;
        let handler = CustomerNotificationHandler::new(notifier);

        let err = handler
            .handle(&placed(Some("buyer@example.com")))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Failed(_)));
    }
}
