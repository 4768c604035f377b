//! Notification service trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use common::AggregateId;
use domain::EmailAddress;
use thiserror::Error;
use tokio::sync::RwLock;

/// A message addressed to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: EmailAddress,
    pub order_id: AggregateId,
    pub subject: String,
    pub body: String,
}

/// Errors reported by a notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification service unavailable: {0}")]
    Unavailable(String),
}

/// Trait for sending customer notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one notification.
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Default)]
struct InMemoryNotifierState {
    sent: Vec<Notification>,
    fail_on_send: bool,
}

/// In-memory notifier for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    state: Arc<RwLock<InMemoryNotifierState>>,
}

impl InMemoryNotifier {
    /// Creates a new in-memory notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the notifier to fail every send.
    pub async fn set_fail_on_send(&self, fail: bool) {
        self.state.write().await.fail_on_send = fail;
    }

    /// Returns the notifications sent so far.
    pub async fn sent(&self) -> Vec<Notification> {
        self.state.read().await.sent.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.state.read().await.sent.len()
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        let mut state = self.state.write().await;

        if state.fail_on_send {
            return Err(NotifyError::Unavailable("mail relay down".to_string()));
        }

        state.sent.push(notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            recipient: EmailAddress::new("buyer@example.com").unwrap(),
            order_id: AggregateId::new(),
            subject: "Order placed".to_string(),
            body: "Thanks".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_records_notification() {
        let notifier = InMemoryNotifier::new();
        let sent = notification();

        notifier.send(sent.clone()).await.unwrap();

        assert_eq!(notifier.sent().await, vec![sent]);
    }

    #[tokio::test]
    async fn test_fail_on_send() {
        let notifier = InMemoryNotifier::new();
        notifier.set_fail_on_send(true).await;

        let result = notifier.send(notification()).await;

        assert!(matches!(result, Err(NotifyError::Unavailable(_))));
        assert_eq!(notifier.sent_count().await, 0);
    }
}
