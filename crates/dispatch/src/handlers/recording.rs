//! Handler that keeps every delivered event in memory.

use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainEvent;
use tokio::sync::RwLock;

use crate::Result;
use crate::handler::EventHandler;

/// Records delivered events in arrival order.
///
/// Clones share the same log, so a clone can be registered with a dispatcher
/// while the original is kept for inspection.
#[derive(Clone)]
pub struct RecordingHandler<E> {
    name: &'static str,
    events: Arc<RwLock<Vec<E>>>,
}

impl<E: DomainEvent> RecordingHandler<E> {
    /// Creates an empty recorder.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Returns a copy of the recorded events.
    pub async fn events(&self) -> Vec<E> {
        self.events.read().await.clone()
    }

    /// Returns the recorded event type names.
    pub async fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .await
            .iter()
            .map(DomainEvent::event_type)
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// Forgets everything recorded so far.
    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl<E: DomainEvent> EventHandler<E> for RecordingHandler<E> {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, event: &E) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::AggregateId;
    use domain::{AggregateRoot, Sku, StockEvent, StockItem};

    #[tokio::test]
    async fn clones_share_the_log() {
        let recorder: RecordingHandler<StockEvent> = RecordingHandler::new("recorder");
        let registered = recorder.clone();

        let mut item = StockItem::register(Sku::new("SKU-1").unwrap(), 5);
        item.reserve(AggregateId::new(), 2).unwrap();
        for event in item.take_pending_events() {
            registered.handle(&event).await.unwrap();
        }

        assert_eq!(recorder.event_types().await, vec![StockEvent::RESERVED]);
        recorder.clear().await;
        assert!(registered.is_empty().await);
    }
}
