//! Handler that writes every delivered event to the log.

use async_trait::async_trait;
use domain::DomainEvent;

use crate::Result;
use crate::handler::EventHandler;

/// Logs each event it receives at info level.
///
/// Usually registered as a catch-all so that every committed fact leaves a
/// trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHandler;

impl LoggingHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<E: DomainEvent> EventHandler<E> for LoggingHandler {
    fn name(&self) -> &'static str {
        "LoggingHandler"
    }

    async fn handle(&self, event: &E) -> Result<()> {
        let metadata = event.metadata();
        tracing::info!(
            event_type = event.event_type(),
            event_id = %metadata.event_id,
            aggregate_type = %metadata.aggregate_type,
            aggregate_key = %metadata.aggregate_key,
            occurred_at = %metadata.occurred_at,
            "domain event"
        );
        Ok(())
    }
}
