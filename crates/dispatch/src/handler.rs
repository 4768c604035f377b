//! Core handler trait.

use async_trait::async_trait;
use domain::DomainEvent;

use crate::Result;

/// An independent reaction to a domain event.
///
/// Handlers run after the mutation that raised the event has been committed.
/// A handler that changes another aggregate does so in its own transaction;
/// it never shares one with the aggregate that raised the event.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    /// Returns the name of this handler, used in logs and reports.
    fn name(&self) -> &'static str;

    /// Handles a single event.
    async fn handle(&self, event: &E) -> Result<()>;
}
