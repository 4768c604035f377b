//! Event dispatcher for delivering committed events to handlers.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use common::EventId;
use domain::{AggregateRoot, DomainEvent};
use futures_util::FutureExt;
use futures_util::future::join_all;

use crate::error::HandlerError;
use crate::handler::EventHandler;

/// Drains the pending events of a saved aggregate.
///
/// Call this only after the repository save succeeded. A second call returns
/// an empty list, so no event is handed out twice.
pub fn collect<A: AggregateRoot>(aggregate: &mut A) -> Vec<A::Event> {
    aggregate.take_pending_events()
}

/// Delivery settings shared by every handler of a dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Upper bound on a single delivery attempt.
    pub handler_timeout: Duration,

    /// Total attempts per handler and event, including the first.
    pub max_attempts: u32,
}

impl DispatchConfig {
    pub fn new(handler_timeout: Duration, max_attempts: u32) -> Self {
        Self {
            handler_timeout,
            max_attempts: max_attempts.max(1),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            handler_timeout: Duration::from_secs(5),
            max_attempts: 1,
        }
    }
}

/// A delivery that did not succeed within its attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub handler: &'static str,
    pub event_type: &'static str,
    pub event_id: EventId,
    pub attempts: u32,
    pub error: HandlerError,
}

/// Outcome of publishing a batch of events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Number of events published.
    pub events: usize,

    /// Number of successful handler deliveries.
    pub delivered: usize,

    /// Deliveries that failed after every attempt.
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    /// Returns true if every delivery succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Delivers domain events to registered handlers.
///
/// The registration table maps event type names to handlers and is built
/// once at startup; catch-all handlers receive every event. Events are
/// delivered one at a time in the order given, and the handlers of one event
/// run concurrently. A failing, panicking or slow handler only produces an
/// entry in the [`DispatchReport`]; it never affects other handlers or the
/// caller.
pub struct EventDispatcher<E: DomainEvent> {
    routes: HashMap<&'static str, Vec<Arc<dyn EventHandler<E>>>>,
    catch_all: Vec<Arc<dyn EventHandler<E>>>,
    config: DispatchConfig,
}

impl<E: DomainEvent> EventDispatcher<E> {
    /// Creates a dispatcher with no handlers.
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            routes: HashMap::new(),
            catch_all: Vec::new(),
            config,
        }
    }

    /// Registers a handler for one event type.
    pub fn register(
        &mut self,
        event_type: &'static str,
        handler: Arc<dyn EventHandler<E>>,
    ) -> &mut Self {
        tracing::debug!(event_type, handler = handler.name(), "handler registered");
        self.routes.entry(event_type).or_default().push(handler);
        self
    }

    /// Registers a handler for every event type.
    pub fn subscribe_all(&mut self, handler: Arc<dyn EventHandler<E>>) -> &mut Self {
        tracing::debug!(handler = handler.name(), "catch-all handler registered");
        self.catch_all.push(handler);
        self
    }

    /// Returns the number of handlers an event of this type is delivered to.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.routes.get(event_type).map_or(0, Vec::len) + self.catch_all.len()
    }

    pub fn config(&self) -> DispatchConfig {
        self.config
    }

    /// Delivers events in order to their handlers.
    #[tracing::instrument(skip(self, events), fields(events = events.len()))]
    pub async fn publish(&self, events: Vec<E>) -> DispatchReport {
        let mut report = DispatchReport {
            events: events.len(),
            ..DispatchReport::default()
        };

        for event in &events {
            let event_type = event.event_type();
            let handlers = self
                .routes
                .get(event_type)
                .into_iter()
                .flatten()
                .chain(self.catch_all.iter());

            let outcomes = join_all(handlers.map(|handler| self.deliver(handler, event))).await;

            for outcome in outcomes {
                match outcome {
                    Ok(()) => report.delivered += 1,
                    Err(failure) => report.failures.push(failure),
                }
            }
            metrics::counter!("events_published_total", "event_type" => event_type).increment(1);
        }

        tracing::debug!(
            delivered = report.delivered,
            failed = report.failures.len(),
            "events published"
        );
        report
    }

    /// Runs one handler with timeout and retries.
    ///
    /// A panic inside the handler counts as a failed attempt.
    async fn deliver(
        &self,
        handler: &Arc<dyn EventHandler<E>>,
        event: &E,
    ) -> Result<(), HandlerFailure> {
        let timeout = self.config.handler_timeout;
        let mut attempts = 0;
        loop {
            attempts += 1;
            let attempt = AssertUnwindSafe(handler.handle(event)).catch_unwind();
            let result = match tokio::time::timeout(timeout, attempt).await {
                Ok(Ok(result)) => result,
                Ok(Err(payload)) => Err(HandlerError::Failed(format!(
                    "handler panicked: {}",
                    panic_message(payload.as_ref())
                ))),
                Err(_) => Err(HandlerError::TimedOut(timeout)),
            };

            match result {
                Ok(()) => return Ok(()),
                Err(error) if attempts < self.config.max_attempts => {
                    tracing::debug!(
                        handler = handler.name(),
                        event_type = event.event_type(),
                        attempts,
                        %error,
                        "handler attempt failed, retrying"
                    );
                }
                Err(error) => {
                    tracing::warn!(
                        handler = handler.name(),
                        event_type = event.event_type(),
                        event_id = %event.event_id(),
                        attempts,
                        %error,
                        "event handler failed"
                    );
                    metrics::counter!("event_handler_failures_total", "handler" => handler.name())
                        .increment(1);
                    return Err(HandlerFailure {
                        handler: handler.name(),
                        event_type: event.event_type(),
                        event_id: event.event_id(),
                        attempts,
                        error,
                    });
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
