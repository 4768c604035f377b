//! Core aggregate and domain event traits.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use common::EventId;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use store::Version;

use crate::error::InvalidTransitionError;

/// Trait for domain events.
///
/// Domain events are immutable, past-tense facts. They carry a flattened
/// snapshot of whatever observers need, never a reference back into the
/// aggregate that raised them.
pub trait DomainEvent: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// Returns the event type name used for handler registration.
    fn event_type(&self) -> &'static str;

    /// Returns the identity and timing information of this event.
    fn metadata(&self) -> &EventMetadata;

    /// Returns the stable event identifier.
    fn event_id(&self) -> EventId {
        self.metadata().event_id
    }
}

/// Identity and provenance carried by every domain event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique identifier of this event.
    pub event_id: EventId,

    /// The type of aggregate that raised the event.
    pub aggregate_type: String,

    /// The identity of the aggregate that raised the event.
    pub aggregate_key: String,

    /// When the underlying business fact happened.
    pub occurred_at: DateTime<Utc>,
}

impl EventMetadata {
    /// Creates metadata for an event raised now.
    pub fn new(aggregate_type: &str, aggregate_key: impl Display) -> Self {
        Self {
            event_id: EventId::new(),
            aggregate_type: aggregate_type.to_string(),
            aggregate_key: aggregate_key.to_string(),
            occurred_at: Utc::now(),
        }
    }
}

/// Pending events raised by an aggregate and not yet delivered.
///
/// Owned by the aggregate instance. Events become deliverable only after the
/// aggregate has been saved, at which point the caller drains the buffer.
#[derive(Debug, Clone)]
pub struct EventBuffer<E> {
    pending: Vec<E>,
}

impl<E> EventBuffer<E> {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Appends an event.
    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Returns the pending events in append order.
    pub fn pending(&self) -> &[E] {
        &self.pending
    }

    /// Removes and returns all pending events, leaving the buffer empty.
    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<E> Default for EventBuffer<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A lifecycle state of an aggregate.
pub trait LifecycleState: Copy + Eq + Debug + Display + Send + Sync {
    /// Returns true if no further mutating operations are accepted.
    fn is_terminal(&self) -> bool;
}

/// Checks `current` against the allow-list of states from which `attempted`
/// is legal.
pub fn ensure_transition<S: LifecycleState>(
    current: S,
    allowed_from: &[S],
    attempted: &'static str,
) -> Result<(), InvalidTransitionError<S>> {
    if !current.is_terminal() && allowed_from.contains(&current) {
        Ok(())
    } else {
        Err(InvalidTransitionError { current, attempted })
    }
}

/// Trait for aggregate roots.
///
/// An aggregate is a consistency boundary: a root entity plus the entities
/// and value types it owns. All mutation goes through operations on the root,
/// each of which either applies completely or fails without changing
/// anything. Aggregates perform no I/O.
///
/// Persistence works on a flat [`AggregateRoot::Snapshot`]: the repository
/// serializes it on save and hands it to [`AggregateRoot::reconstitute`] on
/// load. Pending events are never part of the snapshot.
pub trait AggregateRoot: Send + Sync + Sized {
    /// Identity type, rendered with `Display` as the storage key.
    type Id: Clone + Eq + Hash + Debug + Display + Send + Sync;

    /// The type of events this aggregate raises.
    type Event: DomainEvent;

    /// Flat persisted representation of the whole aggregate graph.
    type Snapshot: Serialize + DeserializeOwned + Send;

    /// Returns the aggregate type name.
    ///
    /// Used for storage organization and event metadata.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's identity.
    fn aggregate_id(&self) -> &Self::Id;

    /// Returns the version this instance was loaded at, or last saved as.
    ///
    /// A never-saved aggregate is at [`Version::initial`].
    fn version(&self) -> Version;

    /// Records the version assigned by a successful save.
    fn set_version(&mut self, version: Version);

    /// Returns events raised since the last drain, in append order.
    fn pending_events(&self) -> &[Self::Event];

    /// Drains the pending events.
    fn take_pending_events(&mut self) -> Vec<Self::Event>;

    /// Captures the current state for persistence.
    fn snapshot(&self) -> Self::Snapshot;

    /// Rebuilds an aggregate from its persisted form.
    ///
    /// Does not re-run creation-time validation and never raises events.
    fn reconstitute(snapshot: Self::Snapshot, version: Version) -> Self;
}
