//! Domain layer: the building blocks of a consistency boundary.
//!
//! This crate provides:
//! - Value types that validate themselves at construction
//! - The `Entity` capability for identity-compared objects
//! - The `AggregateRoot` and `DomainEvent` traits, with per-aggregate event
//!   buffering and guarded lifecycle transitions
//! - Typed repositories over a `store::RecordStore`
//! - The `Order` and `StockItem` aggregates

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod inventory;
pub mod order;
pub mod repository;
pub mod value_objects;

pub use aggregate::{
    AggregateRoot, DomainEvent, EventBuffer, EventMetadata, LifecycleState, ensure_transition,
};
pub use entity::Entity;
pub use error::{
    DimensionMismatchError, InvalidTransitionError, PreconditionError, StateConflictError,
    ValidationError,
};
pub use inventory::{StockError, StockEvent, StockItem, StockStatus};
pub use order::{
    LineSnapshot, Order, OrderError, OrderEvent, OrderLine, OrderLineId, OrderStatus,
};
pub use repository::{Repository, RepositoryError, StoreRepository};
pub use value_objects::{
    Currency, CustomerId, EmailAddress, Money, Quantity, Sku, ValueObject,
};
