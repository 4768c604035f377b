//! Aggregate record storage.
//!
//! A record store persists one flat, serialized representation per aggregate
//! instance, keyed by aggregate type and identity, and guards every write with
//! an optimistic version check. It knows nothing about the aggregates it
//! stores; typed repositories live in the domain crate.

pub mod error;
pub mod memory;
pub mod record;
pub mod store;
pub mod version;

pub use error::{Result, StoreError};
pub use memory::InMemoryRecordStore;
pub use record::AggregateRecord;
pub use store::{RecordStore, RecordStoreExt, SaveOptions};
pub use version::Version;
