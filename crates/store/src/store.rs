use async_trait::async_trait;

use crate::{AggregateRecord, Result, Version};

/// Options for saving a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Expected stored version for optimistic concurrency control.
    /// If None, no version check is performed (use with caution).
    pub expected_version: Option<Version>,
}

impl SaveOptions {
    /// Creates options with no version check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options expecting the stored record to be at a specific version.
    pub fn expect_version(version: Version) -> Self {
        Self {
            expected_version: Some(version),
        }
    }

    /// Creates options expecting no record to exist yet.
    pub fn expect_new() -> Self {
        Self {
            expected_version: Some(Version::initial()),
        }
    }
}

/// Core trait for record store implementations.
///
/// A record store is a collection-like map from (aggregate type, key) to the
/// latest persisted record. All implementations must be thread-safe.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Saves a record, replacing the previous one for the same key.
    ///
    /// The write is atomic: either the whole record is stored or nothing is.
    /// If `options.expected_version` is set and the stored version differs,
    /// fails with `ConcurrencyConflict`. On success the stored version is the
    /// previous version plus one, and that version is returned.
    async fn save(&self, record: AggregateRecord, options: SaveOptions) -> Result<Version>;

    /// Loads the latest record for an aggregate.
    ///
    /// Returns None if nothing was ever saved under this key.
    async fn load(&self, aggregate_type: &str, aggregate_key: &str)
    -> Result<Option<AggregateRecord>>;

    /// Gets the stored version of an aggregate without loading its state.
    async fn version_of(&self, aggregate_type: &str, aggregate_key: &str)
    -> Result<Option<Version>>;

    /// Lists the keys of every stored aggregate of one type, sorted.
    async fn keys(&self, aggregate_type: &str) -> Result<Vec<String>>;
}

/// Extension trait providing convenience methods for record stores.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    /// Checks if a record exists for the key.
    async fn exists(&self, aggregate_type: &str, aggregate_key: &str) -> Result<bool> {
        Ok(self
            .version_of(aggregate_type, aggregate_key)
            .await?
            .is_some())
    }
}

impl<T: RecordStore + ?Sized> RecordStoreExt for T {}

/// Validates a record before it is written.
pub fn validate_record_for_save(record: &AggregateRecord) -> Result<()> {
    if record.aggregate_type.is_empty() {
        return Err(crate::StoreError::InvalidRecord(
            "aggregate type must not be empty".to_string(),
        ));
    }
    if record.aggregate_key.is_empty() {
        return Err(crate::StoreError::InvalidRecord(
            "aggregate key must not be empty".to_string(),
        ));
    }
    Ok(())
}
