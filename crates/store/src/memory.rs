use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    AggregateRecord, Result, StoreError, Version,
    store::{RecordStore, SaveOptions, validate_record_for_save},
};

type RecordKey = (String, String);

/// In-memory record store implementation.
///
/// The version check and the write happen under one write lock, so two
/// writers racing on the same key are serialized and exactly one of them can
/// win against a given base version.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<RecordKey, AggregateRecord>>>,
    fail_on_save: Arc<AtomicBool>,
}

impl InMemoryRecordStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records stored.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }

    /// Makes every subsequent save fail with `Unavailable` until reset.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.fail_on_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    #[tracing::instrument(
        skip(self, record),
        fields(aggregate_type = %record.aggregate_type, aggregate_key = %record.aggregate_key)
    )]
    async fn save(&self, mut record: AggregateRecord, options: SaveOptions) -> Result<Version> {
        validate_record_for_save(&record)?;

        if self.fail_on_save.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store configured to fail".to_string(),
            ));
        }

        let key = (record.aggregate_type.clone(), record.aggregate_key.clone());
        let mut records = self.records.write().await;

        let current_version = records
            .get(&key)
            .map(|r| r.version)
            .unwrap_or(Version::initial());

        if let Some(expected) = options.expected_version
            && current_version != expected
        {
            metrics::counter!("repository_conflicts_total").increment(1);
            tracing::debug!(%expected, actual = %current_version, "optimistic check failed");
            return Err(StoreError::ConcurrencyConflict {
                aggregate_type: key.0,
                aggregate_key: key.1,
                expected,
                actual: current_version,
            });
        }

        let new_version = current_version.next();
        record.version = new_version;
        record.saved_at = Utc::now();
        records.insert(key, record);

        metrics::counter!("repository_saves_total").increment(1);
        Ok(new_version)
    }

    async fn load(
        &self,
        aggregate_type: &str,
        aggregate_key: &str,
    ) -> Result<Option<AggregateRecord>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(aggregate_type.to_string(), aggregate_key.to_string()))
            .cloned())
    }

    async fn version_of(
        &self,
        aggregate_type: &str,
        aggregate_key: &str,
    ) -> Result<Option<Version>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(aggregate_type.to_string(), aggregate_key.to_string()))
            .map(|r| r.version))
    }

    async fn keys(&self, aggregate_type: &str) -> Result<Vec<String>> {
        let records = self.records.read().await;
        let mut keys: Vec<_> = records
            .keys()
            .filter(|(ty, _)| ty == aggregate_type)
            .map(|(_, key)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
