//! Typed, identity-keyed repositories over a record store.

use std::marker::PhantomData;

use async_trait::async_trait;
use store::{AggregateRecord, RecordStore, SaveOptions, StoreError, Version};
use thiserror::Error;

use crate::aggregate::AggregateRoot;

/// Errors that can occur when loading or saving an aggregate.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// No aggregate exists for the identity.
    #[error("{aggregate_type} {id} not found")]
    NotFound {
        aggregate_type: &'static str,
        id: String,
    },

    /// The aggregate was modified by someone else since it was loaded.
    /// Reload and reapply the change to retry.
    #[error(
        "Concurrency conflict for {aggregate_type} {id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_type: String,
        id: String,
        expected: Version,
        actual: Version,
    },

    /// The stored state could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict {
                aggregate_type,
                aggregate_key,
                expected,
                actual,
            } => RepositoryError::ConcurrencyConflict {
                aggregate_type,
                id: aggregate_key,
                expected,
                actual,
            },
            StoreError::Serialization(e) => RepositoryError::Serialization(e),
            other => RepositoryError::Store(other),
        }
    }
}

impl RepositoryError {
    /// Returns true if reloading and reapplying may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::ConcurrencyConflict { .. })
    }
}

/// Collection-like access to the aggregates of one type.
///
/// Repositories never expose or accept internal entities, and never deliver
/// events: `save` persists state only.
#[async_trait]
pub trait Repository<A: AggregateRoot>: Send + Sync {
    /// Loads a fully reconstituted aggregate, or None if it does not exist.
    async fn find_by_id(&self, id: &A::Id) -> Result<Option<A>, RepositoryError>;

    /// Persists the whole aggregate atomically.
    ///
    /// Fails with `ConcurrencyConflict` if the stored version is not the one
    /// the aggregate was loaded at. On success the aggregate's version is
    /// advanced; its pending events are left untouched.
    async fn save(&self, aggregate: &mut A) -> Result<Version, RepositoryError>;

    /// Loads an aggregate, treating absence as an error.
    async fn get(&self, id: &A::Id) -> Result<A, RepositoryError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound {
                aggregate_type: A::aggregate_type(),
                id: id.to_string(),
            })
    }
}

/// Repository backed by any [`RecordStore`].
pub struct StoreRepository<S, A> {
    store: S,
    _phantom: PhantomData<fn() -> A>,
}

impl<S: Clone, A> Clone for StoreRepository<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<S, A> StoreRepository<S, A>
where
    S: RecordStore,
    A: AggregateRoot,
{
    /// Creates a repository over the given store.
    pub fn new(store: S) -> Self {
        Self {
            store,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S, A> Repository<A> for StoreRepository<S, A>
where
    S: RecordStore,
    A: AggregateRoot,
{
    #[tracing::instrument(skip(self), fields(aggregate_type = A::aggregate_type()))]
    async fn find_by_id(&self, id: &A::Id) -> Result<Option<A>, RepositoryError> {
        let key = id.to_string();
        let Some(record) = self.store.load(A::aggregate_type(), &key).await? else {
            return Ok(None);
        };

        let snapshot: A::Snapshot = record.state_as()?;
        Ok(Some(A::reconstitute(snapshot, record.version)))
    }

    #[tracing::instrument(
        skip(self, aggregate),
        fields(
            aggregate_type = A::aggregate_type(),
            id = %aggregate.aggregate_id(),
            expected_version = %aggregate.version(),
        )
    )]
    async fn save(&self, aggregate: &mut A) -> Result<Version, RepositoryError> {
        let current = aggregate.version();
        let record = AggregateRecord::from_state(
            A::aggregate_type(),
            aggregate.aggregate_id().to_string(),
            &aggregate.snapshot(),
        )?;

        let options = if current.is_initial() {
            SaveOptions::expect_new()
        } else {
            SaveOptions::expect_version(current)
        };

        let new_version = self.store.save(record, options).await?;
        aggregate.set_version(new_version);

        tracing::debug!(%new_version, "aggregate saved");
        Ok(new_version)
    }
}
