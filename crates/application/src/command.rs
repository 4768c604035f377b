//! Command handling infrastructure.

use std::sync::Arc;

use dispatch::{DispatchReport, EventDispatcher, collect};
use domain::{AggregateRoot, Repository, RepositoryError, StoreRepository};
use store::{RecordStore, Version};

use crate::config::ServiceConfig;
use crate::error::{ApplicationError, Result};

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: AggregateRoot, T = ()> {
    /// The aggregate as saved.
    pub aggregate: A,

    /// Whatever the aggregate operation returned.
    pub output: T,

    /// The events that were committed and published.
    pub events: Vec<A::Event>,

    /// The version assigned by the save.
    pub new_version: Version,

    /// Outcome of delivering the events to handlers.
    pub dispatch: DispatchReport,
}

/// Runs single-aggregate transactions.
///
/// Each command is one unit of work: load the aggregate, invoke one
/// operation on it, save it with an optimistic version check and, only once
/// the save has succeeded, publish the events it raised. A concurrency
/// conflict reruns the whole unit against freshly loaded state, up to the
/// configured number of retries. No business rule lives here.
pub struct CommandHandler<S, A>
where
    S: RecordStore,
    A: AggregateRoot,
{
    repository: StoreRepository<S, A>,
    dispatcher: Arc<EventDispatcher<A::Event>>,
    config: ServiceConfig,
}

impl<S, A> CommandHandler<S, A>
where
    S: RecordStore,
    A: AggregateRoot,
{
    /// Creates a new command handler.
    pub fn new(
        store: S,
        dispatcher: Arc<EventDispatcher<A::Event>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            repository: StoreRepository::new(store),
            dispatcher,
            config,
        }
    }

    /// Returns the underlying repository.
    pub fn repository(&self) -> &StoreRepository<S, A> {
        &self.repository
    }

    pub fn config(&self) -> ServiceConfig {
        self.config
    }

    /// Loads an aggregate, or None if it does not exist.
    pub async fn load(&self, id: &A::Id) -> Result<Option<A>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Persists a newly constructed aggregate and publishes anything it raised.
    #[tracing::instrument(
        skip(self, aggregate),
        fields(aggregate_type = A::aggregate_type(), id = %aggregate.aggregate_id())
    )]
    pub async fn create(
        &self,
        command: &'static str,
        mut aggregate: A,
    ) -> Result<CommandResult<A>> {
        let new_version = match self.repository.save(&mut aggregate).await {
            Ok(version) => version,
            Err(err) if err.is_conflict() => {
                return Err(ApplicationError::AlreadyExists {
                    aggregate_type: A::aggregate_type(),
                    id: aggregate.aggregate_id().to_string(),
                });
            }
            Err(err) => return Err(err.into()),
        };

        Ok(self.finish(command, aggregate, (), new_version).await)
    }

    /// Executes one operation against an existing aggregate.
    ///
    /// `operation` may run more than once if the save hits a concurrency
    /// conflict; each run sees a freshly loaded aggregate.
    #[tracing::instrument(
        skip(self, operation),
        fields(aggregate_type = A::aggregate_type(), id = %id)
    )]
    pub async fn execute<T, E, F>(
        &self,
        command: &'static str,
        id: &A::Id,
        mut operation: F,
    ) -> Result<CommandResult<A, T>>
    where
        F: FnMut(&mut A) -> std::result::Result<T, E> + Send,
        E: Into<ApplicationError>,
        T: Send,
    {
        let mut retries = 0;
        loop {
            let mut aggregate = self.repository.get(id).await?;
            let output = match operation(&mut aggregate) {
                Ok(output) => output,
                Err(err) => {
                    let err = err.into();
                    tracing::debug!(command, error = %err, "command rejected");
                    metrics::counter!(
                        "commands_executed_total",
                        "command" => command,
                        "outcome" => "rejected"
                    )
                    .increment(1);
                    return Err(err);
                }
            };

            match self.repository.save(&mut aggregate).await {
                Ok(new_version) => {
                    return Ok(self.finish(command, aggregate, output, new_version).await);
                }
                Err(err) if err.is_conflict() && retries < self.config.conflict_retries => {
                    retries += 1;
                    tracing::info!(command, retries, "concurrency conflict, retrying");
                    metrics::counter!("command_retries_total", "command" => command).increment(1);
                }
                Err(err) => {
                    metrics::counter!(
                        "commands_executed_total",
                        "command" => command,
                        "outcome" => outcome_label(&err)
                    )
                    .increment(1);
                    return Err(err.into());
                }
            }
        }
    }

    /// Collects and publishes the events of a committed aggregate.
    async fn finish<T>(
        &self,
        command: &'static str,
        mut aggregate: A,
        output: T,
        new_version: Version,
    ) -> CommandResult<A, T> {
        let events = collect(&mut aggregate);
        let dispatch = self.dispatcher.publish(events.clone()).await;

        tracing::info!(
            command,
            %new_version,
            events = events.len(),
            handler_failures = dispatch.failures.len(),
            "command executed"
        );
        metrics::counter!(
            "commands_executed_total",
            "command" => command,
            "outcome" => "committed"
        )
        .increment(1);

        CommandResult {
            aggregate,
            output,
            events,
            new_version,
            dispatch,
        }
    }
}

fn outcome_label(err: &RepositoryError) -> &'static str {
    if err.is_conflict() {
        "conflict"
    } else {
        "failed"
    }
}
