//! `EventRepository` doubles for handler and route tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use eduquest_core::error::DomainError;
use eduquest_core::repository::{EventRepository, StoredEvent};
use uuid::Uuid;

/// An event repository that returns a fixed event list from every
/// `load_events` call and records every `append_events` call.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a repository that will return `load_result` from every
    /// `load_events` call.
    ///
    /// # Panics
    ///
    /// Panics if `load_result` is an `Err`; use `FailingEventRepository` for
    /// error scenarios.
    #[must_use]
    pub fn new(load_result: Result<Vec<StoredEvent>, DomainError>) -> Self {
        Self {
            load_result: Mutex::new(load_result.expect(
                "RecordingEventRepository::new does not accept Err; use FailingEventRepository",
            )),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of every `(aggregate_id, expected_version, events)`
    /// append.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for "not found" scenarios.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// An event repository that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// A working event store kept in memory, with the same optimistic
/// concurrency check as the Postgres repository. Streams span aggregates, so
/// multi-context flows can be tested end to end.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    streams: Mutex<HashMap<Uuid, Vec<StoredEvent>>>,
}

impl InMemoryEventRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of one aggregate's stream.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events_for(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.events_for(aggregate_id))
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(aggregate_id).or_default();
        let actual = stream.last().map_or(0, |event| event.sequence_number);
        if actual != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        stream.extend_from_slice(events);
        Ok(())
    }
}

/// Wraps an [`InMemoryEventRepository`] and rejects the next appends to one
/// stream with a `ConcurrencyConflict`, as if another writer had won the race.
#[derive(Debug)]
pub struct ContendedEventRepository {
    inner: InMemoryEventRepository,
    contended_stream: Uuid,
    conflicts_left: Mutex<u32>,
}

impl ContendedEventRepository {
    /// Create an empty store watching `contended_stream`. No appends fail
    /// until [`ContendedEventRepository::inject_conflicts`] is called.
    #[must_use]
    pub fn new(contended_stream: Uuid) -> Self {
        Self {
            inner: InMemoryEventRepository::new(),
            contended_stream,
            conflicts_left: Mutex::new(0),
        }
    }

    /// Makes the next `conflicts` appends to the contended stream fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn inject_conflicts(&self, conflicts: u32) {
        *self.conflicts_left.lock().unwrap() = conflicts;
    }

    /// Returns a snapshot of one aggregate's stream.
    pub fn events_for(&self, aggregate_id: Uuid) -> Vec<StoredEvent> {
        self.inner.events_for(aggregate_id)
    }

    /// Number of injected conflicts not yet triggered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn conflicts_left(&self) -> u32 {
        *self.conflicts_left.lock().unwrap()
    }
}

#[async_trait]
impl EventRepository for ContendedEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        self.inner.load_events(aggregate_id).await
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if aggregate_id == self.contended_stream {
            let mut conflicts_left = self.conflicts_left.lock().unwrap();
            if *conflicts_left > 0 {
                *conflicts_left -= 1;
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    expected: expected_version,
                    actual: expected_version + 1,
                });
            }
        }
        self.inner
            .append_events(aggregate_id, expected_version, events)
            .await
    }
}
