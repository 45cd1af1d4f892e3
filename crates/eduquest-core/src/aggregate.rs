//! Aggregate root abstraction.

use uuid::Uuid;

use crate::error::DomainError;
use crate::event::DomainEvent;
use crate::repository::StoredEvent;

/// Trait for aggregate roots that are rebuilt from their event stream.
pub trait AggregateRoot: Send + Sync {
    /// The event type this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the current version (number of events applied).
    fn version(&self) -> i64;

    /// Apply an event to mutate internal state (used during reconstitution).
    fn apply(&mut self, event: &Self::Event);

    /// Returns uncommitted events produced by command handling.
    fn uncommitted_events(&self) -> &[Self::Event];

    /// Clears uncommitted events after persistence.
    fn clear_uncommitted_events(&mut self);

    /// Converts the uncommitted events into their stored representation.
    fn pending_stored_events(&self) -> Vec<StoredEvent> {
        self.uncommitted_events()
            .iter()
            .map(StoredEvent::from_domain_event)
            .collect()
    }
}

/// Decodes a stored event back into the typed event of an aggregate.
pub trait EventDecoder: Sized {
    /// Rebuilds the typed event from its stored form.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the payload does not match
    /// the expected shape.
    fn decode(stored: &StoredEvent) -> Result<Self, DomainError>;
}

/// Applies every stored event, in order, to a fresh aggregate.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any event fails to decode.
pub fn replay<A>(mut aggregate: A, stored_events: &[StoredEvent]) -> Result<A, DomainError>
where
    A: AggregateRoot,
    A::Event: EventDecoder,
{
    for stored in stored_events {
        let event = A::Event::decode(stored)?;
        aggregate.apply(&event);
    }
    Ok(aggregate)
}
