//! Shared test doubles for the EduQuest backend.

mod clock;
mod repository;

pub use clock::FixedClock;
pub use repository::{
    ContendedEventRepository, EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    RecordingEventRepository,
};
