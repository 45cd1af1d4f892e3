//! Shared application state.

use std::sync::Arc;

use eduquest_core::clock::Clock;
use eduquest_core::repository::EventRepository;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Time source for event timestamps, deadlines and streaks.
    pub clock: Arc<dyn Clock>,
    /// Event store shared by every bounded context.
    pub event_repository: Arc<dyn EventRepository>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, event_repository: Arc<dyn EventRepository>) -> Self {
        Self {
            clock,
            event_repository,
        }
    }
}
