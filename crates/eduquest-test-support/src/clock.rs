//! Deterministic `Clock` implementation for tests.

use chrono::{DateTime, Utc};
use eduquest_core::clock::Clock;

/// A clock frozen at one instant; its `today()` is that instant's UTC date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
