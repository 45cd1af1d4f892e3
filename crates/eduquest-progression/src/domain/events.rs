//! Domain events for the Student Progression context.

use chrono::NaiveDate;
use eduquest_core::aggregate::EventDecoder;
use eduquest_core::error::DomainError;
use eduquest_core::event::{DomainEvent, EventMetadata};
use eduquest_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::engine::StreakTransition;

/// What earned a reward. A source is paid at most once per student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardSource {
    /// A graded activity submission.
    Activity {
        /// The activity that was graded.
        activity_id: Uuid,
    },
    /// A finished game session.
    GameSession {
        /// The recorded session.
        session_id: Uuid,
    },
}

/// Emitted when a student's progression is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentEnrolled {
    /// The student identifier.
    pub student_id: Uuid,
    /// The student's display name.
    pub name: String,
}

/// Emitted when a score-scaled reward is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardGranted {
    /// The student identifier.
    pub student_id: Uuid,
    /// What earned the reward.
    pub source: RewardSource,
    /// Score achieved.
    pub raw_score: f64,
    /// Maximum achievable score.
    pub max_score: f64,
    /// XP added.
    pub xp_awarded: u64,
    /// Gems added.
    pub gems_awarded: u64,
    /// Level after the reward, kept for auditing.
    pub level_after: u32,
}

/// Emitted when a login changes the streak.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakUpdated {
    /// The student identifier.
    pub student_id: Uuid,
    /// Which transition was taken.
    pub transition: StreakTransition,
    /// Streak after the update.
    pub streak: u32,
    /// Last active date after the update.
    pub last_active_date: NaiveDate,
}

/// Emitted when an administrator overwrites a student's XP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceCorrected {
    /// The student identifier.
    pub student_id: Uuid,
    /// The corrected XP total.
    pub xp: u64,
    /// Why the correction was made.
    pub reason: String,
}

/// Prefix shared by every event type of this context.
pub const PROGRESSION_EVENT_TYPE_PREFIX: &str = "progression.";

/// Event type identifier for [`StudentEnrolled`].
pub const STUDENT_ENROLLED_EVENT_TYPE: &str = "progression.student_enrolled";

/// Event type identifier for [`RewardGranted`].
pub const REWARD_GRANTED_EVENT_TYPE: &str = "progression.reward_granted";

/// Event type identifier for [`StreakUpdated`].
pub const STREAK_UPDATED_EVENT_TYPE: &str = "progression.streak_updated";

/// Event type identifier for [`ExperienceCorrected`].
pub const EXPERIENCE_CORRECTED_EVENT_TYPE: &str = "progression.experience_corrected";

/// Event payload variants for the Student Progression context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProgressEventKind {
    /// A student has been enrolled.
    StudentEnrolled(StudentEnrolled),
    /// A reward has been granted.
    RewardGranted(RewardGranted),
    /// The streak has changed.
    StreakUpdated(StreakUpdated),
    /// XP has been corrected.
    ExperienceCorrected(ExperienceCorrected),
}

impl ProgressEventKind {
    /// Event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StudentEnrolled(_) => STUDENT_ENROLLED_EVENT_TYPE,
            Self::RewardGranted(_) => REWARD_GRANTED_EVENT_TYPE,
            Self::StreakUpdated(_) => STREAK_UPDATED_EVENT_TYPE,
            Self::ExperienceCorrected(_) => EXPERIENCE_CORRECTED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Student Progression context.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ProgressEventKind,
}

impl DomainEvent for ProgressEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ProgressEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

impl EventDecoder for ProgressEvent {
    fn decode(stored: &StoredEvent) -> Result<Self, DomainError> {
        let kind = serde_json::from_value(stored.payload.clone()).map_err(|e| {
            DomainError::Infrastructure(format!("event deserialization failed: {e}"))
        })?;
        Ok(Self {
            metadata: EventMetadata::from_stored(stored),
            kind,
        })
    }
}
