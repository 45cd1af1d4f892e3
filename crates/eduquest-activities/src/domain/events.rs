//! Domain events for the Activities & Grading context.

use chrono::{DateTime, Utc};
use eduquest_core::aggregate::EventDecoder;
use eduquest_core::error::DomainError;
use eduquest_core::event::{DomainEvent, EventMetadata};
use eduquest_core::repository::StoredEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of work an activity asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    /// Homework-style assignment.
    #[default]
    Assignment,
    /// Scored quiz.
    Quiz,
    /// Longer project.
    Project,
    /// Written essay.
    Essay,
    /// Lab experiment.
    Experiment,
}

/// Whether work arrived before the due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionTiming {
    /// Submitted on or before the due date.
    OnTime,
    /// Submitted after the due date.
    Late,
}

/// A teacher's decision on a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    /// Accepted; the score earns a reward.
    Verified,
    /// Not accepted; no reward.
    Rejected,
}

/// Emitted when a teacher publishes an activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityCreated {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The authoring teacher.
    pub teacher_id: Uuid,
    /// Title shown to students.
    pub title: String,
    /// Instructions.
    pub description: String,
    /// School subject.
    pub subject: String,
    /// Kind of work.
    pub kind: ActivityKind,
    /// Deadline; later submissions are marked late.
    pub due_date: DateTime<Utc>,
    /// Score that earns the full reward.
    pub max_score: f64,
    /// XP for a full score.
    pub xp_reward: u32,
    /// Gems for a full score.
    pub gem_reward: u32,
}

/// Emitted when a teacher edits an activity. Carries the full set of
/// editable details after the edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityUpdated {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// Title shown to students.
    pub title: String,
    /// Instructions.
    pub description: String,
    /// School subject.
    pub subject: String,
    /// Kind of work.
    pub kind: ActivityKind,
    /// Deadline; later submissions are marked late.
    pub due_date: DateTime<Utc>,
    /// Score that earns the full reward.
    pub max_score: f64,
    /// XP for a full score.
    pub xp_reward: u32,
    /// Gems for a full score.
    pub gem_reward: u32,
}

/// Emitted when a teacher withdraws an activity. No further work is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDeactivated {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// Why the activity was withdrawn, possibly empty.
    pub reason: String,
}

/// Emitted when a student submits (or resubmits) work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkSubmitted {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The submitting student.
    pub student_id: Uuid,
    /// Submitted answer text.
    pub text: String,
    /// Whether the deadline was met.
    pub timing: SubmissionTiming,
}

/// Emitted when a teacher verifies or rejects a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReviewed {
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The student whose work was reviewed.
    pub student_id: Uuid,
    /// Awarded score.
    pub score: f64,
    /// Teacher feedback, possibly empty.
    pub feedback: String,
    /// The decision.
    pub outcome: ReviewOutcome,
    /// XP paid out; zero when rejected.
    pub xp_awarded: u64,
    /// Gems paid out; zero when rejected.
    pub gems_awarded: u64,
}

/// Prefix shared by every event type of this context.
pub const ACTIVITY_EVENT_TYPE_PREFIX: &str = "activities.";

/// Event type identifier for [`ActivityCreated`].
pub const ACTIVITY_CREATED_EVENT_TYPE: &str = "activities.activity_created";

/// Event type identifier for [`ActivityUpdated`].
pub const ACTIVITY_UPDATED_EVENT_TYPE: &str = "activities.activity_updated";

/// Event type identifier for [`ActivityDeactivated`].
pub const ACTIVITY_DEACTIVATED_EVENT_TYPE: &str = "activities.activity_deactivated";

/// Event type identifier for [`WorkSubmitted`].
pub const WORK_SUBMITTED_EVENT_TYPE: &str = "activities.work_submitted";

/// Event type identifier for [`SubmissionReviewed`].
pub const SUBMISSION_REVIEWED_EVENT_TYPE: &str = "activities.submission_reviewed";

/// Event payload variants for the Activities & Grading context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActivityEventKind {
    /// An activity has been created.
    ActivityCreated(ActivityCreated),
    /// An activity has been edited.
    ActivityUpdated(ActivityUpdated),
    /// An activity has been withdrawn.
    ActivityDeactivated(ActivityDeactivated),
    /// Work has been submitted.
    WorkSubmitted(WorkSubmitted),
    /// A submission has been reviewed.
    SubmissionReviewed(SubmissionReviewed),
}

impl ActivityEventKind {
    /// Event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ActivityCreated(_) => ACTIVITY_CREATED_EVENT_TYPE,
            Self::ActivityUpdated(_) => ACTIVITY_UPDATED_EVENT_TYPE,
            Self::ActivityDeactivated(_) => ACTIVITY_DEACTIVATED_EVENT_TYPE,
            Self::WorkSubmitted(_) => WORK_SUBMITTED_EVENT_TYPE,
            Self::SubmissionReviewed(_) => SUBMISSION_REVIEWED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Activities & Grading context.
#[derive(Debug, Clone)]
pub struct ActivityEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ActivityEventKind,
}

impl DomainEvent for ActivityEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("ActivityEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

impl EventDecoder for ActivityEvent {
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
