//! Commands for the Activities & Grading context.

use chrono::{DateTime, Utc};
use eduquest_core::command::Command;
use uuid::Uuid;

use super::aggregates::ActivityChanges;
use super::events::{ActivityKind, ReviewOutcome};

/// Maximum score used when a teacher does not set one.
pub const DEFAULT_MAX_SCORE: f64 = 100.0;

/// Full-score XP used when a teacher does not set one.
pub const DEFAULT_XP_REWARD: u32 = 50;

/// Full-score gems used when a teacher does not set one.
pub const DEFAULT_GEM_REWARD: u32 = 10;

/// Command to publish a new activity.
#[derive(Debug, Clone)]
pub struct CreateActivity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
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
    /// Deadline.
    pub due_date: DateTime<Utc>,
    /// Score that earns the full reward.
    pub max_score: f64,
    /// XP for a full score.
    pub xp_reward: u32,
    /// Gems for a full score.
    pub gem_reward: u32,
}

impl Command for CreateActivity {
    fn command_type(&self) -> &'static str {
        "activities.create_activity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to edit an activity.
#[derive(Debug, Clone)]
pub struct UpdateActivity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The activity identifier.
    pub activity_id: Uuid,
    /// Fields to change.
    pub changes: ActivityChanges,
}

impl Command for UpdateActivity {
    fn command_type(&self) -> &'static str {
        "activities.update_activity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to withdraw an activity.
#[derive(Debug, Clone)]
pub struct DeactivateActivity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The activity identifier.
    pub activity_id: Uuid,
    /// Why the activity is withdrawn.
    pub reason: String,
}

impl Command for DeactivateActivity {
    fn command_type(&self) -> &'static str {
        "activities.deactivate_activity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to hand in work for an activity.
#[derive(Debug, Clone)]
pub struct SubmitActivity {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The submitting student.
    pub student_id: Uuid,
    /// Answer text.
    pub text: String,
}

impl Command for SubmitActivity {
    fn command_type(&self) -> &'static str {
        "activities.submit_activity"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to verify or reject a student's submission.
#[derive(Debug, Clone)]
pub struct VerifySubmission {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The activity identifier.
    pub activity_id: Uuid,
    /// The student whose work is graded.
    pub student_id: Uuid,
    /// Awarded score.
    pub score: f64,
    /// Teacher feedback.
    pub feedback: String,
    /// The decision.
    pub outcome: ReviewOutcome,
}

impl Command for VerifySubmission {
    fn command_type(&self) -> &'static str {
        "activities.verify_submission"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
