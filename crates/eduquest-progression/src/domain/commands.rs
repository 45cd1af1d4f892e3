//! Commands for the Student Progression context.

use eduquest_core::command::Command;
use uuid::Uuid;

use super::engine::BaseReward;
use super::events::RewardSource;

/// Command to create a student's progression.
#[derive(Debug, Clone)]
pub struct EnrollStudent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student identifier (the owning account).
    pub student_id: Uuid,
    /// The student's display name.
    pub name: String,
}

impl Command for EnrollStudent {
    fn command_type(&self) -> &'static str {
        "progression.enroll_student"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a score-scaled reward.
#[derive(Debug, Clone)]
pub struct GrantReward {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student identifier.
    pub student_id: Uuid,
    /// What earned the reward.
    pub source: RewardSource,
    /// Score achieved.
    pub raw_score: f64,
    /// Maximum achievable score.
    pub max_score: f64,
    /// Reward for a perfect score.
    pub base: BaseReward,
}

impl Command for GrantReward {
    fn command_type(&self) -> &'static str {
        "progression.grant_reward"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to register a login for streak tracking.
#[derive(Debug, Clone)]
pub struct RecordLogin {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student identifier.
    pub student_id: Uuid,
}

impl Command for RecordLogin {
    fn command_type(&self) -> &'static str {
        "progression.record_login"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to overwrite a student's XP total.
#[derive(Debug, Clone)]
pub struct CorrectExperience {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The student identifier.
    pub student_id: Uuid,
    /// The corrected XP total.
    pub xp: u64,
    /// Why the correction is needed.
    pub reason: String,
}

impl Command for CorrectExperience {
    fn command_type(&self) -> &'static str {
        "progression.correct_experience"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
