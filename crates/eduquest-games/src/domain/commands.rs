//! Commands for the Game Sessions context.

use eduquest_core::command::Command;
use uuid::Uuid;

use super::events::GameType;

/// Command to record a finished game session and pay its reward.
#[derive(Debug, Clone)]
pub struct RecordGameSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Client-chosen session identifier. Resending a command with the same
    /// identifier records the session once and pays it once.
    pub session_id: Option<Uuid>,
    /// The student who played.
    pub student_id: Uuid,
    /// Which game was played.
    pub game_type: GameType,
    /// Optional subject.
    pub subject: Option<String>,
    /// Points scored.
    pub score: f64,
    /// Points available.
    pub max_score: f64,
    /// Play time in seconds.
    pub duration_secs: u32,
    /// Questions answered.
    pub questions_answered: u32,
    /// Questions answered correctly.
    pub correct_answers: u32,
    /// Whether generated questions were used.
    pub ai_questions_used: bool,
}

impl Command for RecordGameSession {
    fn command_type(&self) -> &'static str {
        "games.record_game_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
