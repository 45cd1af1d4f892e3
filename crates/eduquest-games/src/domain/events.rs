//! Domain events for the Game Sessions context.

use eduquest_core::aggregate::EventDecoder;
use eduquest_core::error::DomainError;
use eduquest_core::event::{DomainEvent, EventMetadata};
use eduquest_core::repository::StoredEvent;
use eduquest_progression::domain::engine::BaseReward;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The learning games a student can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    /// Multiple-choice quiz on any topic.
    BrainQuiz,
    /// Timed arithmetic.
    SpeedMath,
    /// Vocabulary search.
    WordHunt,
    /// History timeline game.
    HistoryTrail,
    /// Aim-and-answer game.
    AccuracyShot,
    /// Any game without its own reward table entry.
    #[serde(other)]
    Other,
}

impl GameType {
    /// Reward paid for a perfect score in this game.
    #[must_use]
    pub const fn base_reward(self) -> BaseReward {
        match self {
            Self::BrainQuiz => BaseReward { xp: 100, gems: 20 },
            Self::SpeedMath => BaseReward { xp: 60, gems: 12 },
            Self::WordHunt => BaseReward { xp: 50, gems: 10 },
            Self::HistoryTrail => BaseReward { xp: 80, gems: 16 },
            Self::AccuracyShot => BaseReward { xp: 70, gems: 14 },
            Self::Other => BaseReward { xp: 50, gems: 10 },
        }
    }
}

/// Emitted when a finished game session is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecorded {
    /// The session identifier.
    pub session_id: Uuid,
    /// The student who played.
    pub student_id: Uuid,
    /// Which game was played.
    pub game_type: GameType,
    /// Optional subject the questions were drawn from.
    pub subject: Option<String>,
    /// Points scored.
    pub score: f64,
    /// Points available.
    pub max_score: f64,
    /// Play time in seconds.
    pub duration_secs: u32,
    /// Questions the student answered.
    pub questions_answered: u32,
    /// Questions answered correctly.
    pub correct_answers: u32,
    /// Whether generated questions were used.
    pub ai_questions_used: bool,
    /// XP earned by the session.
    pub xp_earned: u64,
    /// Gems earned by the session.
    pub gems_earned: u64,
}

/// Event type identifier for [`SessionRecorded`].
pub const SESSION_RECORDED_EVENT_TYPE: &str = "games.session_recorded";

/// Event payload variants for the Game Sessions context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEventKind {
    /// A game session has been recorded.
    SessionRecorded(SessionRecorded),
}

impl GameEventKind {
    /// Event type identifier for this payload.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SessionRecorded(_) => SESSION_RECORDED_EVENT_TYPE,
        }
    }
}

/// Domain event envelope for the Game Sessions context.
#[derive(Debug, Clone)]
pub struct GameEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: GameEventKind,
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("GameEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

impl EventDecoder for GameEvent {
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
