//! Aggregate roots for the Game Sessions context.

use chrono::{DateTime, Utc};
use eduquest_core::aggregate::AggregateRoot;
use eduquest_core::clock::Clock;
use eduquest_core::error::DomainError;
use eduquest_core::event::EventMetadata;
use eduquest_progression::domain::engine;
use serde::Serialize;
use uuid::Uuid;

use super::events::{GameEvent, GameEventKind, GameType, SessionRecorded};

/// Namespace for deriving game history stream IDs from student IDs.
const GAME_HISTORY_NAMESPACE: Uuid = Uuid::from_u128(0x5c0f_3a8e_91d2_4b7a_a6e4_2f19_8c0d_7e31);

/// Raw results of one finished game, as reported by the client.
#[derive(Debug, Clone)]
pub struct GamePlay {
    /// The session identifier.
    pub session_id: Uuid,
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

/// A recorded game session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayedSession {
    /// The session identifier.
    pub session_id: Uuid,
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
    /// XP earned.
    pub xp_earned: u64,
    /// Gems earned.
    pub gems_earned: u64,
    /// When the session was recorded.
    pub completed_at: DateTime<Utc>,
}

/// The aggregate root holding every game session of one student.
#[derive(Debug)]
pub struct GameHistory {
    /// Stream identifier, derived from `student_id`.
    pub id: Uuid,
    /// The student who owns the history.
    pub student_id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Sessions in recording order.
    pub(crate) sessions: Vec<PlayedSession>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<GameEvent>,
}

impl GameHistory {
    /// Creates an empty history for a student.
    #[must_use]
    pub fn new(student_id: Uuid) -> Self {
        Self {
            id: Self::stream_id(student_id),
            student_id,
            version: 0,
            sessions: Vec::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Event stream identifier for a student's game history.
    #[must_use]
    pub fn stream_id(student_id: Uuid) -> Uuid {
        Uuid::new_v5(&GAME_HISTORY_NAMESPACE, student_id.as_bytes())
    }

    /// Sessions in recording order.
    #[must_use]
    pub fn sessions(&self) -> &[PlayedSession] {
        &self.sessions
    }

    /// Looks up a recorded session.
    #[must_use]
    pub fn session(&self, session_id: Uuid) -> Option<&PlayedSession> {
        self.sessions.iter().find(|s| s.session_id == session_id)
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn mutate(&mut self, kind: &GameEventKind, occurred_at: DateTime<Utc>) {
        match kind {
            GameEventKind::SessionRecorded(payload) => self.sessions.push(PlayedSession {
                session_id: payload.session_id,
                game_type: payload.game_type,
                subject: payload.subject.clone(),
                score: payload.score,
                max_score: payload.max_score,
                duration_secs: payload.duration_secs,
                questions_answered: payload.questions_answered,
                correct_answers: payload.correct_answers,
                ai_questions_used: payload.ai_questions_used,
                xp_earned: payload.xp_earned,
                gems_earned: payload.gems_earned,
                completed_at: occurred_at,
            }),
        }
    }

    /// Records a finished game, producing a `SessionRecorded` event. The
    /// game's base reward is scaled by `score / max_score`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the session was already recorded,
    /// the scores are not finite, the score is negative, or more answers are
    /// correct than were answered.
    pub fn record_session(
        &mut self,
        play: GamePlay,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<PlayedSession, DomainError> {
        if self.session(play.session_id).is_some() {
            return Err(DomainError::Validation(format!(
                "game session {} already recorded",
                play.session_id
            )));
        }
        if !play.score.is_finite() || play.score < 0.0 || !play.max_score.is_finite() {
            return Err(DomainError::Validation(
                "scores must be finite and non-negative".into(),
            ));
        }
        if play.correct_answers > play.questions_answered {
            return Err(DomainError::Validation(
                "correct answers cannot exceed questions answered".into(),
            ));
        }

        let base = play.game_type.base_reward();
        let ratio = engine::reward_ratio(play.score, play.max_score);
        let kind = GameEventKind::SessionRecorded(SessionRecorded {
            session_id: play.session_id,
            student_id: self.student_id,
            game_type: play.game_type,
            subject: play.subject,
            score: play.score,
            max_score: play.max_score,
            duration_secs: play.duration_secs,
            questions_answered: play.questions_answered,
            correct_answers: play.correct_answers,
            ai_questions_used: play.ai_questions_used,
            xp_earned: engine::scale_reward(base.xp, ratio),
            gems_earned: engine::scale_reward(base.gems, ratio),
        });

        let metadata = EventMetadata::new(
            kind.event_type(),
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.mutate(&kind, metadata.occurred_at);
        self.uncommitted_events.push(GameEvent { metadata, kind });

        // mutate() just pushed the session.
        self.sessions
            .last()
            .cloned()
            .ok_or_else(|| DomainError::Infrastructure("session was not recorded".into()))
    }
}

impl AggregateRoot for GameHistory {
    type Event = GameEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        self.mutate(&event.kind, event.metadata.occurred_at);
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
