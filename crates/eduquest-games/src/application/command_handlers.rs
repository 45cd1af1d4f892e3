//! Command handlers for the Game Sessions context.

use eduquest_core::aggregate::{AggregateRoot, replay};
use eduquest_core::clock::Clock;
use eduquest_core::command::Command;
use eduquest_core::error::DomainError;
use eduquest_core::repository::{EventRepository, StoredEvent};
use eduquest_progression::application::{command_handlers as progression, query_handlers};
use eduquest_progression::domain::commands::GrantReward;
use eduquest_progression::domain::events::RewardSource;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{GameHistory, GamePlay};
use crate::domain::commands::RecordGameSession;

/// Result of a successful `RecordGameSession`.
#[derive(Debug, Clone)]
pub struct GameSessionReceipt {
    /// The session's identifier.
    pub session_id: Uuid,
    /// Game history events followed by progression events.
    pub stored_events: Vec<StoredEvent>,
    /// XP earned by the session.
    pub xp_earned: u64,
    /// Gems earned by the session.
    pub gems_earned: u64,
    /// The student's total XP afterwards.
    pub new_xp: u64,
    /// The student's level afterwards.
    pub new_level: u32,
}

/// Reconstitutes a student's `GameHistory` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    student_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<GameHistory, DomainError> {
    replay(GameHistory::new(student_id), existing_events)
}

pub(crate) async fn load(
    student_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<GameHistory, DomainError> {
    let existing_events = repo.load_events(GameHistory::stream_id(student_id)).await?;
    reconstitute(student_id, &existing_events)
}

/// Handles the `RecordGameSession` command: appends the session to the
/// student's game history, then grants the earned reward.
///
/// A command carrying the identifier of a session that is already recorded
/// appends nothing and settles that session's reward instead; the grant is
/// paid once per session.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the student is not enrolled,
/// `DomainError::Validation` if the results are invalid, or any error from
/// the repository.
pub async fn handle_record_game_session(
    command: &RecordGameSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<GameSessionReceipt, DomainError> {
    // Fail before the session is stored if the reward cannot be paid.
    query_handlers::get_progress_by_id(command.student_id, repo).await?;

    let session_id = command.session_id.unwrap_or_else(Uuid::new_v4);
    let mut history = load(command.student_id, repo).await?;
    let (mut stored_events, session) = if let Some(session) = history.session(session_id) {
        info!(
            command = command.command_type(),
            student_id = %command.student_id,
            %session_id,
            "game session already recorded, settling its reward"
        );
        (Vec::new(), session.clone())
    } else {
        let session = history.record_session(
            GamePlay {
                session_id,
                game_type: command.game_type,
                subject: command.subject.clone(),
                score: command.score,
                max_score: command.max_score,
                duration_secs: command.duration_secs,
                questions_answered: command.questions_answered,
                correct_answers: command.correct_answers,
                ai_questions_used: command.ai_questions_used,
            },
            command.correlation_id,
            clock,
        )?;

        let stored_events = history.pending_stored_events();
        repo.append_events(history.id, history.version(), &stored_events)
            .await?;
        info!(
            command = command.command_type(),
            student_id = %command.student_id,
            %session_id,
            game_type = ?command.game_type,
            xp_earned = session.xp_earned,
            "game session recorded"
        );
        (stored_events, session)
    };

    let grant = GrantReward {
        correlation_id: command.correlation_id,
        student_id: command.student_id,
        source: RewardSource::GameSession { session_id },
        raw_score: session.score,
        max_score: session.max_score,
        base: session.game_type.base_reward(),
    };
    let receipt = progression::handle_grant_reward(&grant, clock, repo).await?;
    stored_events.extend(receipt.stored_events);

    Ok(GameSessionReceipt {
        session_id,
        stored_events,
        xp_earned: receipt.xp_awarded,
        gems_earned: receipt.gems_awarded,
        new_xp: receipt.state.xp,
        new_level: receipt.state.level,
    })
}
