//! Query handlers for the Game Sessions context.

use std::collections::BTreeMap;

use eduquest_core::error::DomainError;
use eduquest_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::aggregates::PlayedSession;
use crate::domain::events::GameType;

/// Maximum number of sessions returned by [`get_recent_sessions`].
pub const RECENT_SESSIONS_LIMIT: usize = 50;

/// Aggregated results for one game type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    /// The game.
    pub game_type: GameType,
    /// Sessions played.
    pub total_games: u64,
    /// XP earned across all sessions.
    pub total_xp: u64,
    /// Best score.
    pub high_score: f64,
    /// Mean score.
    pub average_score: f64,
}

/// Returns a student's most recent sessions, newest first.
///
/// A student who never played has an empty history.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
pub async fn get_recent_sessions(
    student_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<PlayedSession>, DomainError> {
    let history = command_handlers::load(student_id, repo).await?;
    Ok(history
        .sessions
        .into_iter()
        .rev()
        .take(RECENT_SESSIONS_LIMIT)
        .collect())
}

/// Returns per-game statistics for a student, ordered by game type.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if loading or deserialization fails.
#[allow(clippy::cast_precision_loss)]
pub async fn get_game_stats(
    student_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Vec<GameStats>, DomainError> {
    let history = command_handlers::load(student_id, repo).await?;

    let mut by_game: BTreeMap<GameType, (GameStats, f64)> = BTreeMap::new();
    for session in history.sessions() {
        let (stats, score_sum) = by_game.entry(session.game_type).or_insert((
            GameStats {
                game_type: session.game_type,
                total_games: 0,
                total_xp: 0,
                high_score: f64::MIN,
                average_score: 0.0,
            },
            0.0,
        ));
        stats.total_games += 1;
        stats.total_xp += session.xp_earned;
        stats.high_score = stats.high_score.max(session.score);
        *score_sum += session.score;
    }

    Ok(by_game
        .into_values()
        .map(|(mut stats, score_sum)| {
            stats.average_score = score_sum / stats.total_games as f64;
            stats
        })
        .collect())
}
