//! Command handlers for the Student Progression context.
//!
//! Each handler loads the `StudentProgress` aggregate, runs one domain
//! method and appends the resulting events with optimistic concurrency.

use eduquest_core::aggregate::{AggregateRoot, replay};
use eduquest_core::clock::Clock;
use eduquest_core::command::Command;
use eduquest_core::error::DomainError;
use eduquest_core::repository::{EventRepository, StoredEvent};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::aggregates::StudentProgress;
use crate::domain::commands::{CorrectExperience, EnrollStudent, GrantReward, RecordLogin};
use crate::domain::engine::ProgressionState;
use crate::domain::events::PROGRESSION_EVENT_TYPE_PREFIX;

/// How many appends `handle_grant_reward` attempts before it returns a
/// concurrency conflict.
pub const GRANT_REWARD_ATTEMPTS: u32 = 3;

/// Result of a successful `GrantReward`.
#[derive(Debug, Clone)]
pub struct RewardReceipt {
    /// Events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
    /// XP added by the reward.
    pub xp_awarded: u64,
    /// Gems added by the reward.
    pub gems_awarded: u64,
    /// Progression after the reward.
    pub state: ProgressionState,
}

/// Result of a command that changes progression without an award.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Events produced and persisted; empty when nothing changed.
    pub stored_events: Vec<StoredEvent>,
    /// Progression after the command.
    pub state: ProgressionState,
}

/// Reconstitutes a `StudentProgress` from stored events.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream belongs to another
/// context, or `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    student_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<StudentProgress, DomainError> {
    if belongs_elsewhere(existing_events) {
        return Err(DomainError::AggregateNotFound(student_id));
    }
    replay(StudentProgress::new(student_id), existing_events)
}

/// Whether a stream holds events of another context, which happens when an
/// identifier is reused across aggregates.
fn belongs_elsewhere(existing_events: &[StoredEvent]) -> bool {
    existing_events
        .iter()
        .any(|e| !e.event_type.starts_with(PROGRESSION_EVENT_TYPE_PREFIX))
}

async fn load(
    student_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<StudentProgress, DomainError> {
    let existing_events = repo.load_events(student_id).await?;
    reconstitute(student_id, &existing_events)
}

async fn persist(
    progress: &StudentProgress,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events = progress.pending_stored_events();
    if !stored_events.is_empty() {
        repo.append_events(progress.id, progress.version(), &stored_events)
            .await?;
    }
    Ok(stored_events)
}

/// Handles the `EnrollStudent` command: creates a zeroed progression for the
/// student.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the name is blank, the student is
/// already enrolled or the identifier belongs to another stream, or any error
/// from the repository.
pub async fn handle_enroll_student(
    command: &EnrollStudent,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    if command.name.trim().is_empty() {
        return Err(DomainError::Validation(
            "student name must not be empty".into(),
        ));
    }

    let existing_events = repo.load_events(command.student_id).await?;
    if belongs_elsewhere(&existing_events) {
        return Err(DomainError::Validation(format!(
            "identifier {} is already in use",
            command.student_id
        )));
    }
    let mut progress = reconstitute(command.student_id, &existing_events)?;
    progress.enroll(command.name.trim().to_owned(), command.correlation_id, clock)?;

    let stored_events = persist(&progress, repo).await?;
    info!(
        command = command.command_type(),
        student_id = %command.student_id,
        "student enrolled"
    );
    Ok(stored_events)
}

/// Handles the `GrantReward` command: scales the base reward by the score
/// ratio, adds it and recomputes the level.
///
/// Rewards are additive and paid once per source, so a lost append race is
/// retried against the reloaded stream, up to [`GRANT_REWARD_ATTEMPTS`]
/// times.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the student is not enrolled,
/// `DomainError::Validation` for an invalid score,
/// `DomainError::ConcurrencyConflict` if every attempt lost a race, or any
/// other error from the repository.
pub async fn handle_grant_reward(
    command: &GrantReward,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RewardReceipt, DomainError> {
    let mut attempt = 1;
    loop {
        match grant_reward_once(command, clock, repo).await {
            Err(DomainError::ConcurrencyConflict { expected, actual, .. })
                if attempt < GRANT_REWARD_ATTEMPTS =>
            {
                warn!(
                    student_id = %command.student_id,
                    attempt,
                    expected,
                    actual,
                    "reward grant lost an append race, retrying"
                );
                attempt += 1;
            }
            result => return result,
        }
    }
}

async fn grant_reward_once(
    command: &GrantReward,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<RewardReceipt, DomainError> {
    let mut progress = load(command.student_id, repo).await?;
    let level_before = progress.state().level;

    let outcome = progress.grant_reward(
        command.source,
        command.raw_score,
        command.max_score,
        command.base,
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&progress, repo).await?;
    if stored_events.is_empty() {
        debug!(
            command = command.command_type(),
            student_id = %command.student_id,
            source = ?command.source,
            "reward source already paid"
        );
    } else {
        info!(
            command = command.command_type(),
            student_id = %command.student_id,
            xp_awarded = outcome.xp_awarded,
            gems_awarded = outcome.gems_awarded,
            "reward granted"
        );
    }
    if outcome.state.level > level_before {
        info!(
            student_id = %command.student_id,
            from = level_before,
            to = outcome.state.level,
            "student levelled up"
        );
    }

    Ok(RewardReceipt {
        stored_events,
        xp_awarded: outcome.xp_awarded,
        gems_awarded: outcome.gems_awarded,
        state: outcome.state,
    })
}

/// Handles the `RecordLogin` command: updates the daily streak for the
/// clock's current date.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the student is not enrolled,
/// or any error from the repository.
pub async fn handle_record_login(
    command: &RecordLogin,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProgressUpdate, DomainError> {
    let mut progress = load(command.student_id, repo).await?;
    let state = progress.record_login(command.correlation_id, clock)?;

    let stored_events = persist(&progress, repo).await?;
    debug!(
        command = command.command_type(),
        student_id = %command.student_id,
        streak = state.streak,
        changed = !stored_events.is_empty(),
        "login recorded"
    );

    Ok(ProgressUpdate {
        stored_events,
        state,
    })
}

/// Handles the `CorrectExperience` command: overwrites the XP total and
/// recomputes the level.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the student is not enrolled,
/// `DomainError::Validation` for a blank reason, or any error from the
/// repository.
pub async fn handle_correct_experience(
    command: &CorrectExperience,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<ProgressUpdate, DomainError> {
    let mut progress = load(command.student_id, repo).await?;
    let state = progress.correct_experience(
        command.xp,
        command.reason.clone(),
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&progress, repo).await?;
    info!(
        command = command.command_type(),
        student_id = %command.student_id,
        xp = state.xp,
        reason = %command.reason,
        "experience corrected"
    );

    Ok(ProgressUpdate {
        stored_events,
        state,
    })
}
