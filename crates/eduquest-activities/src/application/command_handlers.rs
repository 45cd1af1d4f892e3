//! Command handlers for the Activities & Grading context.
//!
//! Verification spans two aggregates: the review is appended to the
//! activity stream first, then the reward is granted to the student's
//! progression stream.

use eduquest_core::aggregate::{AggregateRoot, replay};
use eduquest_core::clock::Clock;
use eduquest_core::command::Command;
use eduquest_core::error::DomainError;
use eduquest_core::repository::{EventRepository, StoredEvent};
use eduquest_progression::application::{command_handlers as progression, query_handlers};
use eduquest_progression::domain::commands::GrantReward;
use eduquest_progression::domain::engine::{BaseReward, ProgressionState};
use eduquest_progression::domain::events::RewardSource;
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{Activity, SubmissionStatus};
use crate::domain::commands::{
    CreateActivity, DeactivateActivity, SubmitActivity, UpdateActivity, VerifySubmission,
};
use crate::domain::events::{ACTIVITY_EVENT_TYPE_PREFIX, ReviewOutcome};

/// Result of a successful `SubmitActivity`.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// Events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
    /// `Submitted` or `Late`.
    pub status: SubmissionStatus,
}

/// Result of a successful `VerifySubmission`.
#[derive(Debug, Clone)]
pub struct VerificationReceipt {
    /// Activity events followed by progression events.
    pub stored_events: Vec<StoredEvent>,
    /// XP paid to the student.
    pub xp_awarded: u64,
    /// Gems paid to the student.
    pub gems_awarded: u64,
    /// The student's progression after the reward; `None` when rejected.
    pub progression: Option<ProgressionState>,
}

/// Reconstitutes an `Activity` from stored events.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the stream belongs to another
/// context, or `DomainError::Infrastructure` if event deserialization fails.
pub(crate) fn reconstitute(
    activity_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Activity, DomainError> {
    if belongs_elsewhere(existing_events) {
        return Err(DomainError::AggregateNotFound(activity_id));
    }
    replay(Activity::new(activity_id), existing_events)
}

/// Whether a stream holds events of another context, which happens when an
/// identifier is reused across aggregates.
fn belongs_elsewhere(existing_events: &[StoredEvent]) -> bool {
    existing_events
        .iter()
        .any(|e| !e.event_type.starts_with(ACTIVITY_EVENT_TYPE_PREFIX))
}

async fn load(activity_id: Uuid, repo: &dyn EventRepository) -> Result<Activity, DomainError> {
    let existing_events = repo.load_events(activity_id).await?;
    reconstitute(activity_id, &existing_events)
}

async fn persist(
    activity: &Activity,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let stored_events = activity.pending_stored_events();
    repo.append_events(activity.id, activity.version(), &stored_events)
        .await?;
    Ok(stored_events)
}

/// Handles the `CreateActivity` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the title is blank, the activity
/// already exists, the identifier belongs to another stream or the max score
/// is not finite, or any error from the repository.
pub async fn handle_create_activity(
    command: &CreateActivity,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    if command.title.trim().is_empty() {
        return Err(DomainError::Validation(
            "activity title must not be empty".into(),
        ));
    }

    let existing_events = repo.load_events(command.activity_id).await?;
    if belongs_elsewhere(&existing_events) {
        return Err(DomainError::Validation(format!(
            "identifier {} is already in use",
            command.activity_id
        )));
    }
    let mut activity = reconstitute(command.activity_id, &existing_events)?;
    activity.create(
        command.teacher_id,
        command.title.trim().to_owned(),
        command.description.clone(),
        command.subject.clone(),
        command.kind,
        command.due_date,
        command.max_score,
        BaseReward {
            xp: command.xp_reward,
            gems: command.gem_reward,
        },
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&activity, repo).await?;
    info!(
        command = command.command_type(),
        activity_id = %command.activity_id,
        teacher_id = %command.teacher_id,
        "activity created"
    );
    Ok(stored_events)
}

/// Handles the `UpdateActivity` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the activity does not exist,
/// `DomainError::Validation` if it is inactive or the changes are invalid,
/// or any error from the repository.
pub async fn handle_update_activity(
    command: &UpdateActivity,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut activity = load(command.activity_id, repo).await?;
    activity.update(command.changes.clone(), command.correlation_id, clock)?;

    let stored_events = persist(&activity, repo).await?;
    info!(
        command = command.command_type(),
        activity_id = %command.activity_id,
        "activity updated"
    );
    Ok(stored_events)
}

/// Handles the `DeactivateActivity` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the activity does not exist,
/// `DomainError::Validation` if it is already inactive, or any error from the
/// repository.
pub async fn handle_deactivate_activity(
    command: &DeactivateActivity,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<Vec<StoredEvent>, DomainError> {
    let mut activity = load(command.activity_id, repo).await?;
    activity.deactivate(command.reason.trim().to_owned(), command.correlation_id, clock)?;

    let stored_events = persist(&activity, repo).await?;
    info!(
        command = command.command_type(),
        activity_id = %command.activity_id,
        reason = %command.reason,
        "activity deactivated"
    );
    Ok(stored_events)
}

/// Handles the `SubmitActivity` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the activity does not exist,
/// `DomainError::Validation` if the text is blank or the work was already
/// verified, or any error from the repository.
pub async fn handle_submit_activity(
    command: &SubmitActivity,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SubmissionReceipt, DomainError> {
    if command.text.trim().is_empty() {
        return Err(DomainError::Validation(
            "submission text must not be empty".into(),
        ));
    }

    let mut activity = load(command.activity_id, repo).await?;
    let status = activity.submit(
        command.student_id,
        command.text.clone(),
        command.correlation_id,
        clock,
    )?;

    let stored_events = persist(&activity, repo).await?;
    info!(
        command = command.command_type(),
        activity_id = %command.activity_id,
        student_id = %command.student_id,
        ?status,
        "work submitted"
    );
    Ok(SubmissionReceipt {
        stored_events,
        status,
    })
}

/// Handles the `VerifySubmission` command: records the review and, when the
/// submission is verified, grants the score-scaled reward.
///
/// Verifying work that is already verified records nothing new and settles
/// the recorded reward instead; the grant is paid once per activity, so a
/// caller whose first attempt failed after the review was stored can retry.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the activity does not exist
/// or a verified student is not enrolled, `DomainError::Validation` if there
/// is no pending submission or the score is invalid, or any error from the
/// repository.
pub async fn handle_verify_submission(
    command: &VerifySubmission,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VerificationReceipt, DomainError> {
    let mut activity = load(command.activity_id, repo).await?;

    let settled = match command.outcome {
        ReviewOutcome::Verified => activity.verified_reward(command.student_id),
        ReviewOutcome::Rejected => None,
    };
    let (mut stored_events, graded) = if let Some(graded) = settled {
        info!(
            command = command.command_type(),
            activity_id = %command.activity_id,
            student_id = %command.student_id,
            "submission already verified, settling recorded reward"
        );
        (Vec::new(), Some(graded))
    } else {
        let graded = activity.review(
            command.student_id,
            command.score,
            command.feedback.clone(),
            command.outcome,
            command.correlation_id,
            clock,
        )?;

        if graded.is_some() {
            // Fail before the review is stored if the reward cannot be paid.
            query_handlers::get_progress_by_id(command.student_id, repo).await?;
        }

        let stored_events = persist(&activity, repo).await?;
        info!(
            command = command.command_type(),
            activity_id = %command.activity_id,
            student_id = %command.student_id,
            outcome = ?command.outcome,
            "submission reviewed"
        );
        (stored_events, graded)
    };

    let Some(graded) = graded else {
        return Ok(VerificationReceipt {
            stored_events,
            xp_awarded: 0,
            gems_awarded: 0,
            progression: None,
        });
    };

    let grant = GrantReward {
        correlation_id: command.correlation_id,
        student_id: command.student_id,
        source: RewardSource::Activity {
            activity_id: command.activity_id,
        },
        raw_score: graded.score,
        max_score: graded.max_score,
        base: graded.base,
    };
    let receipt = progression::handle_grant_reward(&grant, clock, repo).await?;
    stored_events.extend(receipt.stored_events);

    Ok(VerificationReceipt {
        stored_events,
        xp_awarded: receipt.xp_awarded,
        gems_awarded: receipt.gems_awarded,
        progression: Some(receipt.state),
    })
}
