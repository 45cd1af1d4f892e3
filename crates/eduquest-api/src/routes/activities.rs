//! Routes for the Activities & Grading bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use eduquest_activities::application::{command_handlers, query_handlers};
use eduquest_activities::domain::aggregates::{ActivityChanges, SubmissionStatus};
use eduquest_activities::domain::commands::{
    self, DEFAULT_GEM_REWARD, DEFAULT_MAX_SCORE, DEFAULT_XP_REWARD,
};
use eduquest_activities::domain::events::{ActivityKind, ReviewOutcome};
use eduquest_progression::domain::engine::ProgressionState;

use crate::error::ApiError;
use crate::state::AppState;

fn default_max_score() -> f64 {
    DEFAULT_MAX_SCORE
}

fn default_xp_reward() -> u32 {
    DEFAULT_XP_REWARD
}

fn default_gem_reward() -> u32 {
    DEFAULT_GEM_REWARD
}

/// Request body for POST /create.
#[derive(Debug, Deserialize)]
pub struct CreateActivityRequest {
    /// Activity identifier; generated when omitted.
    pub activity_id: Option<Uuid>,
    /// The authoring teacher.
    pub teacher_id: Uuid,
    /// Title shown to students.
    pub title: String,
    /// Instructions.
    #[serde(default)]
    pub description: String,
    /// School subject.
    pub subject: String,
    /// Kind of work.
    #[serde(default)]
    pub kind: ActivityKind,
    /// Deadline.
    pub due_date: DateTime<Utc>,
    /// Score that earns the full reward.
    #[serde(default = "default_max_score")]
    pub max_score: f64,
    /// XP for a full score.
    #[serde(default = "default_xp_reward")]
    pub xp_reward: u32,
    /// Gems for a full score.
    #[serde(default = "default_gem_reward")]
    pub gem_reward: u32,
}

/// Request body for POST /update. Omitted fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateActivityRequest {
    /// The activity.
    pub activity_id: Uuid,
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New instructions.
    #[serde(default)]
    pub description: Option<String>,
    /// New subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// New kind of work.
    #[serde(default)]
    pub kind: Option<ActivityKind>,
    /// New deadline.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// New maximum score.
    #[serde(default)]
    pub max_score: Option<f64>,
    /// New full-score XP.
    #[serde(default)]
    pub xp_reward: Option<u32>,
    /// New full-score gems.
    #[serde(default)]
    pub gem_reward: Option<u32>,
}

/// Request body for POST /deactivate.
#[derive(Debug, Deserialize)]
pub struct DeactivateActivityRequest {
    /// The activity.
    pub activity_id: Uuid,
    /// Why the activity is withdrawn.
    #[serde(default)]
    pub reason: String,
}

/// Request body for POST /submit.
#[derive(Debug, Deserialize)]
pub struct SubmitActivityRequest {
    /// The activity.
    pub activity_id: Uuid,
    /// The submitting student.
    pub student_id: Uuid,
    /// Answer text.
    pub text: String,
}

/// Request body for POST /verify.
#[derive(Debug, Deserialize)]
pub struct VerifySubmissionRequest {
    /// The activity.
    pub activity_id: Uuid,
    /// The student whose work is graded.
    pub student_id: Uuid,
    /// Awarded score.
    pub score: f64,
    /// Teacher feedback.
    #[serde(default)]
    pub feedback: String,
    /// The decision.
    pub outcome: ReviewOutcome,
}

/// Response body for POST /create.
#[derive(Debug, Serialize)]
pub struct CreateActivityResponse {
    /// The new activity's identifier.
    pub activity_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body for POST /update and POST /deactivate.
#[derive(Debug, Serialize)]
pub struct ActivityChangeResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body for POST /submit.
#[derive(Debug, Serialize)]
pub struct SubmitActivityResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// `submitted` or `late`.
    pub status: SubmissionStatus,
}

/// Response body for POST /verify.
#[derive(Debug, Serialize)]
pub struct VerifySubmissionResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// XP paid to the student.
    pub xp_awarded: u64,
    /// Gems paid to the student.
    pub gems_awarded: u64,
    /// The student's progression after the reward; absent when rejected.
    pub progress: Option<ProgressionState>,
}

/// POST /create
#[instrument(skip(state, request), fields(teacher_id = %request.teacher_id))]
async fn create_activity(
    State(state): State<AppState>,
    Json(request): Json<CreateActivityRequest>,
) -> Result<Json<CreateActivityResponse>, ApiError> {
    let command = commands::CreateActivity {
        correlation_id: Uuid::new_v4(),
        activity_id: request.activity_id.unwrap_or_else(Uuid::new_v4),
        teacher_id: request.teacher_id,
        title: request.title,
        description: request.description,
        subject: request.subject,
        kind: request.kind,
        due_date: request.due_date,
        max_score: request.max_score,
        xp_reward: request.xp_reward,
        gem_reward: request.gem_reward,
    };

    info!(
        correlation_id = %command.correlation_id,
        activity_id = %command.activity_id,
        "handling create_activity command"
    );

    let stored_events = command_handlers::handle_create_activity(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CreateActivityResponse {
        activity_id: command.activity_id,
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /update
#[instrument(skip(state, request), fields(activity_id = %request.activity_id))]
async fn update_activity(
    State(state): State<AppState>,
    Json(request): Json<UpdateActivityRequest>,
) -> Result<Json<ActivityChangeResponse>, ApiError> {
    let command = commands::UpdateActivity {
        correlation_id: Uuid::new_v4(),
        activity_id: request.activity_id,
        changes: ActivityChanges {
            title: request.title,
            description: request.description,
            subject: request.subject,
            kind: request.kind,
            due_date: request.due_date,
            max_score: request.max_score,
            xp_reward: request.xp_reward,
            gem_reward: request.gem_reward,
        },
    };

    info!(correlation_id = %command.correlation_id, "handling update_activity command");

    let stored_events = command_handlers::handle_update_activity(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(ActivityChangeResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /deactivate
#[instrument(skip(state, request), fields(activity_id = %request.activity_id))]
async fn deactivate_activity(
    State(state): State<AppState>,
    Json(request): Json<DeactivateActivityRequest>,
) -> Result<Json<ActivityChangeResponse>, ApiError> {
    let command = commands::DeactivateActivity {
        correlation_id: Uuid::new_v4(),
        activity_id: request.activity_id,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling deactivate_activity command");

    let stored_events = command_handlers::handle_deactivate_activity(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(ActivityChangeResponse {
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /submit
#[instrument(
    skip(state, request),
    fields(activity_id = %request.activity_id, student_id = %request.student_id)
)]
async fn submit_activity(
    State(state): State<AppState>,
    Json(request): Json<SubmitActivityRequest>,
) -> Result<Json<SubmitActivityResponse>, ApiError> {
    let command = commands::SubmitActivity {
        correlation_id: Uuid::new_v4(),
        activity_id: request.activity_id,
        student_id: request.student_id,
        text: request.text,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_activity command");

    let receipt = command_handlers::handle_submit_activity(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(SubmitActivityResponse {
        event_ids: receipt.stored_events.iter().map(|e| e.event_id).collect(),
        status: receipt.status,
    }))
}

/// POST /verify
#[instrument(
    skip(state, request),
    fields(activity_id = %request.activity_id, student_id = %request.student_id)
)]
async fn verify_submission(
    State(state): State<AppState>,
    Json(request): Json<VerifySubmissionRequest>,
) -> Result<Json<VerifySubmissionResponse>, ApiError> {
    let command = commands::VerifySubmission {
        correlation_id: Uuid::new_v4(),
        activity_id: request.activity_id,
        student_id: request.student_id,
        score: request.score,
        feedback: request.feedback,
        outcome: request.outcome,
    };

    info!(correlation_id = %command.correlation_id, "handling verify_submission command");

    let receipt = command_handlers::handle_verify_submission(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(VerifySubmissionResponse {
        event_ids: receipt.stored_events.iter().map(|e| e.event_id).collect(),
        xp_awarded: receipt.xp_awarded,
        gems_awarded: receipt.gems_awarded,
        progress: receipt.progression,
    }))
}

/// GET /{activity_id}
#[instrument(skip(state))]
async fn get_activity(
    State(state): State<AppState>,
    Path(activity_id): Path<Uuid>,
) -> Result<Json<query_handlers::ActivityView>, ApiError> {
    let view = query_handlers::get_activity_by_id(activity_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// Returns the router for the activities context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_activity))
        .route("/update", post(update_activity))
        .route("/deactivate", post(deactivate_activity))
        .route("/submit", post(submit_activity))
        .route("/verify", post(verify_submission))
        .route("/{activity_id}", get(get_activity))
}
