//! Routes for the Student Progression bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use eduquest_progression::application::{command_handlers, query_handlers};
use eduquest_progression::domain::commands;
use eduquest_progression::domain::engine::ProgressionState;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /enroll.
#[derive(Debug, Deserialize)]
pub struct EnrollStudentRequest {
    /// Student identifier; generated when omitted.
    pub student_id: Option<Uuid>,
    /// Display name.
    pub name: String,
}

/// Request body for POST /record-login.
#[derive(Debug, Deserialize)]
pub struct RecordLoginRequest {
    /// The student who logged in.
    pub student_id: Uuid,
}

/// Request body for POST /correct-experience.
#[derive(Debug, Deserialize)]
pub struct CorrectExperienceRequest {
    /// The student to correct.
    pub student_id: Uuid,
    /// Corrected XP total.
    pub xp: u64,
    /// Why the correction was made.
    pub reason: String,
}

/// Response body for POST /enroll.
#[derive(Debug, Serialize)]
pub struct EnrollStudentResponse {
    /// The enrolled student's identifier.
    pub student_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

/// Response body for commands that change a student's progression.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// Progression after the command.
    pub progress: ProgressionState,
}

/// POST /enroll
#[instrument(skip(state, request))]
async fn enroll_student(
    State(state): State<AppState>,
    Json(request): Json<EnrollStudentRequest>,
) -> Result<Json<EnrollStudentResponse>, ApiError> {
    let command = commands::EnrollStudent {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id.unwrap_or_else(Uuid::new_v4),
        name: request.name,
    };

    info!(
        correlation_id = %command.correlation_id,
        student_id = %command.student_id,
        "handling enroll_student command"
    );

    let stored_events = command_handlers::handle_enroll_student(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(EnrollStudentResponse {
        student_id: command.student_id,
        event_ids: stored_events.iter().map(|e| e.event_id).collect(),
    }))
}

/// POST /record-login
#[instrument(skip(state, request), fields(student_id = %request.student_id))]
async fn record_login(
    State(state): State<AppState>,
    Json(request): Json<RecordLoginRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let command = commands::RecordLogin {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
    };

    info!(correlation_id = %command.correlation_id, "handling record_login command");

    let update = command_handlers::handle_record_login(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(ProgressResponse {
        event_ids: update.stored_events.iter().map(|e| e.event_id).collect(),
        progress: update.state,
    }))
}

/// POST /correct-experience
#[instrument(skip(state, request), fields(student_id = %request.student_id))]
async fn correct_experience(
    State(state): State<AppState>,
    Json(request): Json<CorrectExperienceRequest>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let command = commands::CorrectExperience {
        correlation_id: Uuid::new_v4(),
        student_id: request.student_id,
        xp: request.xp,
        reason: request.reason,
    };

    info!(correlation_id = %command.correlation_id, "handling correct_experience command");

    let update = command_handlers::handle_correct_experience(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(ProgressResponse {
        event_ids: update.stored_events.iter().map(|e| e.event_id).collect(),
        progress: update.state,
    }))
}

/// GET /{student_id}
#[instrument(skip(state))]
async fn get_progress(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<query_handlers::ProgressView>, ApiError> {
    let view = query_handlers::get_progress_by_id(student_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// Returns the router for the students context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/enroll", post(enroll_student))
        .route("/record-login", post(record_login))
        .route("/correct-experience", post(correct_experience))
        .route("/{student_id}", get(get_progress))
}
