//! Routes for the Game Sessions bounded context.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use eduquest_games::application::command_handlers;
use eduquest_games::application::query_handlers::{self, GameStats};
use eduquest_games::domain::aggregates::PlayedSession;
use eduquest_games::domain::commands;
use eduquest_games::domain::events::GameType;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /record-session.
#[derive(Debug, Deserialize)]
pub struct RecordGameSessionRequest {
    /// Client-chosen session identifier, so a resent request pays once.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// The student who played.
    pub student_id: Uuid,
    /// Which game was played.
    pub game_type: GameType,
    /// Optional subject.
    #[serde(default)]
    pub subject: Option<String>,
    /// Points scored.
    pub score: f64,
    /// Points available; a missing value earns no reward.
    #[serde(default)]
    pub max_score: f64,
    /// Play time in seconds.
    #[serde(default)]
    pub duration_secs: u32,
    /// Questions answered.
    #[serde(default)]
    pub questions_answered: u32,
    /// Questions answered correctly.
    #[serde(default)]
    pub correct_answers: u32,
    /// Whether generated questions were used.
    #[serde(default)]
    pub ai_questions_used: bool,
}

/// Response body for POST /record-session.
#[derive(Debug, Serialize)]
pub struct RecordGameSessionResponse {
    /// The session's identifier.
    pub session_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
    /// XP earned by the session.
    pub xp_earned: u64,
    /// Gems earned by the session.
    pub gems_earned: u64,
    /// The student's total XP afterwards.
    pub new_xp: u64,
    /// The student's level afterwards.
    pub new_level: u32,
}

/// Response body for GET /{student_id}/sessions.
#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    /// Most recent sessions, newest first.
    pub sessions: Vec<PlayedSession>,
}

/// Response body for GET /{student_id}/stats.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Per-game statistics.
    pub stats: Vec<GameStats>,
}

/// POST /record-session
#[instrument(skip(state, request), fields(student_id = %request.student_id))]
async fn record_session(
    State(state): State<AppState>,
    Json(request): Json<RecordGameSessionRequest>,
) -> Result<Json<RecordGameSessionResponse>, ApiError> {
    let command = commands::RecordGameSession {
        correlation_id: Uuid::new_v4(),
        session_id: request.session_id,
        student_id: request.student_id,
        game_type: request.game_type,
        subject: request.subject,
        score: request.score,
        max_score: request.max_score,
        duration_secs: request.duration_secs,
        questions_answered: request.questions_answered,
        correct_answers: request.correct_answers,
        ai_questions_used: request.ai_questions_used,
    };

    info!(correlation_id = %command.correlation_id, "handling record_game_session command");

    let receipt = command_handlers::handle_record_game_session(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(RecordGameSessionResponse {
        session_id: receipt.session_id,
        event_ids: receipt.stored_events.iter().map(|e| e.event_id).collect(),
        xp_earned: receipt.xp_earned,
        gems_earned: receipt.gems_earned,
        new_xp: receipt.new_xp,
        new_level: receipt.new_level,
    }))
}

/// GET /{student_id}/sessions
#[instrument(skip(state))]
async fn recent_sessions(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = query_handlers::get_recent_sessions(student_id, &*state.event_repository).await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// GET /{student_id}/stats
#[instrument(skip(state))]
async fn game_stats(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
) -> Result<Json<StatsResponse>, ApiError> {
    let stats = query_handlers::get_game_stats(student_id, &*state.event_repository).await?;
    Ok(Json(StatsResponse { stats }))
}

/// Returns the router for the games context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/record-session", post(record_session))
        .route("/{student_id}/sessions", get(recent_sessions))
        .route("/{student_id}/stats", get(game_stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{TimeZone, Utc};
    use eduquest_core::repository::EventRepository;
    use eduquest_progression::application::command_handlers::handle_enroll_student;
    use eduquest_progression::domain::commands::EnrollStudent;
    use eduquest_test_support::{FailingEventRepository, FixedClock, InMemoryEventRepository};
    use serde_json::Value;
    use tower::ServiceExt;

    fn app_state_with(event_repository: Arc<dyn EventRepository>) -> AppState {
        let clock = Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2026, 7, 4, 15, 0, 0).unwrap(),
        ));
        AppState::new(clock, event_repository)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_of(response: axum::response::Response) -> Value {
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body_bytes).unwrap()
    }

    #[tokio::test]
    async fn test_record_session_for_unknown_student_returns_404() {
        // Arrange
        let app = router().with_state(app_state_with(Arc::new(InMemoryEventRepository::new())));
        let body = serde_json::json!({
            "student_id": Uuid::new_v4(),
            "game_type": "speed_math",
            "score": 8,
            "max_score": 10
        });
        let request = Request::builder()
            .method("POST")
            .uri("/record-session")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_of(response).await["error"], "aggregate_not_found");
    }

    #[tokio::test]
    async fn test_record_session_with_unlisted_game_pays_fallback_reward() {
        // Arrange
        let repo = Arc::new(InMemoryEventRepository::new());
        let student_id = Uuid::new_v4();
        handle_enroll_student(
            &EnrollStudent {
                correlation_id: Uuid::new_v4(),
                student_id,
                name: "Ines".to_owned(),
            },
            &FixedClock(Utc.with_ymd_and_hms(2026, 7, 1, 9, 0, 0).unwrap()),
            repo.as_ref(),
        )
        .await
        .unwrap();
        let app = router().with_state(app_state_with(repo));
        let body = serde_json::json!({
            "student_id": student_id,
            "game_type": "chess",
            "score": 10,
            "max_score": 10
        });
        let request = Request::builder()
            .method("POST")
            .uri("/record-session")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_of(response).await;
        assert_eq!(json["xp_earned"], 50);
        assert_eq!(json["gems_earned"], 10);
    }

    #[tokio::test]
    async fn test_record_session_with_malformed_game_type_returns_422() {
        let app = router().with_state(app_state_with(Arc::new(InMemoryEventRepository::new())));
        let body = serde_json::json!({
            "student_id": Uuid::new_v4(),
            "game_type": 7,
            "score": 1
        });
        let request = Request::builder()
            .method("POST")
            .uri("/record-session")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_sessions_and_stats_are_empty_for_new_student() {
        // Arrange
        let state = app_state_with(Arc::new(InMemoryEventRepository::new()));
        let student_id = Uuid::new_v4();

        // Act
        let sessions = router()
            .with_state(state.clone())
            .oneshot(get_request(&format!("/{student_id}/sessions")))
            .await
            .unwrap();
        let stats = router()
            .with_state(state)
            .oneshot(get_request(&format!("/{student_id}/stats")))
            .await
            .unwrap();

        // Assert
        assert_eq!(sessions.status(), StatusCode::OK);
        assert_eq!(json_of(sessions).await["sessions"], serde_json::json!([]));
        assert_eq!(stats.status(), StatusCode::OK);
        assert_eq!(json_of(stats).await["stats"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_stats_returns_500_when_repository_fails() {
        let app = router().with_state(app_state_with(Arc::new(FailingEventRepository)));

        let response = app
            .oneshot(get_request(&format!("/{}/stats", Uuid::new_v4())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
