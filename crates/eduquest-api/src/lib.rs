//! EduQuest — HTTP API.
//!
//! Exposes the progression, activities and games contexts as JSON endpoints
//! under `/api/v1`.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use crate::state::AppState;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/students", routes::students::router())
        .nest("/api/v1/activities", routes::activities::router())
        .nest("/api/v1/games", routes::games::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
