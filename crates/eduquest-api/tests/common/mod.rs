//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use eduquest_core::clock::Clock;
use eduquest_core::repository::EventRepository;
use eduquest_event_store::pg_event_repository::PgEventRepository;
use eduquest_test_support::{FixedClock, InMemoryEventRepository};
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use eduquest_api::app;
use eduquest_api::state::AppState;

/// Fixed clock at the given day of March 2026, 10:00 UTC.
pub fn clock_on(day: u32) -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 3, day, 10, 0, 0).unwrap(),
    ))
}

/// Build the full app router over the given repository and clock.
pub fn build_app(event_repository: Arc<dyn EventRepository>, clock: Arc<dyn Clock>) -> Router {
    app(AppState::new(clock, event_repository))
}

/// Build the full app router over a fresh in-memory event store.
pub fn build_test_app() -> (Router, Arc<InMemoryEventRepository>) {
    let repo = Arc::new(InMemoryEventRepository::new());
    (build_app(repo.clone(), clock_on(15)), repo)
}

/// Build the full app router with a real `PgEventRepository`.
pub fn build_pg_test_app(pool: PgPool) -> Router {
    build_app(Arc::new(PgEventRepository::new(pool)), clock_on(15))
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Enroll a student through the API and return their ID.
pub async fn enroll(app: Router, name: &str) -> uuid::Uuid {
    let (status, json) = post_json(
        app,
        "/api/v1/students/enroll",
        &serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["student_id"].as_str().unwrap().parse().unwrap()
}
