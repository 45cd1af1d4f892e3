//! EduQuest — `PostgreSQL` event store.
//!
//! The schema lives in the workspace `migrations/` directory and is applied
//! with `sqlx::migrate!` at startup.

pub mod pg_event_repository;
