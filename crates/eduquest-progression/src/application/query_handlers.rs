//! Query handlers for the Student Progression context.

use chrono::NaiveDate;
use eduquest_core::error::DomainError;
use eduquest_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers;
use crate::domain::engine;

/// Read-only view of a student's progression.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    /// The student identifier.
    pub student_id: Uuid,
    /// Display name.
    pub name: String,
    /// Cumulative XP.
    pub xp: u64,
    /// Current level.
    pub level: u32,
    /// Gem balance.
    pub gems: u64,
    /// Consecutive active days.
    pub streak: u32,
    /// Last day with a recorded login.
    pub last_active_date: Option<NaiveDate>,
    /// XP missing for the next level; `None` at the top level.
    pub xp_to_next_level: Option<u64>,
    /// Current version (event count).
    pub version: i64,
}

/// Retrieves a student's progression by student ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if the student was never
/// enrolled, or `DomainError::Infrastructure` if event deserialization
/// fails.
pub async fn get_progress_by_id(
    student_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<ProgressView, DomainError> {
    let stored_events = repo.load_events(student_id).await?;
    let progress = command_handlers::reconstitute(student_id, &stored_events)?;
    let Some(name) = progress.name.clone() else {
        return Err(DomainError::AggregateNotFound(student_id));
    };

    let state = progress.state;
    Ok(ProgressView {
        student_id,
        name,
        xp: state.xp,
        level: state.level,
        gems: state.gems,
        streak: state.streak,
        last_active_date: state.last_active_date,
        xp_to_next_level: engine::xp_to_next_level(state.xp),
        version: progress.version,
    })
}
