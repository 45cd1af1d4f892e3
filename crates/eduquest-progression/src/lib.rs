//! EduQuest — Student Progression bounded context.
//!
//! Owns the progression engine (XP accrual, level derivation, gem rewards and
//! daily streaks) and the event-sourced `StudentProgress` aggregate that
//! persists its results.

pub mod application;
pub mod domain;
