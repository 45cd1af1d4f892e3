//! Domain model for the Activities & Grading context.

pub mod aggregates;
pub mod commands;
pub mod events;
