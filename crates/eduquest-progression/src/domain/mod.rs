//! Domain model for the Student Progression context.

pub mod aggregates;
pub mod commands;
pub mod engine;
pub mod events;
