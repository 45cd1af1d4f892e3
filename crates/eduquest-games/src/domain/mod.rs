//! Domain model for the Game Sessions context.

pub mod aggregates;
pub mod commands;
pub mod events;
