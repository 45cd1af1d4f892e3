//! Application services for the Activities & Grading context.

pub mod command_handlers;
pub mod query_handlers;
