//! Application services for the Student Progression context.

pub mod command_handlers;
pub mod query_handlers;
