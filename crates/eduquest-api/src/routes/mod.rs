//! Route modules organized by bounded context.

pub mod activities;
pub mod games;
pub mod health;
pub mod students;
