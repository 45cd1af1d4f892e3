//! EduQuest Core — shared domain abstractions.
//!
//! Defines the traits and types every bounded context builds on: aggregates
//! reconstituted from events, commands, the event repository seam, the clock
//! and the domain error. No infrastructure lives here.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod repository;
