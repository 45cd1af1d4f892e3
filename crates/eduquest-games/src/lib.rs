//! EduQuest — Game Sessions bounded context.
//!
//! Records finished learning-game sessions per student, pays each session's
//! score-scaled reward into the student's progression and serves the
//! session history and per-game statistics.

pub mod application;
pub mod domain;
