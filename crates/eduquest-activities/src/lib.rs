//! EduQuest — Activities & Grading bounded context.
//!
//! Teachers publish activities, students submit work, teachers verify or
//! reject submissions. Verified submissions pay a score-scaled reward into
//! the student's progression.

pub mod application;
pub mod domain;
