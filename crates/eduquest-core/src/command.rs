//! Command abstractions.

use uuid::Uuid;

/// Trait that all commands implement.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Dotted command name, e.g. `progression.grant_reward`, used in logs.
    fn command_type(&self) -> &'static str;

    /// Correlation ID that ties the command to the events it produces.
    fn correlation_id(&self) -> Uuid;
}
