//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Error returned by every command and query handler.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    /// No events exist for the requested aggregate.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// Another writer appended to the stream first.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The version the writer read.
        expected: i64,
        /// The version found in the store.
        actual: i64,
    },

    /// The command was rejected by domain rules.
    #[error("validation error: {0}")]
    Validation(String),

    /// A persistence or serialization failure.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
