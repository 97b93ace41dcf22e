//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Conversation has no participants")]
    NoParticipants,

    #[error("Turn budget must be positive")]
    ZeroTurnBudget,

    #[error("Duplicate participant name: {0}")]
    DuplicateParticipant(String),

    #[error("Unknown participant: {0}")]
    UnknownParticipant(String),

    #[error("Conversation already terminated")]
    AlreadyTerminated,
}
