//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus, UserId};
use thiserror::Error;

/// Errors returned while constructing or transitioning task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The requested status transition is not permitted.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStateTransition {
        /// Task whose transition was rejected.
        task_id: TaskId,
        /// Status the task was in.
        from: TaskStatus,
        /// Status that was requested.
        to: TaskStatus,
    },

    /// The requester attempted to respond to their own task.
    #[error("requester {requester_id} cannot respond to own task {task_id}")]
    RequesterCannotRespond {
        /// Task identifier.
        task_id: TaskId,
        /// Requester identity.
        requester_id: UserId,
    },

    /// A chosen responder attempted to decline the task.
    #[error("chosen responder {responder_id} cannot decline task {task_id}")]
    ChosenResponderCannotDecline {
        /// Task identifier.
        task_id: TaskId,
        /// Chosen responder identity.
        responder_id: UserId,
    },

    /// No responders were chosen.
    #[error("at least one responder must be chosen for task {0}")]
    NoRespondersChosen(TaskId),

    /// A chosen responder never accepted the task.
    #[error("user {responder_id} is not a candidate responder of task {task_id}")]
    NotACandidate {
        /// Task identifier.
        task_id: TaskId,
        /// Rejected responder identity.
        responder_id: UserId,
    },

    /// The same responder was chosen more than once.
    #[error("user {responder_id} was chosen more than once for task {task_id}")]
    DuplicateChosenResponder {
        /// Task identifier.
        task_id: TaskId,
        /// Duplicated responder identity.
        responder_id: UserId,
    },
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
