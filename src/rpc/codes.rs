//! Outcome codes carried in every response envelope.

use crate::task::{domain::TaskDomainError, services::TaskLifecycleError};
use std::fmt;

/// Outcome of a task manager call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The call succeeded.
    Ok,
    /// The user has no live task.
    UserHasNoTask,
    /// The referenced task is not live.
    NoSuchTask,
    /// The task's status does not allow the operation.
    InvalidTaskStatus,
    /// The request payload is invalid.
    InvalidTaskRequest,
    /// The durable store rejected a new task.
    PutTaskInfoFailed,
    /// The durable store rejected a task update.
    UpdateTaskInfoFailed,
    /// The service could not reach its durable store.
    ServiceUnavailable,
}

impl ErrorCode {
    const ALL: [Self; 8] = [
        Self::Ok,
        Self::UserHasNoTask,
        Self::NoSuchTask,
        Self::InvalidTaskStatus,
        Self::InvalidTaskRequest,
        Self::PutTaskInfoFailed,
        Self::UpdateTaskInfoFailed,
        Self::ServiceUnavailable,
    ];

    /// Returns the numeric wire value.
    #[must_use]
    pub const fn value(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::UserHasNoTask => 2001,
            Self::NoSuchTask => 2002,
            Self::InvalidTaskStatus => 2003,
            Self::InvalidTaskRequest => 2004,
            Self::PutTaskInfoFailed => 3001,
            Self::UpdateTaskInfoFailed => 3002,
            Self::ServiceUnavailable => 5001,
        }
    }

    /// Returns the fixed human-readable message for the code.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::UserHasNoTask => "user has no task",
            Self::NoSuchTask => "no such task",
            Self::InvalidTaskStatus => "task status does not allow this operation",
            Self::InvalidTaskRequest => "invalid task request",
            Self::PutTaskInfoFailed => "failed to store task info",
            Self::UpdateTaskInfoFailed => "failed to update task info",
            Self::ServiceUnavailable => "service unavailable",
        }
    }

    /// Looks up a code by its numeric wire value.
    #[must_use]
    pub fn from_value(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.value() == value)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), self.value())
    }
}

impl From<&TaskLifecycleError> for ErrorCode {
    fn from(err: &TaskLifecycleError) -> Self {
        match err {
            TaskLifecycleError::Domain(TaskDomainError::InvalidStateTransition { .. }) => {
                Self::InvalidTaskStatus
            }
            TaskLifecycleError::Domain(_) => Self::InvalidTaskRequest,
            TaskLifecycleError::NoSuchTask(_) => Self::NoSuchTask,
            TaskLifecycleError::UserHasNoTask(_) => Self::UserHasNoTask,
            TaskLifecycleError::PutTaskInfoFailed(_) => Self::PutTaskInfoFailed,
            TaskLifecycleError::UpdateTaskInfoFailed { .. } => Self::UpdateTaskInfoFailed,
            TaskLifecycleError::Bootstrap(_) => Self::ServiceUnavailable,
        }
    }
}
