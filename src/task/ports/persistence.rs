//! Durable store port for task and user records.

use crate::task::domain::{NewTask, TaskId, TaskRecord, TaskStatus, UserId, UserInfo};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for durable store operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Durable CRUD contract for task and user records.
///
/// Calls are awaited inline by the lifecycle services, including while the
/// task store lock is held.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Persists a new task and returns the identifier assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store rejects the write.
    async fn put_task_info(&self, task: &NewTask) -> PersistenceResult<TaskId>;

    /// Overwrites the stored copy of an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TaskNotFound`] when the task was never
    /// stored, or another [`PersistenceError`] when the write fails.
    async fn update_task_info(&self, task: &TaskRecord) -> PersistenceResult<()>;

    /// Updates only the status column of a stored task.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::TaskNotFound`] when the task was never
    /// stored, or another [`PersistenceError`] when the write fails.
    async fn update_task_status_by_id(&self, id: TaskId, status: TaskStatus)
    -> PersistenceResult<()>;

    /// Fetches a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError::UserNotFound`] for unknown users.
    async fn get_user_info_by_id(&self, id: UserId) -> PersistenceResult<UserInfo>;

    /// Prepares task data at process start-up.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be reached.
    async fn init_tasks_data(&self) -> PersistenceResult<()>;

    /// Prepares user data at process start-up.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when the store cannot be reached.
    async fn init_users_data(&self) -> PersistenceResult<()>;
}

/// Errors returned by durable store implementations.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// The task is not stored.
    #[error("task not found in durable store: {0}")]
    TaskNotFound(TaskId),

    /// The user is not stored.
    #[error("user not found in durable store: {0}")]
    UserNotFound(UserId),

    /// Store-level failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl PersistenceError {
    /// Wraps a store-level error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
