//! In-memory durable store for tasks and user profiles.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{
        FulfilStatus, NewTask, TaskDescriptor, TaskId, TaskRecord, TaskStatus, UserId, UserInfo,
    },
    ports::{PersistenceError, PersistenceGateway, PersistenceResult},
};

/// Durable copy of a task as last written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredTask {
    /// Stored status column.
    pub status: TaskStatus,
    /// Stored creation payload.
    pub descriptor: TaskDescriptor,
    /// Stored candidate responders.
    pub candidate_responders: Vec<UserId>,
    /// Stored chosen responders.
    pub chosen_responders: Vec<UserId>,
    /// Stored fulfilment flags.
    pub fulfil_status: Vec<FulfilStatus>,
    /// Number of successful writes, including the initial insert.
    pub write_count: usize,
}

impl StoredTask {
    fn from_new(task: &NewTask) -> Self {
        Self {
            status: task.status(),
            descriptor: task.descriptor().clone(),
            candidate_responders: Vec::new(),
            chosen_responders: Vec::new(),
            fulfil_status: Vec::new(),
            write_count: 1,
        }
    }

    fn overwrite(&mut self, record: &TaskRecord) {
        self.status = record.status();
        self.descriptor = record.descriptor().clone();
        self.candidate_responders = record.candidate_responders().to_vec();
        self.chosen_responders = record.chosen_responders().to_vec();
        self.fulfil_status = record.fulfil_status().to_vec();
        self.write_count += 1;
    }
}

/// Thread-safe in-memory durable store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPersistenceGateway {
    state: Arc<RwLock<InMemoryPersistenceState>>,
}

#[derive(Debug, Default)]
struct InMemoryPersistenceState {
    next_task_id: u64,
    tasks: HashMap<TaskId, StoredTask>,
    users: HashMap<UserId, UserInfo>,
    fail_task_writes: bool,
    failing_user_lookups: HashSet<UserId>,
    tasks_initialized: bool,
    users_initialized: bool,
}

fn lock_error(err: impl ToString) -> PersistenceError {
    PersistenceError::persistence(std::io::Error::other(err.to_string()))
}

fn injected_write_failure(operation: &str) -> PersistenceError {
    PersistenceError::persistence(std::io::Error::other(format!(
        "injected failure during {operation}"
    )))
}

impl InMemoryPersistenceGateway {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read_state(&self) -> PersistenceResult<RwLockReadGuard<'_, InMemoryPersistenceState>> {
        self.state.read().map_err(lock_error)
    }

    fn write_state(&self) -> PersistenceResult<RwLockWriteGuard<'_, InMemoryPersistenceState>> {
        self.state.write().map_err(lock_error)
    }

    /// Adds or replaces a user profile.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when lock acquisition fails.
    pub fn insert_user(&self, user: UserInfo) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        state.users.insert(user.id, user);
        Ok(())
    }

    /// Makes every task write fail until reset.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when lock acquisition fails.
    pub fn set_task_writes_failing(&self, failing: bool) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        state.fail_task_writes = failing;
        Ok(())
    }

    /// Makes profile lookups for `user_id` fail.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when lock acquisition fails.
    pub fn set_user_lookup_failing(&self, user_id: UserId) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        state.failing_user_lookups.insert(user_id);
        Ok(())
    }

    /// Returns the stored copy of a task.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when lock acquisition fails.
    pub fn stored_task(&self, id: TaskId) -> PersistenceResult<Option<StoredTask>> {
        let state = self.read_state()?;
        Ok(state.tasks.get(&id).cloned())
    }

    /// Returns whether task and user data were initialised.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] when lock acquisition fails.
    pub fn is_initialized(&self) -> PersistenceResult<bool> {
        let state = self.read_state()?;
        Ok(state.tasks_initialized && state.users_initialized)
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryPersistenceGateway {
    async fn put_task_info(&self, task: &NewTask) -> PersistenceResult<TaskId> {
        let mut state = self.write_state()?;
        if state.fail_task_writes {
            return Err(injected_write_failure("put_task_info"));
        }
        state.next_task_id += 1;
        let id = TaskId::new(state.next_task_id);
        state.tasks.insert(id, StoredTask::from_new(task));
        Ok(id)
    }

    async fn update_task_info(&self, task: &TaskRecord) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        if state.fail_task_writes {
            return Err(injected_write_failure("update_task_info"));
        }
        let stored = state
            .tasks
            .get_mut(&task.id())
            .ok_or(PersistenceError::TaskNotFound(task.id()))?;
        stored.overwrite(task);
        Ok(())
    }

    async fn update_task_status_by_id(
        &self,
        id: TaskId,
        status: TaskStatus,
    ) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        if state.fail_task_writes {
            return Err(injected_write_failure("update_task_status_by_id"));
        }
        let stored = state
            .tasks
            .get_mut(&id)
            .ok_or(PersistenceError::TaskNotFound(id))?;
        stored.status = status;
        stored.write_count += 1;
        Ok(())
    }

    async fn get_user_info_by_id(&self, id: UserId) -> PersistenceResult<UserInfo> {
        let state = self.read_state()?;
        if state.failing_user_lookups.contains(&id) {
            return Err(PersistenceError::persistence(std::io::Error::other(
                format!("injected failure looking up user {id}"),
            )));
        }
        state
            .users
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::UserNotFound(id))
    }

    async fn init_tasks_data(&self) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        state.tasks_initialized = true;
        Ok(())
    }

    async fn init_users_data(&self) -> PersistenceResult<()> {
        let mut state = self.write_state()?;
        state.users_initialized = true;
        Ok(())
    }
}
