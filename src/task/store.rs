//! Concurrent cache of live tasks and the user-to-tasks reverse index.
//!
//! The primary map and the reverse index sit behind one
//! [`tokio::sync::RwLock`] so they are never observed out of step. A single
//! logical operation performs all of its reads, durable writes and mutations
//! inside one guard; the guard is never taken twice by the same operation.

use std::collections::HashMap;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::domain::{TaskId, TaskRecord, UserId};

/// Shared task cache.
#[derive(Debug, Default)]
pub struct TaskStore {
    state: RwLock<TaskStoreState>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the shared lock for pure reads.
    pub async fn read(&self) -> RwLockReadGuard<'_, TaskStoreState> {
        self.state.read().await
    }

    /// Acquires the exclusive lock for mutations.
    pub async fn write(&self) -> RwLockWriteGuard<'_, TaskStoreState> {
        self.state.write().await
    }
}

/// Live tasks keyed by id plus the per-user list of relevant task ids.
///
/// The reverse index holds ids rather than copies, so a record mutated in
/// place is seen by every user referencing it. Per-user lists keep insertion
/// order and are deleted once empty.
#[derive(Debug, Default)]
pub struct TaskStoreState {
    tasks: HashMap<TaskId, TaskRecord>,
    user_tasks: HashMap<UserId, Vec<TaskId>>,
}

impl TaskStoreState {
    /// Inserts a freshly created task and indexes it under its requester.
    pub fn insert(&mut self, record: TaskRecord) {
        let requester = record.requester_id();
        let id = record.id();
        self.tasks.insert(id, record);
        self.index_user(requester, id);
    }

    /// Returns a live task.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&id)
    }

    /// Returns a live task for in-place mutation.
    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(&id)
    }

    /// Replaces a live task with a committed copy.
    ///
    /// Returns `false` when the task is no longer live, in which case the copy
    /// is discarded.
    pub fn replace(&mut self, record: TaskRecord) -> bool {
        match self.tasks.get_mut(&record.id()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Appends `task` to `user`'s list unless it is already there.
    pub fn index_user(&mut self, user: UserId, task: TaskId) {
        let entries = self.user_tasks.entry(user).or_default();
        if !entries.contains(&task) {
            entries.push(task);
        }
    }

    /// Removes `task` from `user`'s list, deleting the list once empty.
    ///
    /// Removal matches on task id, so the order of the user's other tasks is
    /// preserved. Absent entries are ignored.
    pub fn unindex_user(&mut self, user: UserId, task: TaskId) {
        if let Some(entries) = self.user_tasks.get_mut(&user) {
            entries.retain(|id| *id != task);
            if entries.is_empty() {
                self.user_tasks.remove(&user);
            }
        }
    }

    /// Evicts a task and every reverse-index entry pointing at it.
    ///
    /// Returns the evicted record, or `None` when the task was not live.
    pub fn evict(&mut self, id: TaskId) -> Option<TaskRecord> {
        let record = self.tasks.remove(&id)?;
        for user in record.participants() {
            self.unindex_user(user, id);
        }
        Some(record)
    }

    /// Returns the ids of the tasks relevant to `user`, in index order.
    ///
    /// `None` means the user has no entry at all.
    #[must_use]
    pub fn user_task_ids(&self, user: UserId) -> Option<&[TaskId]> {
        self.user_tasks.get(&user).map(Vec::as_slice)
    }

    /// Copies out the records relevant to `user`, in index order.
    ///
    /// `None` means the user has no entry at all.
    #[must_use]
    pub fn snapshot_for_user(&self, user: UserId) -> Option<Vec<TaskRecord>> {
        self.user_tasks.get(&user).map(|ids| {
            ids.iter()
                .filter_map(|id| self.tasks.get(id).cloned())
                .collect()
        })
    }

    /// Returns the number of live tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns whether no task is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Returns the number of users with at least one indexed task.
    #[must_use]
    pub fn indexed_user_count(&self) -> usize {
        self.user_tasks.len()
    }
}
