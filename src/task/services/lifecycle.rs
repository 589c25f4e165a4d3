//! Service layer enforcing the task dispatch lifecycle.

use crate::task::{
    domain::{
        Decision, NewTask, TaskDescriptor, TaskDomainError, TaskId, TaskRecord, TaskView, UserId,
        UserInfo,
    },
    ports::{PersistenceError, PersistenceGateway, SearchGateway},
    services::{ResponderSearchDispatcher, SearchDispatchSettings},
    store::{TaskStore, TaskStoreState},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Request payload for a responder's answer to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptTaskRequest {
    /// Task being answered.
    pub task_id: TaskId,
    /// Responder answering.
    pub responder_id: UserId,
    /// Accept or decline.
    pub decision: Decision,
}

impl AcceptTaskRequest {
    /// Creates an accept request.
    #[must_use]
    pub const fn accept(task_id: TaskId, responder_id: UserId) -> Self {
        Self {
            task_id,
            responder_id,
            decision: Decision::Accept,
        }
    }

    /// Creates a decline request.
    #[must_use]
    pub const fn decline(task_id: TaskId, responder_id: UserId) -> Self {
        Self {
            task_id,
            responder_id,
            decision: Decision::Decline,
        }
    }
}

/// Request payload for the requester's choice of responders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooseRespondersRequest {
    /// Task being assigned.
    pub task_id: TaskId,
    /// Responders selected to perform the task.
    pub chosen_responder_ids: Vec<UserId>,
}

impl ChooseRespondersRequest {
    /// Creates a choose request.
    #[must_use]
    pub fn new(task_id: TaskId, chosen: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            task_id,
            chosen_responder_ids: chosen.into_iter().collect(),
        }
    }
}

/// Request payload for a chosen responder reporting completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FulfilTaskRequest {
    /// Task being fulfilled.
    pub task_id: TaskId,
    /// Responder reporting completion.
    pub responder_id: UserId,
}

impl FulfilTaskRequest {
    /// Creates a fulfil request.
    #[must_use]
    pub const fn new(task_id: TaskId, responder_id: UserId) -> Self {
        Self {
            task_id,
            responder_id,
        }
    }
}

/// Service-level errors for task lifecycle operations.
///
/// Failed operations leave the cached task exactly as it was before the call.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Input validation or the lifecycle state machine rejected the request.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The referenced task is not live.
    #[error("no such task: {0}")]
    NoSuchTask(TaskId),
    /// The user has no live task.
    #[error("user {0} has no task")]
    UserHasNoTask(UserId),
    /// The durable store rejected a new task.
    #[error("failed to persist new task: {0}")]
    PutTaskInfoFailed(#[source] PersistenceError),
    /// The durable store rejected an update.
    #[error("failed to persist task {task_id}: {source}")]
    UpdateTaskInfoFailed {
        /// Task whose update was rejected.
        task_id: TaskId,
        /// Store failure.
        source: PersistenceError,
    },
    /// Durable store initialisation failed.
    #[error("failed to initialise durable store: {0}")]
    Bootstrap(#[source] PersistenceError),
}

/// Result type for task lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
///
/// Mutating operations hold the exclusive [`TaskStore`] lock for their whole
/// duration, including the durable write, so no reader observes a record
/// whose write is still in flight. Each mutation is applied to a copy of the
/// record, persisted, and swapped into the cache only once the write
/// succeeded.
pub struct TaskLifecycleController<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    store: Arc<TaskStore>,
    persistence: Arc<P>,
    clock: Arc<C>,
    dispatcher: ResponderSearchDispatcher<P, S, C>,
}

impl<P, S, C> TaskLifecycleController<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a controller with an empty task cache.
    #[must_use]
    pub fn new(
        persistence: Arc<P>,
        search: Arc<S>,
        clock: Arc<C>,
        settings: SearchDispatchSettings,
    ) -> Self {
        let store = Arc::new(TaskStore::new());
        let dispatcher = ResponderSearchDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&persistence),
            search,
            Arc::clone(&clock),
            settings,
        );
        Self {
            store,
            persistence,
            clock,
            dispatcher,
        }
    }

    /// Returns the task cache.
    #[must_use]
    pub const fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Returns the background search dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &ResponderSearchDispatcher<P, S, C> {
        &self.dispatcher
    }

    /// Initialises durable task and user data before serving.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Bootstrap`] when either initialisation
    /// fails.
    pub async fn bootstrap(&self) -> TaskLifecycleResult<()> {
        self.persistence
            .init_tasks_data()
            .await
            .map_err(TaskLifecycleError::Bootstrap)?;
        self.persistence
            .init_users_data()
            .await
            .map_err(TaskLifecycleError::Bootstrap)?;
        info!("durable task and user data initialised");
        Ok(())
    }

    /// Persists a new task, caches it and starts the responder search.
    ///
    /// Returns as soon as the task is cached; the search outcome is applied
    /// later in the background.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an invalid descriptor or
    /// [`TaskLifecycleError::PutTaskInfoFailed`] when the durable store
    /// rejects the task. Nothing is cached in either case.
    pub async fn create_task(&self, descriptor: TaskDescriptor) -> TaskLifecycleResult<TaskId> {
        let descriptor = descriptor.validated()?;
        let requester = descriptor.requester_id();
        let new_task = NewTask::new(descriptor, &*self.clock);

        let task_id = self
            .persistence
            .put_task_info(&new_task)
            .await
            .map_err(|err| {
                error!(requester_id = %requester, error = %err, "put task info failed");
                TaskLifecycleError::PutTaskInfoFailed(err)
            })?;

        let record = new_task.into_record(task_id);
        self.store.write().await.insert(record.clone());
        self.dispatcher.dispatch(record);

        info!(task_id = %task_id, requester_id = %requester, "task created");
        Ok(task_id)
    }

    /// Lists the tasks relevant to `user_id` with user profiles attached.
    ///
    /// Records are copied out under the shared lock; profiles are resolved
    /// afterwards. A profile that cannot be fetched is logged and left out of
    /// its view.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UserHasNoTask`] when the user has no
    /// live task.
    pub async fn query_user_tasks(&self, user_id: UserId) -> TaskLifecycleResult<Vec<TaskView>> {
        let snapshot = self.store.read().await.snapshot_for_user(user_id);
        let Some(records) = snapshot else {
            info!(user_id = %user_id, "user has no task");
            return Err(TaskLifecycleError::UserHasNoTask(user_id));
        };

        let mut views = Vec::with_capacity(records.len());
        for record in &records {
            views.push(self.decorate(record).await);
        }
        debug!(user_id = %user_id, tasks = views.len(), "user tasks queried");
        Ok(views)
    }

    async fn decorate(&self, record: &TaskRecord) -> TaskView {
        let mut view = TaskView::undecorated(record);
        view.requester = self.lookup_user(record.id(), record.requester_id()).await;
        for responder in record.candidate_responders() {
            if let Some(profile) = self.lookup_user(record.id(), *responder).await {
                view.responders.push(profile);
            }
        }
        if record.status().exposes_chosen_responders() {
            for chosen in record.chosen_responders() {
                if let Some(profile) = self.lookup_user(record.id(), *chosen).await {
                    view.chosen_responders.push(profile);
                }
            }
        }
        view
    }

    async fn lookup_user(&self, task_id: TaskId, user_id: UserId) -> Option<UserInfo> {
        match self.persistence.get_user_info_by_id(user_id).await {
            Ok(profile) => Some(profile),
            Err(err) => {
                warn!(
                    task_id = %task_id,
                    user_id = %user_id,
                    error = %err,
                    "user profile lookup failed, omitting from view"
                );
                None
            }
        }
    }

    /// Records a responder's answer to a task.
    ///
    /// Accepting appends the responder to the candidates and moves the task to
    /// `WaitingChoose`; accepting again is a no-op. Declining only drops the
    /// task from the responder's own list and succeeds even when nothing was
    /// listed. Neither the requester nor a chosen responder may decline a live
    /// task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NoSuchTask`] when accepting a task that is
    /// not live, [`TaskLifecycleError::Domain`] when the task does not accept
    /// answers, or the requester or a chosen responder declines, and
    /// [`TaskLifecycleError::UpdateTaskInfoFailed`] when the durable write
    /// fails.
    pub async fn accept_task(&self, request: AcceptTaskRequest) -> TaskLifecycleResult<()> {
        let AcceptTaskRequest {
            task_id,
            responder_id,
            decision,
        } = request;
        let mut state = self.store.write().await;

        if decision == Decision::Decline {
            if let Some(record) = state.get(task_id) {
                record.check_decline(responder_id)?;
            }
            state.unindex_user(responder_id, task_id);
            info!(task_id = %task_id, responder_id = %responder_id, "task declined");
            return Ok(());
        }

        let mut updated = state
            .get(task_id)
            .ok_or(TaskLifecycleError::NoSuchTask(task_id))?
            .clone();
        if !updated.accept(responder_id, &*self.clock)? {
            debug!(task_id = %task_id, responder_id = %responder_id, "responder already accepted");
            return Ok(());
        }

        self.commit(&mut state, updated).await?;
        state.index_user(responder_id, task_id);
        info!(task_id = %task_id, responder_id = %responder_id, "task accepted");
        Ok(())
    }

    /// Assigns the task to the chosen responders and starts processing.
    ///
    /// On success every notified or accepting user who was not chosen loses
    /// the task from their list.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NoSuchTask`] when the task is not live,
    /// [`TaskLifecycleError::Domain`] when the task is not waiting for a choice
    /// or the choice is invalid, and
    /// [`TaskLifecycleError::UpdateTaskInfoFailed`] when the durable write
    /// fails.
    pub async fn choose_task_responders(
        &self,
        request: ChooseRespondersRequest,
    ) -> TaskLifecycleResult<()> {
        let task_id = request.task_id;
        let mut state = self.store.write().await;

        let mut updated = state
            .get(task_id)
            .ok_or(TaskLifecycleError::NoSuchTask(task_id))?
            .clone();
        updated.choose(&request.chosen_responder_ids, &*self.clock)?;
        let unchosen = updated.unchosen_responders();

        self.commit(&mut state, updated).await?;
        for user in &unchosen {
            state.unindex_user(*user, task_id);
        }
        for chosen in &request.chosen_responder_ids {
            state.index_user(*chosen, task_id);
        }
        info!(
            task_id = %task_id,
            chosen = request.chosen_responder_ids.len(),
            released = unchosen.len(),
            "task responders chosen"
        );
        Ok(())
    }

    /// Marks a chosen responder as finished.
    ///
    /// The task becomes `Fulfilled` once every chosen responder has finished.
    /// Reports from responders who are not chosen, or who already finished,
    /// change nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NoSuchTask`] when the task is not live,
    /// [`TaskLifecycleError::Domain`] when the task is not being processed, and
    /// [`TaskLifecycleError::UpdateTaskInfoFailed`] when the durable write
    /// fails; the fulfilment flag is then left as it was.
    pub async fn fulfil_task(&self, request: FulfilTaskRequest) -> TaskLifecycleResult<()> {
        let FulfilTaskRequest {
            task_id,
            responder_id,
        } = request;
        let mut state = self.store.write().await;

        let mut updated = state
            .get(task_id)
            .ok_or(TaskLifecycleError::NoSuchTask(task_id))?
            .clone();
        if !updated.fulfil(responder_id, &*self.clock)? {
            debug!(task_id = %task_id, responder_id = %responder_id, "fulfilment changed nothing");
            return Ok(());
        }
        let status = updated.status();

        self.commit(&mut state, updated).await?;
        info!(
            task_id = %task_id,
            responder_id = %responder_id,
            status = %status,
            "task fulfilment recorded"
        );
        Ok(())
    }

    /// Evicts a task from the cache once the requester has evaluated it.
    ///
    /// The durable record is kept for history. Finishing an unknown or already
    /// finished task is a no-op.
    pub async fn evaluate_and_finish_task(&self, task_id: TaskId) {
        let mut state = self.store.write().await;
        match state.evict(task_id) {
            Some(record) => info!(
                task_id = %task_id,
                status = %record.status(),
                "task evaluated and evicted"
            ),
            None => debug!(task_id = %task_id, "task already finished"),
        }
    }

    async fn commit(
        &self,
        state: &mut TaskStoreState,
        updated: TaskRecord,
    ) -> TaskLifecycleResult<()> {
        let task_id = updated.id();
        if let Err(source) = self.persistence.update_task_info(&updated).await {
            error!(
                task_id = %task_id,
                error = %source,
                "update task info failed, keeping cached task"
            );
            return Err(TaskLifecycleError::UpdateTaskInfoFailed { task_id, source });
        }
        state.replace(updated);
        Ok(())
    }
}
