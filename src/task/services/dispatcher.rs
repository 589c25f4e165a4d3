//! Background responder search run once per created task.

use crate::task::{
    domain::{TaskId, TaskRecord, TaskStatus, UserId},
    ports::{PersistenceGateway, SearchGateway},
    store::TaskStore,
};
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Limits applied to background responder searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDispatchSettings {
    /// Maximum number of search calls in flight at once.
    pub max_concurrent_searches: usize,
    /// Deadline for one search call; expiry counts as a failed search.
    pub search_timeout: Duration,
}

impl Default for SearchDispatchSettings {
    fn default() -> Self {
        Self {
            max_concurrent_searches: 64,
            search_timeout: Duration::from_secs(10),
        }
    }
}

/// Interpreted result of one responder search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResolution {
    /// The call failed, timed out or answered for another task.
    Failed,
    /// The search found nobody besides the requester.
    NoCandidates,
    /// Candidates other than the requester, in search order.
    Candidates(Vec<UserId>),
}

impl SearchResolution {
    /// Builds a resolution from the candidates returned for `task`.
    #[must_use]
    pub fn from_candidates(task: &TaskRecord, candidates: &[UserId]) -> Self {
        let requester = task.requester_id();
        let mut others: Vec<UserId> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if *candidate != requester && !others.contains(candidate) {
                others.push(*candidate);
            }
        }
        if others.is_empty() {
            Self::NoCandidates
        } else {
            Self::Candidates(others)
        }
    }

    /// Returns the status the task moves to.
    #[must_use]
    pub const fn target_status(&self) -> TaskStatus {
        match self {
            Self::Failed => TaskStatus::SearchResponderFailed,
            Self::NoCandidates => TaskStatus::SearchResponderNone,
            Self::Candidates(_) => TaskStatus::WaitingAccept,
        }
    }
}

/// Schedules responder searches off the request path.
///
/// Every dispatched search runs on its own spawned Tokio task. The number of
/// concurrent search calls is capped by a semaphore and each call has a
/// deadline. Outcomes are persisted first and then applied to the
/// [`TaskStore`]; a failed durable write is logged and the cached status is
/// still moved, so cache and store may diverge until the next write.
pub struct ResponderSearchDispatcher<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    job: SearchJob<P, S, C>,
    in_flight: Mutex<JoinSet<()>>,
}

struct SearchJob<P, S, C> {
    store: Arc<TaskStore>,
    persistence: Arc<P>,
    search: Arc<S>,
    clock: Arc<C>,
    permits: Arc<Semaphore>,
    search_timeout: Duration,
}

impl<P, S, C> Clone for SearchJob<P, S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            persistence: Arc::clone(&self.persistence),
            search: Arc::clone(&self.search),
            clock: Arc::clone(&self.clock),
            permits: Arc::clone(&self.permits),
            search_timeout: self.search_timeout,
        }
    }
}

impl<P, S, C> ResponderSearchDispatcher<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a dispatcher applying outcomes to `store`.
    #[must_use]
    pub fn new(
        store: Arc<TaskStore>,
        persistence: Arc<P>,
        search: Arc<S>,
        clock: Arc<C>,
        settings: SearchDispatchSettings,
    ) -> Self {
        Self {
            job: SearchJob {
                store,
                persistence,
                search,
                clock,
                permits: Arc::new(Semaphore::new(settings.max_concurrent_searches.max(1))),
                search_timeout: settings.search_timeout,
            },
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Starts the search for `task` without waiting for it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn dispatch(&self, task: TaskRecord) {
        let job = self.job.clone();
        let mut in_flight = self.in_flight();
        while let Some(finished) = in_flight.try_join_next() {
            log_join_failure(finished);
        }
        in_flight.spawn(async move { job.run(task).await });
    }

    /// Waits until every dispatched search, including ones dispatched while
    /// waiting, has been applied.
    pub async fn wait_idle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.in_flight());
            if pending.is_empty() {
                return;
            }
            while let Some(finished) = pending.join_next().await {
                log_join_failure(finished);
            }
        }
    }
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        error!(error = %err, "responder search job did not complete");
    }
}

impl<P, S, C> SearchJob<P, S, C>
where
    P: PersistenceGateway,
    S: SearchGateway,
    C: Clock + Send + Sync,
{
    async fn run(self, task: TaskRecord) {
        let resolution = self.search(&task).await;
        self.apply(task.id(), resolution).await;
    }

    async fn search(&self, task: &TaskRecord) -> SearchResolution {
        let Ok(_permit) = Arc::clone(&self.permits).acquire_owned().await else {
            error!(task_id = %task.id(), "search permits closed, marking search as failed");
            return SearchResolution::Failed;
        };

        let answer =
            tokio::time::timeout(self.search_timeout, self.search.search_responders(task)).await;
        match answer {
            Ok(Ok(outcome)) if outcome.task_id == task.id() => {
                SearchResolution::from_candidates(task, &outcome.candidate_responder_ids)
            }
            Ok(Ok(outcome)) => {
                error!(
                    task_id = %task.id(),
                    answered_for = %outcome.task_id,
                    "search answered for a different task, marking search as failed"
                );
                SearchResolution::Failed
            }
            Ok(Err(err)) => {
                error!(task_id = %task.id(), error = %err, "search responders failed");
                SearchResolution::Failed
            }
            Err(_) => {
                error!(
                    task_id = %task.id(),
                    timeout = ?self.search_timeout,
                    "search responders timed out"
                );
                SearchResolution::Failed
            }
        }
    }

    async fn apply(&self, task_id: TaskId, resolution: SearchResolution) {
        let status = resolution.target_status();
        if let Err(err) = self
            .persistence
            .update_task_status_by_id(task_id, status)
            .await
        {
            error!(
                task_id = %task_id,
                status = %status,
                error = %err,
                "failed to persist search outcome, updating cache anyway"
            );
        }

        let mut state = self.store.write().await;
        let Some(record) = state.get_mut(task_id) else {
            info!(task_id = %task_id, "task finished before search completed, dropping outcome");
            return;
        };
        if let Err(err) = record.record_search_outcome(status, &*self.clock) {
            warn!(task_id = %task_id, error = %err, "search outcome rejected by task lifecycle");
            return;
        }

        let notified = match &resolution {
            SearchResolution::Candidates(candidates) => record.notify_responders(candidates),
            SearchResolution::Failed | SearchResolution::NoCandidates => Vec::new(),
        };
        for responder in &notified {
            state.index_user(*responder, task_id);
        }
        info!(
            task_id = %task_id,
            status = %status,
            notified = notified.len(),
            "search outcome applied"
        );
    }
}
