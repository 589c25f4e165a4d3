//! In-memory responder search adapter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use crate::task::{
    domain::{TaskId, TaskRecord, UserId},
    ports::{SearchGateway, SearchGatewayError, SearchGatewayResult, SearchOutcome},
};

/// Responder search adapter answering from a configured candidate table.
///
/// Candidates are looked up by requester, falling back to a default list.
#[derive(Debug, Clone, Default)]
pub struct InMemorySearchGateway {
    state: Arc<RwLock<InMemorySearchState>>,
}

#[derive(Debug, Default)]
struct InMemorySearchState {
    candidates_by_requester: HashMap<UserId, Vec<UserId>>,
    default_candidates: Vec<UserId>,
    failure: Option<String>,
    malformed: bool,
    delay: Option<Duration>,
    calls: usize,
}

fn lock_error(err: impl ToString) -> SearchGatewayError {
    SearchGatewayError::transport(std::io::Error::other(err.to_string()))
}

impl InMemorySearchGateway {
    /// Creates a search adapter that finds no candidates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a search adapter proposing `candidates` for every task.
    #[must_use]
    pub fn with_default_candidates(candidates: impl IntoIterator<Item = UserId>) -> Self {
        let gateway = Self::default();
        if let Ok(mut state) = gateway.state.write() {
            state.default_candidates = candidates.into_iter().collect();
        }
        gateway
    }

    fn write_state(&self) -> SearchGatewayResult<RwLockWriteGuard<'_, InMemorySearchState>> {
        self.state.write().map_err(lock_error)
    }

    /// Sets the candidates proposed for tasks posted by `requester`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] when lock acquisition fails.
    pub fn set_candidates_for(
        &self,
        requester: UserId,
        candidates: impl IntoIterator<Item = UserId>,
    ) -> SearchGatewayResult<()> {
        let mut state = self.write_state()?;
        state
            .candidates_by_requester
            .insert(requester, candidates.into_iter().collect());
        Ok(())
    }

    /// Makes every search fail with `message`, or clears the failure.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] when lock acquisition fails.
    pub fn set_failure(&self, message: Option<String>) -> SearchGatewayResult<()> {
        let mut state = self.write_state()?;
        state.failure = message;
        Ok(())
    }

    /// Makes searches answer for a task other than the one requested.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] when lock acquisition fails.
    pub fn set_malformed(&self, malformed: bool) -> SearchGatewayResult<()> {
        let mut state = self.write_state()?;
        state.malformed = malformed;
        Ok(())
    }

    /// Delays every answer by `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] when lock acquisition fails.
    pub fn set_delay(&self, delay: Option<Duration>) -> SearchGatewayResult<()> {
        let mut state = self.write_state()?;
        state.delay = delay;
        Ok(())
    }

    /// Returns how many searches were requested.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] when lock acquisition fails.
    pub fn call_count(&self) -> SearchGatewayResult<usize> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.calls)
    }
}

#[async_trait]
impl SearchGateway for InMemorySearchGateway {
    async fn search_responders(&self, task: &TaskRecord) -> SearchGatewayResult<SearchOutcome> {
        let (answer, delay) = {
            let mut state = self.write_state()?;
            state.calls += 1;
            let answer = match state.failure.clone() {
                Some(message) => Err(SearchGatewayError::Rejected {
                    task_id: task.id(),
                    message,
                }),
                None => {
                    let candidates = state
                        .candidates_by_requester
                        .get(&task.requester_id())
                        .unwrap_or(&state.default_candidates)
                        .clone();
                    let answered_for = if state.malformed {
                        TaskId::new(task.id().value().wrapping_add(1))
                    } else {
                        task.id()
                    };
                    Ok(SearchOutcome::new(answered_for, candidates))
                }
            };
            (answer, state.delay)
        };

        if let Some(pause) = delay {
            tokio::time::sleep(pause).await;
        }
        answer
    }
}
