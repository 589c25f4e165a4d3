//! Downstream responder search port.

use crate::task::domain::{TaskId, TaskRecord, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for responder search calls.
pub type SearchGatewayResult<T> = Result<T, SearchGatewayError>;

/// Candidate responders proposed for a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Task the candidates were selected for.
    pub task_id: TaskId,
    /// Candidate responder identities in ranking order.
    pub candidate_responder_ids: Vec<UserId>,
}

impl SearchOutcome {
    /// Creates a search outcome.
    #[must_use]
    pub fn new(task_id: TaskId, candidate_responder_ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            task_id,
            candidate_responder_ids: candidate_responder_ids.into_iter().collect(),
        }
    }
}

/// Matching service contract selecting candidate responders for a task.
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Returns candidate responders for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchGatewayError`] on transport or logical failures.
    async fn search_responders(&self, task: &TaskRecord) -> SearchGatewayResult<SearchOutcome>;
}

/// Errors returned by responder search implementations.
#[derive(Debug, Clone, Error)]
pub enum SearchGatewayError {
    /// The search service answered with a failure code.
    #[error("search service rejected task {task_id}: {message}")]
    Rejected {
        /// Task that was searched for.
        task_id: TaskId,
        /// Message reported by the search service.
        message: String,
    },

    /// The search service could not be reached.
    #[error("search transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl SearchGatewayError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
