//! Read model returned by user task queries.

use super::{FulfilStatus, TaskDescriptor, TaskId, TaskRecord, TaskStatus, UserInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task decorated with the profiles of the users involved.
///
/// Profiles that could not be resolved are left out rather than failing the
/// whole view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task identifier.
    pub id: TaskId,
    /// Lifecycle status when the view was taken.
    pub status: TaskStatus,
    /// Creation payload.
    pub descriptor: TaskDescriptor,
    /// Fulfilment flags parallel to the chosen responders.
    pub fulfil_status: Vec<FulfilStatus>,
    /// Requester profile, when it could be resolved.
    pub requester: Option<UserInfo>,
    /// Profiles of responders who accepted.
    pub responders: Vec<UserInfo>,
    /// Profiles of chosen responders; empty before processing starts.
    pub chosen_responders: Vec<UserInfo>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    /// Starts a view from a record snapshot with no profiles resolved yet.
    #[must_use]
    pub fn undecorated(record: &TaskRecord) -> Self {
        Self {
            id: record.id(),
            status: record.status(),
            descriptor: record.descriptor().clone(),
            fulfil_status: record.fulfil_status().to_vec(),
            requester: None,
            responders: Vec::new(),
            chosen_responders: Vec::new(),
            created_at: record.created_at(),
            updated_at: record.updated_at(),
        }
    }
}
