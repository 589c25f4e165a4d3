//! Request and response records of the task manager RPC surface.

use super::ErrorCode;
use crate::task::domain::{Decision, TaskDescriptor, TaskId, TaskView, UserId};
use serde::{Deserialize, Serialize};

/// Envelope shared by every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespComm {
    /// Numeric outcome code, `0` on success.
    pub error_code: i32,
    /// Human-readable outcome message.
    pub error_message: String,
}

impl RespComm {
    /// Builds the envelope for `code`.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            error_code: code.value(),
            error_message: code.message().to_owned(),
        }
    }

    /// Builds a success envelope.
    #[must_use]
    pub fn ok() -> Self {
        Self::from_code(ErrorCode::Ok)
    }

    /// Returns the decoded outcome code, if known.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        ErrorCode::from_value(self.error_code)
    }
}

/// Request to post a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskReq {
    /// Creation payload.
    pub create_info: TaskDescriptor,
}

/// Response to [`CreateTaskReq`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskResp {
    /// Outcome envelope.
    pub comm: RespComm,
    /// Identifier of the created task on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

/// Request for the tasks relevant to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryUserTasksReq {
    /// User whose tasks are listed.
    pub user_id: UserId,
}

/// Response to [`QueryUserTasksReq`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryUserTasksResp {
    /// Outcome envelope.
    pub comm: RespComm,
    /// Decorated tasks in the user's index order.
    #[serde(default)]
    pub tasks: Vec<TaskView>,
}

/// A responder's answer to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptTaskReq {
    /// Task being answered.
    pub task_id: TaskId,
    /// Responder answering.
    pub responder_id: UserId,
    /// Accept or decline.
    pub decision: Decision,
}

/// The requester's choice of responders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChooseTaskRespondersReq {
    /// Task being assigned.
    pub task_id: TaskId,
    /// Responders selected to do the work.
    pub chosen_responder_ids: Vec<UserId>,
}

/// A chosen responder reporting completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfilTaskReq {
    /// Task being fulfilled.
    pub task_id: TaskId,
    /// Responder reporting completion.
    pub responder_id: UserId,
}

/// The requester closing a task after evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAndFinishTaskReq {
    /// Task being closed.
    pub task_id: TaskId,
}

/// Response carrying only the outcome envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommResp {
    /// Outcome envelope.
    pub comm: RespComm,
}

impl CommResp {
    /// Builds a response for `code`.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            comm: RespComm::from_code(code),
        }
    }
}

/// One call on the line-delimited JSON front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params", rename_all = "camelCase")]
pub enum RpcRequest {
    /// See [`CreateTaskReq`].
    CreateTask(CreateTaskReq),
    /// See [`QueryUserTasksReq`].
    QueryUserTasks(QueryUserTasksReq),
    /// See [`AcceptTaskReq`].
    AcceptTask(AcceptTaskReq),
    /// See [`ChooseTaskRespondersReq`].
    ChooseTaskResponders(ChooseTaskRespondersReq),
    /// See [`FulfilTaskReq`].
    FulfilTask(FulfilTaskReq),
    /// See [`EvaluateAndFinishTaskReq`].
    EvaluateAndFinishTask(EvaluateAndFinishTaskReq),
}

/// Reply to an [`RpcRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RpcResponse {
    /// Reply to a create call.
    CreateTask(CreateTaskResp),
    /// Reply to a query call.
    QueryUserTasks(QueryUserTasksResp),
    /// Reply to any call answered with the envelope only.
    Comm(CommResp),
}

impl RpcResponse {
    /// Returns the outcome envelope.
    #[must_use]
    pub const fn comm(&self) -> &RespComm {
        match self {
            Self::CreateTask(resp) => &resp.comm,
            Self::QueryUserTasks(resp) => &resp.comm,
            Self::Comm(resp) => &resp.comm,
        }
    }
}
