//! Maps RPC records onto lifecycle operations.

use super::{
    AcceptTaskReq, ChooseTaskRespondersReq, CommResp, CreateTaskReq, CreateTaskResp,
    ErrorCode, EvaluateAndFinishTaskReq, FulfilTaskReq, QueryUserTasksReq, QueryUserTasksResp,
    RespComm, RpcRequest, RpcResponse,
};
use crate::task::{
    ports::{PersistenceGateway, SearchGateway},
    services::{
        AcceptTaskRequest, ChooseRespondersRequest, FulfilTaskRequest, TaskLifecycleController,
        TaskLifecycleError,
    },
};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Task manager RPC endpoint.
///
/// Every method answers with an envelope; lifecycle errors become outcome
/// codes and never escape as transport errors.
pub struct TaskManagerRpc<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    controller: Arc<TaskLifecycleController<P, S, C>>,
}

impl<P, S, C> Clone for TaskManagerRpc<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

fn comm_for<T>(result: &Result<T, TaskLifecycleError>) -> RespComm {
    match result {
        Ok(_) => RespComm::ok(),
        Err(err) => {
            let code = ErrorCode::from(err);
            debug!(code = code.value(), error = %err, "lifecycle call rejected");
            RespComm::from_code(code)
        }
    }
}

impl<P, S, C> TaskManagerRpc<P, S, C>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an endpoint backed by `controller`.
    #[must_use]
    pub const fn new(controller: Arc<TaskLifecycleController<P, S, C>>) -> Self {
        Self { controller }
    }

    /// Returns the lifecycle controller.
    #[must_use]
    pub const fn controller(&self) -> &Arc<TaskLifecycleController<P, S, C>> {
        &self.controller
    }

    /// Posts a task.
    pub async fn create_task(&self, req: CreateTaskReq) -> CreateTaskResp {
        let result = self.controller.create_task(req.create_info).await;
        CreateTaskResp {
            comm: comm_for(&result),
            task_id: result.ok(),
        }
    }

    /// Lists a user's tasks.
    pub async fn query_user_tasks(&self, req: QueryUserTasksReq) -> QueryUserTasksResp {
        let result = self.controller.query_user_tasks(req.user_id).await;
        QueryUserTasksResp {
            comm: comm_for(&result),
            tasks: result.unwrap_or_default(),
        }
    }

    /// Records a responder's answer.
    pub async fn accept_task(&self, req: AcceptTaskReq) -> CommResp {
        let request = AcceptTaskRequest {
            task_id: req.task_id,
            responder_id: req.responder_id,
            decision: req.decision,
        };
        let result = self.controller.accept_task(request).await;
        CommResp {
            comm: comm_for(&result),
        }
    }

    /// Records the requester's choice of responders.
    pub async fn choose_task_responders(&self, req: ChooseTaskRespondersReq) -> CommResp {
        let request = ChooseRespondersRequest::new(req.task_id, req.chosen_responder_ids);
        let result = self.controller.choose_task_responders(request).await;
        CommResp {
            comm: comm_for(&result),
        }
    }

    /// Records a responder's completion report.
    pub async fn fulfil_task(&self, req: FulfilTaskReq) -> CommResp {
        let request = FulfilTaskRequest::new(req.task_id, req.responder_id);
        let result = self.controller.fulfil_task(request).await;
        CommResp {
            comm: comm_for(&result),
        }
    }

    /// Closes a task after evaluation.
    pub async fn evaluate_and_finish_task(&self, req: EvaluateAndFinishTaskReq) -> CommResp {
        self.controller.evaluate_and_finish_task(req.task_id).await;
        CommResp::from_code(ErrorCode::Ok)
    }

    /// Routes a decoded call to its operation.
    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        match request {
            RpcRequest::CreateTask(req) => RpcResponse::CreateTask(self.create_task(req).await),
            RpcRequest::QueryUserTasks(req) => {
                RpcResponse::QueryUserTasks(self.query_user_tasks(req).await)
            }
            RpcRequest::AcceptTask(req) => RpcResponse::Comm(self.accept_task(req).await),
            RpcRequest::ChooseTaskResponders(req) => {
                RpcResponse::Comm(self.choose_task_responders(req).await)
            }
            RpcRequest::FulfilTask(req) => RpcResponse::Comm(self.fulfil_task(req).await),
            RpcRequest::EvaluateAndFinishTask(req) => {
                RpcResponse::Comm(self.evaluate_and_finish_task(req).await)
            }
        }
    }
}
