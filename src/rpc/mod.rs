//! RPC surface of the task manager node.
//!
//! One method per lifecycle operation. Each takes a request record and
//! answers with a response record carrying the common
//! `{errorCode, errorMessage}` envelope plus the operation's payload.

mod codes;
mod handler;
mod messages;
pub mod server;

pub use codes::ErrorCode;
pub use handler::TaskManagerRpc;
pub use messages::{
    AcceptTaskReq, ChooseTaskRespondersReq, CommResp, CreateTaskReq, CreateTaskResp,
    EvaluateAndFinishTaskReq, FulfilTaskReq, QueryUserTasksReq, QueryUserTasksResp, RespComm,
    RpcRequest, RpcResponse,
};
