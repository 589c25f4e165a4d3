//! Application services for the task dispatch lifecycle.

mod dispatcher;
mod lifecycle;

pub use dispatcher::{ResponderSearchDispatcher, SearchDispatchSettings, SearchResolution};
pub use lifecycle::{
    AcceptTaskRequest, ChooseRespondersRequest, FulfilTaskRequest, TaskLifecycleController,
    TaskLifecycleError, TaskLifecycleResult,
};
