//! Domain model for the task dispatch lifecycle.
//!
//! Tasks are posted by a requester, offered to candidate responders found by
//! the search service, accepted, assigned and fulfilled. All infrastructure
//! concerns stay outside of the domain boundary.

mod error;
mod ids;
mod status;
mod task;
mod user;
mod view;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::{TaskId, UserId};
pub use status::{Decision, FulfilStatus, TaskStatus};
pub use task::{NewTask, TaskDescriptor, TaskRecord};
pub use user::UserInfo;
pub use view::TaskView;
