//! Shared fixtures for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use task_dispatch::task::{
    adapters::memory::{InMemoryPersistenceGateway, InMemorySearchGateway},
    domain::{TaskDescriptor, TaskId, UserId, UserInfo},
    services::{SearchDispatchSettings, TaskLifecycleController},
};

/// Requester used by the shared scenarios.
pub const REQUESTER: UserId = UserId::new(100);
/// First responder proposed by the search.
pub const ALICE: UserId = UserId::new(200);
/// Second responder proposed by the search.
pub const BOB: UserId = UserId::new(300);

/// Controller type wired to in-memory adapters.
pub type TestController =
    TaskLifecycleController<InMemoryPersistenceGateway, InMemorySearchGateway, DefaultClock>;

/// Controller plus handles on its adapters.
pub struct TestContext {
    pub persistence: Arc<InMemoryPersistenceGateway>,
    pub search: Arc<InMemorySearchGateway>,
    pub controller: Arc<TestController>,
}

impl TestContext {
    /// Creates a task for [`REQUESTER`] and waits for its search.
    pub async fn create_settled(&self, title: &str) -> eyre::Result<TaskId> {
        let descriptor = TaskDescriptor::new(REQUESTER, title)?;
        let id = self.controller.create_task(descriptor).await?;
        self.controller.dispatcher().wait_idle().await;
        Ok(id)
    }
}

/// Builds a context whose search proposes `candidates` for every task.
pub fn context_with_candidates(candidates: impl IntoIterator<Item = UserId>) -> TestContext {
    let persistence = Arc::new(InMemoryPersistenceGateway::new());
    for (id, nickname) in [(REQUESTER, "rhea"), (ALICE, "alice"), (BOB, "bob")] {
        let user = UserInfo::new(id, nickname).with_contact(format!("{nickname}@example.org"));
        persistence.insert_user(user).expect("seed user profile");
    }
    let search = Arc::new(InMemorySearchGateway::with_default_candidates(candidates));
    let controller = Arc::new(TaskLifecycleController::new(
        Arc::clone(&persistence),
        Arc::clone(&search),
        Arc::new(DefaultClock),
        SearchDispatchSettings::default(),
    ));
    TestContext {
        persistence,
        search,
        controller,
    }
}

/// Fixture proposing [`ALICE`] and [`BOB`] for every task.
#[fixture]
pub fn context() -> TestContext {
    context_with_candidates([ALICE, BOB])
}
