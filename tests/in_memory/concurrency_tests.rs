//! Parallel callers racing on shared tasks.

use std::collections::HashSet;
use std::sync::Arc;

use super::helpers::{ALICE, REQUESTER, TestContext, context};
use eyre::{Result, ensure};
use rstest::rstest;
use task_dispatch::task::{
    domain::{TaskDescriptor, TaskStatus, UserId},
    services::AcceptTaskRequest,
};
use tokio::task::JoinSet;

#[rstest]
#[case(8)]
#[case(64)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accepts_are_all_recorded(
    context: TestContext,
    #[case] responders: u32,
) -> Result<()> {
    let id = context.create_settled("Move house").await?;

    let mut accepts = JoinSet::new();
    for n in 0..responders {
        let controller = Arc::clone(&context.controller);
        accepts.spawn(async move {
            controller
                .accept_task(AcceptTaskRequest::accept(id, UserId::new(1_000 + n)))
                .await
        });
    }
    while let Some(joined) = accepts.join_next().await {
        joined??;
    }

    let state = context.controller.store().read().await;
    let task = state
        .get(id)
        .ok_or_else(|| eyre::eyre!("task evicted unexpectedly"))?;
    let unique: HashSet<UserId> = task.candidate_responders().iter().copied().collect();
    ensure!(task.status() == TaskStatus::WaitingChoose);
    ensure!(task.candidate_responders().len() == usize::try_from(responders)?);
    ensure!(unique.len() == task.candidate_responders().len(), "duplicate candidates");
    for n in 0..responders {
        ensure!(state.user_task_ids(UserId::new(1_000 + n)) == Some(&[id][..]));
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creations_are_all_indexed(context: TestContext) -> Result<()> {
    let mut creations = JoinSet::new();
    for n in 0..32 {
        let controller = Arc::clone(&context.controller);
        creations.spawn(async move {
            let descriptor = TaskDescriptor::new(REQUESTER, format!("errand {n}"))?;
            Ok::<_, eyre::Report>(controller.create_task(descriptor).await?)
        });
    }
    let mut ids = HashSet::new();
    while let Some(joined) = creations.join_next().await {
        ids.insert(joined??);
    }
    context.controller.dispatcher().wait_idle().await;

    ensure!(ids.len() == 32, "task ids must be unique");
    let state = context.controller.store().read().await;
    let listed = state.user_task_ids(ALICE).map_or(0, <[_]>::len);
    ensure!(listed == 32);
    ensure!(context.search.call_count()? == 32);
    Ok(())
}
