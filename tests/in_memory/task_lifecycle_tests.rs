//! End-to-end lifecycle flows against the in-memory adapters.

use super::helpers::{ALICE, BOB, REQUESTER, TestContext, context, context_with_candidates};
use eyre::{Result, ensure};
use rstest::rstest;
use task_dispatch::task::{
    domain::{FulfilStatus, TaskId, TaskStatus, UserId},
    services::{AcceptTaskRequest, ChooseRespondersRequest, FulfilTaskRequest, TaskLifecycleError},
};

async fn statuses_seen_by(
    context: &TestContext,
    user: UserId,
) -> Result<Vec<(TaskId, TaskStatus)>> {
    let views = context.controller.query_user_tasks(user).await?;
    Ok(views.iter().map(|view| (view.id, view.status)).collect())
}

async fn has_no_task(context: &TestContext, user: UserId) -> bool {
    matches!(
        context.controller.query_user_tasks(user).await,
        Err(TaskLifecycleError::UserHasNoTask(_))
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dispatch_scenario_runs_to_fulfilment(context: TestContext) -> Result<()> {
    let id = context.create_settled("Assemble bookshelf").await?;
    ensure!(statuses_seen_by(&context, ALICE).await? == vec![(id, TaskStatus::WaitingAccept)]);
    ensure!(statuses_seen_by(&context, BOB).await? == vec![(id, TaskStatus::WaitingAccept)]);

    context
        .controller
        .accept_task(AcceptTaskRequest::accept(id, ALICE))
        .await?;
    context
        .controller
        .choose_task_responders(ChooseRespondersRequest::new(id, [ALICE]))
        .await?;
    ensure!(has_no_task(&context, BOB).await, "unchosen responder still sees the task");

    context
        .controller
        .fulfil_task(FulfilTaskRequest::new(id, ALICE))
        .await?;

    let views = context.controller.query_user_tasks(REQUESTER).await?;
    let view = views.first().ok_or_else(|| eyre::eyre!("requester lost the task"))?;
    ensure!(view.status == TaskStatus::Fulfilled);
    ensure!(view.fulfil_status == vec![FulfilStatus::Finished]);
    ensure!(view.chosen_responders.iter().map(|user| user.id).eq([ALICE]));

    context.controller.evaluate_and_finish_task(id).await;
    ensure!(has_no_task(&context, REQUESTER).await);
    ensure!(has_no_task(&context, ALICE).await);

    let stored = context
        .persistence
        .stored_task(id)?
        .ok_or_else(|| eyre::eyre!("durable record missing"))?;
    ensure!(stored.status == TaskStatus::Fulfilled);
    ensure!(stored.chosen_responders == vec![ALICE]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requester_tasks_keep_creation_order(context: TestContext) -> Result<()> {
    let first = context.create_settled("First errand").await?;
    let second = context.create_settled("Second errand").await?;
    let third = context.create_settled("Third errand").await?;

    context.controller.evaluate_and_finish_task(second).await;

    let ids: Vec<TaskId> = statuses_seen_by(&context, REQUESTER)
        .await?
        .into_iter()
        .map(|(id, _)| id)
        .collect();
    ensure!(ids == vec![first, third], "unexpected order {ids:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_search_leaves_task_only_with_requester() -> Result<()> {
    let context = context_with_candidates([ALICE]);
    context
        .search
        .set_failure(Some("search node unreachable".to_owned()))?;

    let id = context.create_settled("Water plants").await?;

    ensure!(
        statuses_seen_by(&context, REQUESTER).await?
            == vec![(id, TaskStatus::SearchResponderFailed)]
    );
    ensure!(has_no_task(&context, ALICE).await);
    let accept = context
        .controller
        .accept_task(AcceptTaskRequest::accept(id, ALICE))
        .await;
    ensure!(
        matches!(accept, Err(TaskLifecycleError::Domain(_))),
        "accept on a failed search must be rejected, got {accept:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn responder_without_search_notification_can_accept(context: TestContext) -> Result<()> {
    let walk_in = UserId::new(500);
    let id = context.create_settled("Fix bicycle").await?;

    context
        .controller
        .accept_task(AcceptTaskRequest::accept(id, walk_in))
        .await?;

    ensure!(statuses_seen_by(&context, walk_in).await? == vec![(id, TaskStatus::WaitingChoose)]);
    let views = context.controller.query_user_tasks(walk_in).await?;
    let view = views.first().ok_or_else(|| eyre::eyre!("walk-in lost the task"))?;
    ensure!(view.responders.is_empty(), "unknown profiles are omitted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn finishing_mid_processing_releases_every_participant(context: TestContext) -> Result<()> {
    let id = context.create_settled("Clean gutters").await?;
    for responder in [ALICE, BOB] {
        context
            .controller
            .accept_task(AcceptTaskRequest::accept(id, responder))
            .await?;
    }
    context
        .controller
        .choose_task_responders(ChooseRespondersRequest::new(id, [ALICE, BOB]))
        .await?;
    context
        .controller
        .fulfil_task(FulfilTaskRequest::new(id, BOB))
        .await?;

    context.controller.evaluate_and_finish_task(id).await;
    context.controller.evaluate_and_finish_task(id).await;

    for user in [REQUESTER, ALICE, BOB] {
        ensure!(has_no_task(&context, user).await, "user {user} still sees the task");
    }
    Ok(())
}
