//! Then steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use rstest_bdd_macros::then;
use task_dispatch::{
    rpc::ErrorCode,
    task::{
        domain::{FulfilStatus, TaskStatus, UserId},
        services::TaskLifecycleError,
    },
};

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &DispatchWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let id = world.task_id()?;
    let actual = run_async(world.controller.store().read())
        .get(id)
        .map(|task| task.status())
        .ok_or_else(|| eyre::eyre!("task {id} is no longer live"))?;

    if actual != expected {
        return Err(eyre::eyre!("expected status {expected}, found {actual}"));
    }
    Ok(())
}

#[then("user {user:u32} sees the task")]
fn user_sees_task(world: &DispatchWorld, user: u32) -> Result<(), eyre::Report> {
    let id = world.task_id()?;
    let views = run_async(world.controller.query_user_tasks(UserId::new(user)))?;
    if !views.iter().any(|view| view.id == id) {
        return Err(eyre::eyre!("user {user} does not see task {id}"));
    }
    Ok(())
}

#[then("user {user:u32} has no task")]
fn user_has_no_task(world: &DispatchWorld, user: u32) -> Result<(), eyre::Report> {
    let result = run_async(world.controller.query_user_tasks(UserId::new(user)));
    if !matches!(result, Err(TaskLifecycleError::UserHasNoTask(_))) {
        return Err(eyre::eyre!("expected UserHasNoTask for user {user}, got {result:?}"));
    }
    Ok(())
}

#[then("the last call succeeded")]
fn last_call_succeeded(world: &DispatchWorld) -> Result<(), eyre::Report> {
    match &world.last_result {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(eyre::eyre!("expected success, got {err}")),
        None => Err(eyre::eyre!("no call recorded in scenario world")),
    }
}

#[then("the last call fails with code {code:i32}")]
fn last_call_fails_with(world: &DispatchWorld, code: i32) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no call recorded in scenario world"))?;
    let Err(err) = result else {
        return Err(eyre::eyre!("expected failure code {code}, call succeeded"));
    };

    let actual = ErrorCode::from(err);
    if actual.value() != code {
        return Err(eyre::eyre!("expected code {code}, got {actual}"));
    }
    Ok(())
}

#[then("no chosen responder has finished")]
fn no_responder_finished(world: &DispatchWorld) -> Result<(), eyre::Report> {
    let id = world.task_id()?;
    let state = run_async(world.controller.store().read());
    let task = state
        .get(id)
        .ok_or_else(|| eyre::eyre!("task {id} is no longer live"))?;

    if task.fulfil_status().contains(&FulfilStatus::Finished) {
        return Err(eyre::eyre!(
            "expected no finished responder, found {:?}",
            task.fulfil_status()
        ));
    }
    Ok(())
}
