//! When steps for task dispatch BDD scenarios.

use super::world::{DispatchWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use task_dispatch::task::{
    domain::UserId,
    services::{AcceptTaskRequest, ChooseRespondersRequest, FulfilTaskRequest},
};

#[when("the responder search completes")]
fn search_completes(world: &mut DispatchWorld) {
    run_async(world.controller.dispatcher().wait_idle());
}

#[when("user {responder:u32} accepts the task")]
fn user_accepts(world: &mut DispatchWorld, responder: u32) -> Result<(), eyre::Report> {
    let request = AcceptTaskRequest::accept(world.task_id()?, UserId::new(responder));
    world.last_result = Some(run_async(world.controller.accept_task(request)));
    Ok(())
}

#[when("the requester chooses user {responder:u32}")]
fn requester_chooses(world: &mut DispatchWorld, responder: u32) -> Result<(), eyre::Report> {
    let request = ChooseRespondersRequest::new(world.task_id()?, [UserId::new(responder)]);
    world.last_result = Some(run_async(world.controller.choose_task_responders(request)));
    Ok(())
}

#[when("user {responder:u32} fulfils the task")]
fn user_fulfils(world: &mut DispatchWorld, responder: u32) -> Result<(), eyre::Report> {
    let request = FulfilTaskRequest::new(world.task_id()?, UserId::new(responder));
    world.last_result = Some(run_async(world.controller.fulfil_task(request)));
    Ok(())
}

#[when("the durable store starts rejecting writes")]
fn store_rejects_writes(world: &mut DispatchWorld) -> Result<(), eyre::Report> {
    world
        .persistence
        .set_task_writes_failing(true)
        .wrap_err("configure write failure")
}

#[when("the requester evaluates and finishes the task")]
fn requester_finishes(world: &mut DispatchWorld) -> Result<(), eyre::Report> {
    let id = world.task_id()?;
    run_async(world.controller.evaluate_and_finish_task(id));
    world.last_result = Some(Ok(()));
    Ok(())
}
