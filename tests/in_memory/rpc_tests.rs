//! Request records, outcome codes and the line-delimited JSON front end.

use std::sync::Arc;
use std::time::Duration;

use super::helpers::{ALICE, BOB, TestContext, context};
use eyre::{Result, WrapErr, ensure};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};
use task_dispatch::rpc::{ErrorCode, RpcResponse, TaskManagerRpc, server};
use task_dispatch::task::adapters::memory::{InMemoryPersistenceGateway, InMemorySearchGateway};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

type TestRpc = TaskManagerRpc<InMemoryPersistenceGateway, InMemorySearchGateway, DefaultClock>;

fn rpc(context: &TestContext) -> TestRpc {
    TaskManagerRpc::new(Arc::clone(&context.controller))
}

async fn call(rpc: &TestRpc, request: &Value) -> Result<Value> {
    let response = server::answer_line(rpc, &request.to_string()).await;
    serde_json::to_value(&response).wrap_err("encode response")
}

fn error_code(reply: &Value) -> Option<i64> {
    reply.pointer("/comm/errorCode").and_then(Value::as_i64)
}

async fn created_task(rpc: &TestRpc) -> Result<u64> {
    let reply = call(
        rpc,
        &json!({
            "method": "createTask",
            "params": {"createInfo": {"requesterId": 100, "title": "Hang shelves"}}
        }),
    )
    .await?;
    ensure!(error_code(&reply) == Some(0), "create failed: {reply}");
    let id = reply
        .get("taskId")
        .and_then(Value::as_u64)
        .ok_or_else(|| eyre::eyre!("missing task id in {reply}"))?;
    rpc.controller().dispatcher().wait_idle().await;
    Ok(id)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_and_query_over_records(context: TestContext) -> Result<()> {
    let rpc = rpc(&context);
    let id = created_task(&rpc).await?;

    let reply = call(&rpc, &json!({"method": "queryUserTasks", "params": {"userId": 200}})).await?;

    ensure!(error_code(&reply) == Some(0));
    ensure!(reply.pointer("/tasks/0/id").and_then(Value::as_u64) == Some(id));
    ensure!(reply.pointer("/tasks/0/status").and_then(Value::as_str) == Some("waiting_accept"));
    ensure!(
        reply.pointer("/tasks/0/requester/nickname").and_then(Value::as_str) == Some("rhea")
    );
    Ok(())
}

#[rstest]
#[case(json!({"method": "queryUserTasks", "params": {"userId": 999}}), ErrorCode::UserHasNoTask)]
#[case(
    json!({
        "method": "acceptTask",
        "params": {"taskId": 42, "responderId": 200, "decision": "accept"}
    }),
    ErrorCode::NoSuchTask
)]
#[case(
    json!({"method": "fulfilTask", "params": {"taskId": 42, "responderId": 200}}),
    ErrorCode::NoSuchTask
)]
#[case(
    json!({
        "method": "createTask",
        "params": {"createInfo": {"requesterId": 100, "title": "  "}}
    }),
    ErrorCode::InvalidTaskRequest
)]
#[case(json!({"method": "launchRocket", "params": {}}), ErrorCode::InvalidTaskRequest)]
#[case(json!({"method": "evaluateAndFinishTask", "params": {"taskId": 42}}), ErrorCode::Ok)]
#[tokio::test(flavor = "multi_thread")]
async fn calls_answer_with_expected_codes(
    context: TestContext,
    #[case] request: Value,
    #[case] expected: ErrorCode,
) -> Result<()> {
    let reply = call(&rpc(&context), &request).await?;

    ensure!(
        error_code(&reply) == Some(i64::from(expected.value())),
        "expected {expected}, got {reply}"
    );
    ensure!(
        reply.pointer("/comm/errorMessage").and_then(Value::as_str) == Some(expected.message())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn choosing_before_acceptance_reports_invalid_status(context: TestContext) -> Result<()> {
    let rpc = rpc(&context);
    let id = created_task(&rpc).await?;

    let reply = call(
        &rpc,
        &json!({
            "method": "chooseTaskResponders",
            "params": {"taskId": id, "chosenResponderIds": [200]}
        }),
    )
    .await?;

    ensure!(error_code(&reply) == Some(i64::from(ErrorCode::InvalidTaskStatus.value())));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_update_is_reported_with_its_code(context: TestContext) -> Result<()> {
    let rpc = rpc(&context);
    let id = created_task(&rpc).await?;
    context.persistence.set_task_writes_failing(true)?;

    let reply = call(
        &rpc,
        &json!({
            "method": "acceptTask",
            "params": {"taskId": id, "responderId": ALICE, "decision": "accept"}
        }),
    )
    .await?;

    ensure!(error_code(&reply) == Some(i64::from(ErrorCode::UpdateTaskInfoFailed.value())));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_line_is_rejected(context: TestContext) {
    let response = server::answer_line(&rpc(&context), "{not json").await;

    assert!(matches!(response, RpcResponse::Comm(_)));
    assert_eq!(response.comm().code(), Some(ErrorCode::InvalidTaskRequest));
}

async fn exchange(
    lines: &mut tokio::io::Lines<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    request: &Value,
) -> Result<Value> {
    let mut payload = request.to_string().into_bytes();
    payload.push(b'\n');
    writer.write_all(&payload).await?;
    let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
        .await
        .wrap_err("reply timed out")??
        .ok_or_else(|| eyre::eyre!("connection closed before reply"))?;
    serde_json::from_str(&line).wrap_err("decode reply")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tcp_front_end_serves_json_lines_until_shutdown(context: TestContext) -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, rpc(&context), async move {
        drop(stopped.await);
    }));

    let (reader, mut writer) = TcpStream::connect(addr).await?.into_split();
    let mut lines = BufReader::new(reader).lines();

    let created = exchange(
        &mut lines,
        &mut writer,
        &json!({
            "method": "createTask",
            "params": {"createInfo": {"requesterId": 100, "title": "Tile bathroom"}}
        }),
    )
    .await?;
    ensure!(error_code(&created) == Some(0), "create failed: {created}");
    context.controller.dispatcher().wait_idle().await;

    let garbage = exchange(&mut lines, &mut writer, &json!("hello")).await?;
    ensure!(error_code(&garbage) == Some(i64::from(ErrorCode::InvalidTaskRequest.value())));

    let queried = exchange(
        &mut lines,
        &mut writer,
        &json!({"method": "queryUserTasks", "params": {"userId": BOB}}),
    )
    .await?;
    ensure!(queried.pointer("/tasks/0/status").and_then(Value::as_str) == Some("waiting_accept"));

    stop.send(()).map_err(|()| eyre::eyre!("server stopped early"))?;
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .wrap_err("server did not stop")??;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overlong_request_line_is_rejected_without_dropping_the_connection(
    context: TestContext,
) -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(server::serve(listener, rpc(&context), async move {
        drop(stopped.await);
    }));

    let (reader, mut writer) = TcpStream::connect(addr).await?.into_split();
    let mut lines = BufReader::new(reader).lines();

    let mut oversized = vec![b' '; server::MAX_REQUEST_LINE_BYTES + 1];
    oversized.push(b'\n');
    writer.write_all(&oversized).await?;
    let rejected = exchange(
        &mut lines,
        &mut writer,
        &json!({"method": "queryUserTasks", "params": {"userId": 999}}),
    )
    .await?;
    ensure!(
        error_code(&rejected) == Some(i64::from(ErrorCode::InvalidTaskRequest.value())),
        "overlong line not rejected: {rejected}"
    );

    let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
        .await
        .wrap_err("reply timed out")??
        .ok_or_else(|| eyre::eyre!("connection closed after overlong line"))?;
    let queried: Value = serde_json::from_str(&line).wrap_err("decode reply")?;
    ensure!(error_code(&queried) == Some(i64::from(ErrorCode::UserHasNoTask.value())));

    stop.send(()).map_err(|()| eyre::eyre!("server stopped early"))?;
    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .wrap_err("server did not stop")??;
    Ok(())
}
