//! Line-delimited JSON front end over TCP.
//!
//! Each request is one JSON object per line, `{"method": ..., "params": ...}`,
//! answered by exactly one JSON line. Connections are served concurrently.

use super::{CommResp, ErrorCode, RpcRequest, RpcResponse, TaskManagerRpc};
use crate::task::ports::{PersistenceGateway, SearchGateway};
use mockable::Clock;
use std::future::Future;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Longest request line accepted, newline included.
///
/// Longer lines are skipped up to the next newline and answered with
/// [`ErrorCode::InvalidTaskRequest`].
pub const MAX_REQUEST_LINE_BYTES: usize = 64 * 1024;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Decodes one request line and produces the reply.
///
/// Lines that are not a valid request are answered with
/// [`ErrorCode::InvalidTaskRequest`].
pub async fn answer_line<P, S, C>(rpc: &TaskManagerRpc<P, S, C>, line: &str) -> RpcResponse
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => rpc.handle(request).await,
        Err(err) => {
            warn!(error = %err, "malformed request line");
            invalid_request()
        }
    }
}

fn invalid_request() -> RpcResponse {
    RpcResponse::Comm(CommResp::from_code(ErrorCode::InvalidTaskRequest))
}

#[derive(Debug, PartialEq, Eq)]
enum RequestLine {
    Text(String),
    TooLong,
}

async fn read_bounded<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let limit = u64::try_from(MAX_REQUEST_LINE_BYTES).unwrap_or(u64::MAX);
    (&mut *reader).take(limit).read_until(b'\n', buf).await
}

/// Reads the next request line without buffering more than
/// [`MAX_REQUEST_LINE_BYTES`]. `None` means the peer closed the connection.
async fn read_request_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<Option<RequestLine>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if read_bounded(reader, buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') || buf.len() < MAX_REQUEST_LINE_BYTES {
        let text = String::from_utf8_lossy(buf).into_owned();
        return Ok(Some(RequestLine::Text(text)));
    }

    loop {
        buf.clear();
        if read_bounded(reader, buf).await? == 0 || buf.last() == Some(&b'\n') {
            return Ok(Some(RequestLine::TooLong));
        }
    }
}

async fn serve_connection<P, S, C>(
    stream: TcpStream,
    rpc: TaskManagerRpc<P, S, C>,
) -> io::Result<()>
where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    while let Some(line) = read_request_line(&mut reader, &mut buf).await? {
        let response = match line {
            RequestLine::Text(text) if text.trim().is_empty() => continue,
            RequestLine::Text(text) => answer_line(&rpc, &text).await,
            RequestLine::TooLong => {
                warn!(limit = MAX_REQUEST_LINE_BYTES, "request line too long");
                invalid_request()
            }
        };
        let mut payload = serde_json::to_vec(&response).map_err(io::Error::other)?;
        payload.push(b'\n');
        writer.write_all(&payload).await?;
    }
    Ok(())
}

/// Serves connections from `listener` until `shutdown` resolves.
///
/// A failed accept is logged and retried after a short pause. Open
/// connections are dropped on shutdown and outstanding responder searches are
/// drained before returning.
pub async fn serve<P, S, C, F>(
    listener: TcpListener,
    rpc: TaskManagerRpc<P, S, C>,
    shutdown: F,
) where
    P: PersistenceGateway + 'static,
    S: SearchGateway + 'static,
    C: Clock + Send + Sync + 'static,
    F: Future<Output = ()>,
{
    let mut shutdown = std::pin::pin!(shutdown);
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            () = &mut shutdown => break,
            accepted = listener.accept() => {
                let (stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(err) => {
                        warn!(error = %err, "failed to accept connection, retrying");
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                        continue;
                    }
                };
                debug!(%peer, "connection accepted");
                let rpc = rpc.clone();
                connections.spawn(async move {
                    if let Err(err) = serve_connection(stream, rpc).await {
                        warn!(%peer, error = %err, "connection closed with error");
                    }
                });
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
        }
    }

    connections.abort_all();
    while connections.join_next().await.is_some() {}
    rpc.controller().dispatcher().wait_idle().await;
    info!("task manager front end stopped");
}
