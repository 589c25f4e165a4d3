//! Runs the task manager node.
//!
//! Usage:
//!
//! ```text
//! task-manager [--conf <config-path>]
//! ```
//!
//! The configuration defaults to `./task_manager.toml`. The node serves the
//! line-delimited JSON front end on the configured address until it receives
//! Ctrl-C. The durable store and the responder search are the in-memory
//! adapters, seeded from the `[local]` section of the configuration.

use std::sync::Arc;

use mockable::DefaultClock;
use task_dispatch::{
    config::{ConfigError, TaskManagerConfig},
    rpc::{TaskManagerRpc, server},
    task::{
        adapters::memory::{InMemoryPersistenceGateway, InMemorySearchGateway},
        ports::PersistenceError,
        services::{TaskLifecycleController, TaskLifecycleError},
    },
    telemetry::{self, TelemetryError},
};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "./task_manager.toml";

#[derive(Debug, Error)]
enum StartupError {
    #[error("usage: task-manager [--conf <config-path>]")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error(transparent)]
    Seed(#[from] PersistenceError),
    #[error(transparent)]
    Bootstrap(#[from] TaskLifecycleError),
    #[error("front end failed: {0}")]
    Io(#[from] std::io::Error),
}

fn config_path_from_args() -> Result<String, StartupError> {
    let mut args = std::env::args().skip(1);
    match (args.next(), args.next(), args.next()) {
        (None, None, None) => Ok(DEFAULT_CONFIG_PATH.to_owned()),
        (Some(flag), Some(path), None) if flag == "--conf" => Ok(path),
        _ => Err(StartupError::Usage),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}

async fn run() -> Result<(), StartupError> {
    let config = TaskManagerConfig::load(config_path_from_args()?)?;
    telemetry::init_tracing(&config.log_filter)?;
    info!(
        addr = %config.addr,
        search_addr = %config.search_addr,
        tasks_store = %config.tasks_store.name,
        users_store = %config.users_store.name,
        "starting task manager"
    );

    let persistence = Arc::new(InMemoryPersistenceGateway::new());
    for user in config.local.users.iter().cloned() {
        persistence.insert_user(user)?;
    }
    let search = Arc::new(InMemorySearchGateway::with_default_candidates(
        config.local.search_candidates.iter().copied(),
    ));

    let controller = Arc::new(TaskLifecycleController::new(
        persistence,
        search,
        Arc::new(DefaultClock),
        config.search_dispatch.settings(),
    ));
    controller.bootstrap().await?;

    let listener = TcpListener::bind(config.bind_addr()?).await?;
    info!(addr = %listener.local_addr()?, "task manager listening");
    server::serve(listener, TaskManagerRpc::new(controller), shutdown_signal()).await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    run()
        .await
        .inspect_err(|err| error!(error = %err, "task manager stopped"))
}
