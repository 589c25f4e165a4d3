//! Task dispatch: the task manager node of a requester/responder marketplace.
//!
//! Requesters post tasks, a downstream matching service proposes candidate
//! responders, responders accept or decline, the requester picks winners,
//! winners fulfil the task, and the requester closes it out.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure lifecycle logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for the durable store and search
//! - **Adapters**: Concrete implementations of ports
//!
//! # Modules
//!
//! - [`task`]: Task lifecycle engine, live task cache and search dispatch
//! - [`rpc`]: Request/response records and the JSON front end
//! - [`config`]: TOML configuration
//! - [`telemetry`]: Structured logging set-up

pub mod config;
pub mod rpc;
pub mod task;
pub mod telemetry;
