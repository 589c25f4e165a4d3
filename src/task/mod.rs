//! Task lifecycle engine of the task manager node.
//!
//! Requesters post tasks, a downstream search proposes candidate responders,
//! responders accept or decline, the requester chooses who does the work,
//! chosen responders report fulfilment and the requester finally evaluates
//! and closes the task. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - The live task cache in [`store`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
pub mod store;

#[cfg(test)]
mod tests;
