//! In-memory adapters for the durable store and the responder search.
//!
//! Both adapters are deterministic and support failure injection, which makes
//! them suitable for tests and for running the task manager locally without
//! external services.

mod persistence;
mod search;

pub use persistence::{InMemoryPersistenceGateway, StoredTask};
pub use search::InMemorySearchGateway;
