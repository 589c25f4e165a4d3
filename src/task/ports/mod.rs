//! Port contracts for task dispatch.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod persistence;
pub mod search;

pub use persistence::{PersistenceError, PersistenceGateway, PersistenceResult};
pub use search::{SearchGateway, SearchGatewayError, SearchGatewayResult, SearchOutcome};
