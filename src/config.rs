//! Task manager configuration loaded from TOML.
//!
//! ```toml
//! addr = "127.0.0.1:7301"
//! search_addr = "127.0.0.1:7302"
//! log_filter = "info"
//!
//! [tasks_store]
//! name = "tasks"
//! addrs = ["127.0.0.1:7401"]
//!
//! [users_store]
//! name = "users"
//! addrs = ["127.0.0.1:7402"]
//!
//! [search_dispatch]
//! max_concurrent_searches = 64
//! search_timeout_ms = 10000
//! ```

use crate::task::{
    domain::{UserId, UserInfo},
    services::SearchDispatchSettings,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An address field is not a socket address.
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// A limit that must be positive is zero.
    #[error("{0} must be greater than zero")]
    ZeroLimit(&'static str),
}

/// Connection descriptor of a durable store cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoreDescriptor {
    /// Logical store name.
    #[serde(default)]
    pub name: String,
    /// Store node addresses.
    #[serde(default)]
    pub addrs: Vec<String>,
}

/// Limits for background responder searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchDispatchConfig {
    /// Maximum number of concurrent search calls.
    pub max_concurrent_searches: usize,
    /// Deadline for one search call, in milliseconds.
    pub search_timeout_ms: u64,
}

impl Default for SearchDispatchConfig {
    fn default() -> Self {
        let settings = SearchDispatchSettings::default();
        Self {
            max_concurrent_searches: settings.max_concurrent_searches,
            search_timeout_ms: u64::try_from(settings.search_timeout.as_millis())
                .unwrap_or(u64::MAX),
        }
    }
}

impl SearchDispatchConfig {
    /// Converts into dispatcher settings.
    #[must_use]
    pub const fn settings(&self) -> SearchDispatchSettings {
        SearchDispatchSettings {
            max_concurrent_searches: self.max_concurrent_searches,
            search_timeout: Duration::from_millis(self.search_timeout_ms),
        }
    }
}

/// Seed data for running against the in-memory adapters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LocalSeed {
    /// User profiles preloaded into the in-memory store.
    #[serde(default)]
    pub users: Vec<UserInfo>,
    /// Candidates the in-memory search proposes for every task.
    #[serde(default)]
    pub search_candidates: Vec<UserId>,
}

fn default_log_filter() -> String {
    "info".to_owned()
}

/// Task manager node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskManagerConfig {
    /// Address the RPC front end binds to.
    pub addr: String,
    /// Address of the responder search service.
    pub search_addr: String,
    /// Durable task store.
    #[serde(default)]
    pub tasks_store: StoreDescriptor,
    /// Durable user store.
    #[serde(default)]
    pub users_store: StoreDescriptor,
    /// Background search limits.
    #[serde(default)]
    pub search_dispatch: SearchDispatchConfig,
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Seed data for the in-memory adapters.
    #[serde(default)]
    pub local: LocalSeed,
}

impl TaskManagerConfig {
    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the text is not valid TOML for this
    /// schema or a value fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, or any
    /// error of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] when `addr` is not a socket
    /// address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress {
                field: "addr",
                value: self.addr.clone(),
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.search_dispatch.max_concurrent_searches == 0 {
            return Err(ConfigError::ZeroLimit("search_dispatch.max_concurrent_searches"));
        }
        if self.search_dispatch.search_timeout_ms == 0 {
            return Err(ConfigError::ZeroLimit("search_dispatch.search_timeout_ms"));
        }
        Ok(())
    }
}
