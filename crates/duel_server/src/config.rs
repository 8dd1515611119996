//! Engine and server configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//! Command-line flags override file values.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;

/// Who may place the next symbol.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum TurnPolicy {
    /// Either seated player may move; the symbol placed is derived from the
    /// board alone.
    #[default]
    #[display("permissive")]
    Permissive,
    /// Only the seat holding the symbol due to move may move.
    #[display("seat_bound")]
    SeatBound,
}

/// Session store backend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// SQLite database file.
    #[default]
    #[display("sqlite")]
    Sqlite,
    /// Process memory; sessions are lost on exit.
    #[display("memory")]
    Memory,
}

/// Rules the engine applies to every session.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How many join codes to try before giving up on creating a session.
    join_code_attempts: u32,
    /// Turn attribution rule.
    turn_policy: TurnPolicy,
}

impl EngineConfig {
    /// Creates an engine configuration.
    pub fn new(join_code_attempts: u32, turn_policy: TurnPolicy) -> Self {
        Self {
            join_code_attempts,
            turn_policy,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(5, TurnPolicy::Permissive)
    }
}

/// Everything the `serve` command needs.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    host: String,
    /// Port to bind.
    port: u16,
    /// SQLite database file.
    db_path: String,
    /// Milliseconds a SQLite writer waits for the database lock.
    busy_timeout_ms: u64,
    /// Which store backs the engine.
    store: StoreBackend,
    /// Engine rules.
    engine: EngineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            db_path: "duel.db".to_string(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            store: StoreBackend::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(host = %config.host, port = config.port, store = %config.store, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Replaces file values with any flags given on the command line.
    #[instrument(skip(self))]
    pub fn override_with(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        db_path: Option<String>,
        store: Option<StoreBackend>,
    ) {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(db_path) = db_path {
            self.db_path = db_path;
        }
        if let Some(store) = store {
            self.store = store;
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}
