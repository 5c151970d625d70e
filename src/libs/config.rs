//! Service configuration.
//!
//! Settings are layered, each layer overriding the one before it:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A JSON file, either `config.json` in the application data directory or
//!    an explicit `--config` path
//! 3. Environment variables (`TODO_PORT`, `TODO_ENV`, `TODO_DB_DSN`,
//!    `TODO_DB_BUSY_TIMEOUT_MS`), with `.env` loaded at startup
//! 4. Command-line flags
//!
//! ## Example file
//!
//! ```json
//! {
//!   "port": 4000,
//!   "env": "production",
//!   "db": { "dsn": "/var/lib/todo-api/todo.db", "busy_timeout_ms": 3000 }
//! }
//! ```

use super::data_storage::DataStorage;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Database file name used when no DSN is configured.
pub const DB_FILE_NAME: &str = "todo.db";

/// Database connection settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct DbConfig {
    /// Path of the SQLite database file, or `:memory:`.
    ///
    /// An empty string means "use the default location in the data
    /// directory", resolved by [`Config::resolve_dsn`].
    pub dsn: String,

    /// How long a statement waits on a locked database before failing.
    pub busy_timeout_ms: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        DbConfig {
            dsn: String::new(),
            busy_timeout_ms: 3000,
        }
    }
}

/// Root configuration for the service.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// TCP port the HTTP server listens on.
    pub port: u16,
    /// Environment name reported by the health check (`development`,
    /// `staging`, `production`).
    pub env: String,
    pub db: DbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 4000,
            env: "development".to_string(),
            db: DbConfig::default(),
        }
    }
}

impl Config {
    /// Reads `config.json` from the data directory, falling back to the
    /// defaults when the file does not exist.
    pub fn read() -> Result<Config> {
        let config_file_path = DataStorage::new().get_path(CONFIG_FILE_NAME)?;
        if !config_file_path.exists() {
            return Ok(Config::default());
        }
        Self::read_from(&config_file_path)
    }

    /// Reads configuration from an explicit file. A missing file is an error.
    pub fn read_from(path: &Path) -> Result<Config> {
        let config_str = fs::read_to_string(path).with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_str).with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(self) -> Result<Config> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, which maps a variable name to its
    /// value. Unset and empty variables are ignored.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(port) = get("TODO_PORT") {
            self.port = port.parse().with_context(|| format!("TODO_PORT must be a port number, got {port:?}"))?;
        }
        if let Some(env) = get("TODO_ENV") {
            self.env = env;
        }
        if let Some(dsn) = get("TODO_DB_DSN") {
            self.db.dsn = dsn;
        }
        if let Some(timeout) = get("TODO_DB_BUSY_TIMEOUT_MS") {
            self.db.busy_timeout_ms = timeout
                .parse()
                .with_context(|| format!("TODO_DB_BUSY_TIMEOUT_MS must be a number of milliseconds, got {timeout:?}"))?;
        }

        Ok(self)
    }

    /// The configured DSN, or `todo.db` in the data directory when unset.
    pub fn resolve_dsn(&self) -> Result<String> {
        if !self.db.dsn.is_empty() {
            return Ok(self.db.dsn.clone());
        }
        let path = DataStorage::new().get_path(DB_FILE_NAME)?;
        Ok(path.to_string_lossy().into_owned())
    }
}
