//! TOML-based configuration for the client binary.
//!
//! ```toml
//! [manager]
//! address = "127.0.0.1:9000"
//! retry_backoff_secs = 5
//!
//! [worker]
//! port = 9001
//! ack_timeout_ms = 5000
//!
//! [user]
//! username = "guest"
//! password = "guest"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub user: UserConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerConfig {
    /// `host:port` of the manager's assignment endpoint.
    #[serde(default = "default_manager_address")]
    pub address: String,
    /// Seconds to wait before asking again when no worker is active.
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkerConfig {
    /// Port workers listen on. The assignment only carries an IP.
    #[serde(default = "default_worker_port")]
    pub port: u16,
    /// Milliseconds to wait for an ack before giving up on a request.
    #[serde(default = "default_ack_timeout_ms")]
    pub ack_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_username")]
    pub password: String,
}

impl ManagerConfig {
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

impl WorkerConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_manager_address() -> String {
    "127.0.0.1:9000".to_string()
}
fn default_retry_backoff_secs() -> u64 {
    5
}
fn default_worker_port() -> u16 {
    9001
}
fn default_ack_timeout_ms() -> u64 {
    5000
}
fn default_username() -> String {
    "guest".to_string()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            address: default_manager_address(),
            retry_backoff_secs: default_retry_backoff_secs(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            port: default_worker_port(),
            ack_timeout_ms: default_ack_timeout_ms(),
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: default_username(),
        }
    }
}

/// Loads `ClientConfig` from `path`, returning the defaults when the file
/// does not exist.
pub fn load_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
