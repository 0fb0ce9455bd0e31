//! TOML-based configuration for the server binary.
//!
//! Loaded from the path given on the command line (default `server.toml` in
//! the working directory). A missing file is not an error; every field has a
//! default so the server comes up on a bare machine:
//!
//! ```toml
//! [network]
//! bind_address = "0.0.0.0"
//! listen_port = 9001
//!
//! [manager]
//! address = "127.0.0.1:9000"
//! reconnect_backoff_secs = 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub manager: ManagerConfig,
}

/// Client-facing listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to bind the listener to. `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// TCP port clients connect to.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

/// Manager link settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerConfig {
    /// `host:port` of the manager's registration endpoint.
    #[serde(default = "default_manager_address")]
    pub address: String,
    /// Seconds to wait between reconnect attempts.
    #[serde(default = "default_backoff_secs")]
    pub reconnect_backoff_secs: u64,
}

impl ManagerConfig {
    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }
}

impl NetworkConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.listen_port)
    }
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_listen_port() -> u16 {
    9001
}
fn default_manager_address() -> String {
    "127.0.0.1:9000".to_string()
}
fn default_backoff_secs() -> u64 {
    5
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            listen_port: default_listen_port(),
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            address: default_manager_address(),
            reconnect_backoff_secs: default_backoff_secs(),
        }
    }
}

/// Loads `ServerConfig` from `path`, returning the defaults when the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
