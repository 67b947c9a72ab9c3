//! TOML application configuration.
//!
//! ```toml
//! log_level = "info"
//!
//! [obs]
//! host = "localhost"
//! port = 4455
//! password = ""
//! request_timeout_ms = 10000
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so a partial file (or an
//! older one missing newer fields) still loads.  Command-line flags and
//! environment variables override whatever is read here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::network::ObsClientConfig;

/// Error type for config and mapping file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The mapping JSON could not be parsed into actions.
    #[error("failed to parse mapping {path}: {source}")]
    Mapping {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub obs: ObsSection,
}

/// Where and how to reach the OBS WebSocket server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObsSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Empty means no password.
    #[serde(default)]
    pub password: String,
    /// `0` disables the per-request timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ObsSection {
    /// Client settings for this section.
    pub fn client_config(&self) -> ObsClientConfig {
        ObsClientConfig {
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            request_timeout: timeout_from_millis(self.request_timeout_ms),
        }
    }
}

/// Converts a millisecond setting into a timeout, where `0` means none.
pub fn timeout_from_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    4455
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            obs: ObsSection::default(),
        }
    }
}

impl Default for ObsSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            password: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
