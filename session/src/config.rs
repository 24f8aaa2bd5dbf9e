//! Session configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::ledger_gate::LedgerGate;
use crate::logging::LogFormat;
use crate::SessionError;

/// Configuration for an election session and the backend it talks to.
///
/// Can be loaded from a TOML file via [`SessionConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// JSON-RPC endpoint of the wallet backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Upper bound for a single backend request (the download is exempt).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for establishing a connection to the backend.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Run syncs and submissions one at a time against the backend.
    #[serde(default = "default_true")]
    pub serialize_ledger_operations: bool,

    /// Start a background sync after a successful vote or delegation.
    #[serde(default = "default_true")]
    pub refresh_after_submission: bool,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_backend_url() -> String {
    "http://127.0.0.1:7180".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl SessionConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| SessionError::Config(format!("{}: {e}", path.as_ref().display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, SessionError> {
        toml::from_str(s).map_err(|e| SessionError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, SessionError> {
        toml::to_string_pretty(self).map_err(|e| SessionError::Config(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, SessionError> {
        self.log_format.parse()
    }

    /// The gate shared by the sync coordinator and the submission controller.
    pub fn ledger_gate(&self) -> LedgerGate {
        if self.serialize_ledger_operations {
            LedgerGate::exclusive()
        } else {
            LedgerGate::disabled()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            serialize_ledger_operations: default_true(),
            refresh_after_submission: default_true(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
