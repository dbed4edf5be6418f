// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration model.
//!
//! Parsed from `<data_dir>/config.toml`; the daemon overlays environment
//! variables on top (see `mh-daemon`'s `env` module). Parsing is pure —
//! no file or environment access happens here.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default TCP port for remote RPC clients.
pub const DEFAULT_TCP_PORT: u16 = 3737;
/// Default WebSocket port for event subscribers.
pub const DEFAULT_WS_PORT: u16 = 3738;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(#[from] toml::de::Error),

    #[error("runtime id {0:?} is reserved")]
    ReservedRuntimeId(String),

    #[error("duplicate runtime id {0:?}")]
    DuplicateRuntimeId(String),
}

/// Per-provider launch override merged over the built-in profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactive_args: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_working_directory: Option<PathBuf>,
    /// Milliseconds to wait between launching the CLI and sending the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warmup_ms: Option<u64>,
}

/// An SSH runtime entry from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeEntry {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Timer periods and teardown delays, all in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Periods {
    /// Orchestrator poll period (P).
    pub orchestrator_ms: u64,
    /// Sentinel watcher scan period (S).
    pub watcher_ms: u64,
    /// Auto-close monitor period (M).
    pub autoclose_ms: u64,
    /// Delay after `done` before auto-close tears a window down.
    pub autoclose_delay_ms: u64,
    /// Reconciler period (R).
    pub reconcile_ms: u64,
}

impl Default for Periods {
    fn default() -> Self {
        Self {
            orchestrator_ms: 5_000,
            watcher_ms: 4_000,
            autoclose_ms: 30_000,
            autoclose_delay_ms: 10 * 60 * 1000,
            reconcile_ms: 30_000,
        }
    }
}

/// Full daemon configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory holding the database, socket and logs.
    pub data_dir: PathBuf,
    /// TCP port for remote RPC clients; `None` disables TCP.
    pub tcp_port: Option<u16>,
    /// WebSocket port for event subscribers.
    pub ws_port: u16,
    /// HTTP port for health probes; `None` disables HTTP.
    pub http_port: Option<u16>,
    pub default_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_provider: Option<String>,
    pub periods: Periods,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub providers: HashMap<String, ProviderOverride>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtimes: Vec<RuntimeEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".tmux-agents"),
            tcp_port: None,
            ws_port: DEFAULT_WS_PORT,
            http_port: None,
            default_provider: "claude".to_string(),
            fallback_provider: None,
            periods: Periods::default(),
            providers: HashMap::new(),
            runtimes: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a TOML document and validate runtime entries.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        let mut seen = std::collections::HashSet::new();
        for entry in &config.runtimes {
            if entry.id == crate::runtime::RuntimeId::LOCAL {
                return Err(ConfigError::ReservedRuntimeId(entry.id.clone()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(ConfigError::DuplicateRuntimeId(entry.id.clone()));
            }
        }
        Ok(config)
    }

    /// The runtime set: always `local`, plus enabled SSH entries.
    pub fn runtime_defs(&self) -> Vec<crate::runtime::RuntimeDef> {
        let mut defs = vec![crate::runtime::RuntimeDef::local()];
        for entry in self.runtimes.iter().filter(|r| r.enabled) {
            let label = if entry.label.is_empty() { entry.host.clone() } else { entry.label.clone() };
            defs.push(crate::runtime::RuntimeDef::ssh(
                entry.id.clone(),
                label,
                crate::runtime::SshTarget {
                    host: entry.host.clone(),
                    port: entry.port,
                    user: entry.user.clone(),
                    identity_file: entry.identity_file.clone(),
                    config_file: entry.config_file.clone(),
                },
            ));
        }
        defs
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("data.db")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.data_dir.join("daemon.sock")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.data_dir.join("daemon.lock")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
