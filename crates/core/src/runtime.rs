// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtimes: hosts on which tmux commands can be executed.
//!
//! Runtime definitions come from configuration at daemon startup and
//! live for the process lifetime. They are never persisted. The id
//! `local` is reserved for the host the daemon runs on.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Opaque runtime identifier. Configured, not generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeId(String);

impl RuntimeId {
    pub const LOCAL: &'static str = "local";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn local() -> Self {
        Self(Self::LOCAL.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_local(&self) -> bool {
        self.0 == Self::LOCAL
    }
}

impl std::fmt::Display for RuntimeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuntimeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::borrow::Borrow<str> for RuntimeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// How the runtime is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeKind {
    #[serde(rename = "local-mux")]
    LocalMux,
    #[serde(rename = "ssh-mux")]
    SshMux,
}

/// SSH connection parameters for an `ssh-mux` runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshTarget {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// A reachable host on which tmux commands run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeDef {
    pub id: RuntimeId,
    pub kind: RuntimeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshTarget>,
}

impl RuntimeDef {
    /// The host daemon's own runtime.
    pub fn local() -> Self {
        Self {
            id: RuntimeId::local(),
            kind: RuntimeKind::LocalMux,
            label: "Local".to_string(),
            ssh: None,
        }
    }

    pub fn ssh(id: impl Into<String>, label: impl Into<String>, target: SshTarget) -> Self {
        Self {
            id: RuntimeId::new(id),
            kind: RuntimeKind::SshMux,
            label: label.into(),
            ssh: Some(target),
        }
    }
}
