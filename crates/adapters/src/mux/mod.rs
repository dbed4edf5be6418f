// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The multiplexer driver: one interface over tmux regardless of host.
//!
//! Local runtimes invoke the `tmux` binary directly; SSH runtimes wrap
//! every invocation in a hardened `ssh` call (see [`ssh`]). The driver
//! never persists anything — it is a pure adapter, plus a short-TTL
//! tree cache per runtime.

pub mod cache;
#[cfg(any(test, feature = "test-support"))]
pub mod fake;
pub mod local;
pub mod parse;
pub mod ssh;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use mh_core::{DomainError, RuntimeDef};

/// One pane in the scraped tmux tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneEntry {
    pub index: u32,
    pub command: String,
    pub cwd: PathBuf,
    pub pid: u32,
    pub active: bool,
    /// tmux's global pane id (`%12`), stable across window moves.
    pub pane_id: String,
}

/// One window in the scraped tmux tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowEntry {
    pub index: u32,
    pub name: String,
    pub panes: Vec<PaneEntry>,
}

/// One session in the scraped tmux tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTree {
    pub session: String,
    pub windows: Vec<WindowEntry>,
}

impl SessionTree {
    pub fn window(&self, index: u32) -> Option<&WindowEntry> {
        self.windows.iter().find(|w| w.index == index)
    }

    /// First window whose name contains `needle`.
    pub fn find_window_containing(&self, needle: &str) -> Option<&WindowEntry> {
        self.windows.iter().find(|w| w.name.contains(needle))
    }
}

/// Options for `new_session`.
#[derive(Debug, Clone, Default)]
pub struct NewSessionOpts {
    pub cwd: Option<PathBuf>,
    pub initial_window_name: Option<String>,
}

/// Classified driver failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MuxError {
    #[error("SSH authentication was denied by the remote host.")]
    AuthDenied(String),

    #[error("Connection to the remote host was refused.")]
    ConnectionRefused(String),

    #[error("The operation timed out.")]
    Timeout(String),

    #[error("tmux is not installed on the target host.")]
    NotInstalled(String),

    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("failed to run command: {0}")]
    Io(String),
}

impl MuxError {
    /// Short classification used by `runtime.testConnection`.
    pub fn reason(&self) -> &'static str {
        match self {
            MuxError::AuthDenied(_) => "auth denied",
            MuxError::ConnectionRefused(_) => "connection refused",
            MuxError::Timeout(_) => "timeout",
            MuxError::NotInstalled(_) => "tmux not installed",
            MuxError::CommandFailed(_) => "command failed",
            MuxError::Io(_) => "io error",
        }
    }

    /// Whether a single immediate retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        matches!(self, MuxError::ConnectionRefused(_) | MuxError::Timeout(_))
    }
}

impl From<MuxError> for DomainError {
    fn from(e: MuxError) -> Self {
        match &e {
            MuxError::AuthDenied(_)
            | MuxError::ConnectionRefused(_)
            | MuxError::Timeout(_)
            | MuxError::NotInstalled(_) => DomainError::runtime_unavailable(e.to_string()),
            MuxError::CommandFailed(detail) => {
                DomainError::external(format!("tmux command failed: {detail}"))
            }
            MuxError::Io(detail) => DomainError::internal(format!("subprocess error: {detail}")),
        }
    }
}

/// Driver interface over tmux on any runtime.
#[async_trait]
pub trait MuxDriver: Send + Sync {
    async fn list_sessions(&self, rt: &RuntimeDef) -> Result<Vec<String>, MuxError>;

    /// Scrape the full session/window/pane tree, served from a ~2 s
    /// cache per runtime.
    async fn get_tree(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError>;

    /// Ground-truth tree: invalidates the cache first.
    async fn get_tree_fresh(&self, rt: &RuntimeDef) -> Result<Vec<SessionTree>, MuxError>;

    async fn new_session(
        &self,
        rt: &RuntimeDef,
        name: &str,
        opts: NewSessionOpts,
    ) -> Result<(), MuxError>;

    async fn kill_session(&self, rt: &RuntimeDef, name: &str) -> Result<(), MuxError>;

    async fn rename_session(&self, rt: &RuntimeDef, from: &str, to: &str) -> Result<(), MuxError>;

    /// Create a window; returns the new window index.
    async fn new_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        name: Option<&str>,
        cwd: Option<&Path>,
    ) -> Result<u32, MuxError>;

    async fn kill_window(&self, rt: &RuntimeDef, session: &str, window: u32)
        -> Result<(), MuxError>;

    async fn select_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
    ) -> Result<(), MuxError>;

    async fn rename_window(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        name: &str,
    ) -> Result<(), MuxError>;

    /// Split a pane; returns the new pane index.
    async fn split_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        vertical: bool,
    ) -> Result<u32, MuxError>;

    async fn kill_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
    ) -> Result<(), MuxError>;

    async fn select_pane(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
    ) -> Result<(), MuxError>;

    /// Send literal text to a pane, optionally followed by Enter.
    async fn send_keys(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        text: &str,
        append_enter: bool,
    ) -> Result<(), MuxError>;

    /// Capture the last `lines` lines of a pane.
    async fn capture(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        pane: u32,
        lines: u32,
    ) -> Result<String, MuxError>;

    /// Read user options (`@cc_*`) for the given pane ids.
    async fn read_pane_options(
        &self,
        rt: &RuntimeDef,
        pane_ids: &[String],
    ) -> Result<HashMap<String, HashMap<String, String>>, MuxError>;

    /// Turn the automatic-rename window option off (or on).
    async fn set_automatic_rename(
        &self,
        rt: &RuntimeDef,
        session: &str,
        window: u32,
        enabled: bool,
    ) -> Result<(), MuxError>;

    /// Run an arbitrary shell command on the runtime; returns stdout.
    async fn exec(&self, rt: &RuntimeDef, command: &str) -> Result<String, MuxError>;
}

pub use local::TmuxDriver;
