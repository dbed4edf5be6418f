// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Swim lanes: scoped workspaces mapping to one tmux session each.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::runtime::RuntimeId;

crate::define_id! {
    /// Unique swim-lane identifier (`swl-` prefix).
    pub struct LaneId("swl-");
}

/// A swim lane owns exactly one tmux session on its runtime.
///
/// The session is lazily (re-)created on first task launch;
/// `session_active` is the daemon's belief and is reconciled against
/// ground truth on each launch and by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimLane {
    pub id: LaneId,
    pub name: String,
    pub runtime_id: RuntimeId,
    pub working_dir: PathBuf,
    pub session_name: String,
    pub session_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pilot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_close: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_worktree: Option<bool>,
    pub created_at: u64,
}

impl SwimLane {
    pub fn new(
        name: impl Into<String>,
        runtime_id: RuntimeId,
        working_dir: impl Into<PathBuf>,
        created_at: u64,
    ) -> Self {
        let name = name.into();
        let session_name = format!("lane-{}", crate::task::slug(&name));
        Self {
            id: LaneId::new(),
            name,
            runtime_id,
            working_dir: working_dir.into(),
            session_name,
            session_active: false,
            context_instructions: None,
            ai_provider: None,
            model: None,
            memory_file_id: None,
            auto_start: None,
            auto_pilot: None,
            auto_close: None,
            use_worktree: None,
            created_at,
        }
    }
}

/// Resolve a tri-state auto flag: the task's own value wins, then the
/// lane's, then `false`.
pub fn resolve_flag(task_flag: Option<bool>, lane_flag: Option<bool>) -> bool {
    task_flag.or(lane_flag).unwrap_or(false)
}
