// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tasks and the kanban board model.
//!
//! A task is the unit of work the daemon launches into a tmux window.
//! The window name embeds the first [`Task::SHORT_ID_LEN`] characters of
//! the task id — that prefix is the single source of truth for rebinding
//! a task to its window after a daemon restart, so these windows are
//! never renamed.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentRole};
use crate::lane::LaneId;
use crate::pipeline::{RunId, StageId};
use crate::runtime::RuntimeId;

crate::define_id! {
    /// Unique task identifier (`tsk-` prefix).
    pub struct TaskId("tsk-");
}

/// Orchestration status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

/// Kanban board column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

impl KanbanColumn {
    pub fn as_str(&self) -> &'static str {
        match self {
            KanbanColumn::Backlog => "backlog",
            KanbanColumn::Todo => "todo",
            KanbanColumn::InProgress => "in_progress",
            KanbanColumn::InReview => "in_review",
            KanbanColumn::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "backlog" => Some(KanbanColumn::Backlog),
            "todo" => Some(KanbanColumn::Todo),
            "in_progress" => Some(KanbanColumn::InProgress),
            "in_review" => Some(KanbanColumn::InReview),
            "done" => Some(KanbanColumn::Done),
            _ => None,
        }
    }
}

/// Result of the post-completion verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    None,
    Pending,
    Passed,
    Failed,
}

/// The 4-tuple tying a task to a live tmux pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MuxBinding {
    pub runtime_id: RuntimeId,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
}

/// A unit of work on the kanban board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swim_lane_id: Option<LaneId>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_role: Option<AgentRole>,
    /// 1 (lowest) to 10 (highest).
    pub priority: u8,
    pub status: TaskStatus,
    pub kanban_column: KanbanColumn,

    // Auto flags are tri-state: None means "inherit from the lane".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_pilot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_close: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_worktree: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_model: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtask_ids: Vec<TaskId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_run_id: Option<RunId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_stage_id: Option<StageId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub verification_status: VerificationStatus,
    /// Random token the sentinel protocol is keyed on; persisted so a
    /// restarted daemon can re-arm the watcher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentinel_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<MuxBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_agent_id: Option<AgentId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done_at: Option<u64>,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl Task {
    /// Characters of the task id embedded in the window name.
    pub const SHORT_ID_LEN: usize = 15;

    pub fn new(description: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TaskId::new(),
            swim_lane_id: None,
            description: description.into(),
            details: None,
            target_role: None,
            priority: 5,
            status: TaskStatus::Pending,
            kanban_column: KanbanColumn::Todo,
            auto_start: None,
            auto_pilot: None,
            auto_close: None,
            use_worktree: None,
            ai_provider: None,
            ai_model: None,
            depends_on: Vec::new(),
            parent_task_id: None,
            subtask_ids: Vec::new(),
            pipeline_run_id: None,
            pipeline_stage_id: None,
            output: None,
            error_message: None,
            verification_status: VerificationStatus::None,
            sentinel_token: None,
            binding: None,
            worktree_path: None,
            assigned_agent_id: None,
            done_at: None,
            created_at,
            started_at: None,
            completed_at: None,
        }
    }

    /// The window-name anchor: first 15 characters of the id.
    pub fn short_id(&self) -> &str {
        self.id.short(Self::SHORT_ID_LEN)
    }

    /// Window name of the form `task-<short_id>-<slug>`.
    pub fn window_name(&self) -> String {
        format!("task-{}-{}", self.short_id(), slug(&self.description))
    }

    /// A task with subtasks is a *task box*: its own description is
    /// display-only and its status is derived from the children.
    pub fn is_task_box(&self) -> bool {
        !self.subtask_ids.is_empty()
    }

    pub fn has_binding(&self) -> bool {
        self.binding.is_some()
    }
}

/// Lowercased, dash-separated slug of the first few words of a title.
pub fn slug(text: &str) -> String {
    let mut out = String::new();
    let mut dash_pending = false;
    for c in text.chars() {
        if out.len() >= 24 {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if dash_pending && !out.is_empty() {
                out.push('-');
            }
            dash_pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            dash_pending = true;
        }
    }
    if out.is_empty() {
        out.push_str("task");
    }
    out
}

/// Whether adding `new_deps` to `task_id` would introduce a dependency
/// cycle, given the `depends_on` edges of every known task.
///
/// Walks the dependency graph from each proposed dependency; reaching
/// `task_id` again means the submission must be rejected.
pub fn would_cycle(
    task_id: &TaskId,
    new_deps: &[TaskId],
    edges: &HashMap<TaskId, Vec<TaskId>>,
) -> bool {
    let mut stack: Vec<&TaskId> = new_deps.iter().collect();
    let mut seen: HashSet<&TaskId> = HashSet::new();
    while let Some(current) = stack.pop() {
        if current == task_id {
            return true;
        }
        if !seen.insert(current) {
            continue;
        }
        if let Some(next) = edges.get(current) {
            stack.extend(next.iter());
        }
    }
    false
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
