// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agents: interactive AI CLI processes supervised in tmux panes.

use serde::{Deserialize, Serialize};

use crate::lane::LaneId;
use crate::runtime::RuntimeId;
use crate::task::TaskId;
use crate::team::TeamId;

crate::define_id! {
    /// Unique agent identifier (`agt-` prefix).
    pub struct AgentId("agt-");
}

crate::define_id! {
    /// Unique agent-message identifier (`msg-` prefix).
    pub struct MessageId("msg-");
}

/// The role an agent was spawned for; used by role-aware dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coder,
    Reviewer,
    Tester,
    Devops,
    Researcher,
    Custom,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Coder => "coder",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Tester => "tester",
            AgentRole::Devops => "devops",
            AgentRole::Researcher => "researcher",
            AgentRole::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "coder" => Some(AgentRole::Coder),
            "reviewer" => Some(AgentRole::Reviewer),
            "tester" => Some(AgentRole::Tester),
            "devops" => Some(AgentRole::Devops),
            "researcher" => Some(AgentRole::Researcher),
            "custom" => Some(AgentRole::Custom),
            _ => None,
        }
    }
}

/// Agent lifecycle state, driven by periodic pane scraping.
///
/// ```text
/// spawning ──(any output captured)──▶ idle
/// idle ──(provider reports working)──▶ working
/// working ──(provider reports waiting|idle)──▶ idle
/// idle|working ──(capture error)──▶ error
/// any ──(explicit kill)──▶ terminated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Spawning,
    Idle,
    Working,
    Error,
    Completed,
    Terminated,
}

impl AgentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::Completed | AgentState::Terminated)
    }
}

/// A supervised agent instance bound to one tmux pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: AgentId,
    pub role: AgentRole,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub runtime_id: RuntimeId,
    pub session_name: String,
    pub window_index: u32,
    pub pane_index: u32,
    pub state: AgentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swim_lane_id: Option<LaneId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expertise: Vec<String>,
    pub created_at: u64,
    pub last_activity_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AgentRecord {
    pub fn new(
        role: AgentRole,
        provider: impl Into<String>,
        runtime_id: RuntimeId,
        session_name: impl Into<String>,
        window_index: u32,
        pane_index: u32,
        created_at: u64,
    ) -> Self {
        Self {
            id: AgentId::new(),
            role,
            provider: provider.into(),
            model: None,
            runtime_id,
            session_name: session_name.into(),
            window_index,
            pane_index,
            state: AgentState::Spawning,
            team_id: None,
            swim_lane_id: None,
            current_task_id: None,
            expertise: Vec::new(),
            created_at,
            last_activity_at: created_at,
            error_message: None,
        }
    }

    /// The pane 4-tuple; at most one non-terminal agent may hold it.
    pub fn pane_key(&self) -> (RuntimeId, String, u32, u32) {
        (
            self.runtime_id.clone(),
            self.session_name.clone(),
            self.window_index,
            self.pane_index,
        )
    }
}

/// A message on the inter-agent side channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: MessageId,
    pub from: AgentId,
    pub to: AgentId,
    pub content: String,
    pub ts: u64,
    pub read: bool,
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
