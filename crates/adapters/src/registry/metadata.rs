// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured pane metadata published by cooperating CLIs.
//!
//! Providers may publish `@cc_*` key/value annotations into tmux pane
//! options. When present, `@cc_state` overrides the text heuristic in
//! [`super::status`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::PaneStatus;

/// Agent state as self-reported through `@cc_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CcState {
    /// Generating or running tools.
    Busy,
    /// Waiting for user input.
    User,
    Idle,
}

impl CcState {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "busy" => Some(CcState::Busy),
            "user" => Some(CcState::User),
            "idle" => Some(CcState::Idle),
            _ => None,
        }
    }

    /// Map the self-reported state onto the heuristic's vocabulary.
    pub fn as_status(&self) -> PaneStatus {
        match self {
            CcState::Busy => PaneStatus::Working,
            CcState::User => PaneStatus::Waiting,
            CcState::Idle => PaneStatus::Idle,
        }
    }
}

/// Everything a cooperating provider may publish about its pane.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// Context window fill, 0–100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_out: Option<u64>,
    /// Session cost in dollars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CcState>,
}

impl PaneMetadata {
    pub fn is_empty(&self) -> bool {
        self == &PaneMetadata::default()
    }
}

/// Interpret a pane's `@cc_*` options.
pub fn read_pane_metadata(options: &HashMap<String, String>) -> PaneMetadata {
    let get = |key: &str| options.get(key).map(String::as_str);
    PaneMetadata {
        model: get("@cc_model").map(String::from),
        session_id: get("@cc_session_id").map(String::from),
        cwd: get("@cc_cwd").map(String::from),
        context_pct: get("@cc_context_pct").and_then(|v| v.trim_end_matches('%').parse().ok()),
        tokens_in: get("@cc_tokens_in").and_then(|v| v.parse().ok()),
        tokens_out: get("@cc_tokens_out").and_then(|v| v.parse().ok()),
        cost: get("@cc_cost").and_then(|v| v.trim_start_matches('$').parse().ok()),
        git_branch: get("@cc_git_branch").map(String::from),
        last_tool: get("@cc_last_tool").map(String::from),
        state: get("@cc_state").and_then(CcState::parse),
    }
}

/// Final pane status: the self-reported state, when present, overrides
/// the text heuristic.
pub fn effective_status(metadata: &PaneMetadata, heuristic: PaneStatus) -> PaneStatus {
    metadata.state.map(|s| s.as_status()).unwrap_or(heuristic)
}

#[cfg(test)]
#[path = "metadata_tests.rs"]
mod tests;
