// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use yare::parameterized;

use super::{AgentRecord, AgentRole, AgentState};
use crate::runtime::RuntimeId;

#[parameterized(
    coder = { "coder", AgentRole::Coder },
    reviewer = { "reviewer", AgentRole::Reviewer },
    tester = { "tester", AgentRole::Tester },
    devops = { "devops", AgentRole::Devops },
    researcher = { "researcher", AgentRole::Researcher },
    custom = { "custom", AgentRole::Custom },
)]
fn role_parse_round_trips(s: &str, role: AgentRole) {
    assert_eq!(AgentRole::parse(s), Some(role));
    assert_eq!(role.as_str(), s);
}

#[test]
fn unknown_role_is_rejected() {
    assert_eq!(AgentRole::parse("wizard"), None);
}

#[parameterized(
    spawning = { AgentState::Spawning, false },
    idle = { AgentState::Idle, false },
    working = { AgentState::Working, false },
    error = { AgentState::Error, false },
    completed = { AgentState::Completed, true },
    terminated = { AgentState::Terminated, true },
)]
fn terminal_states(state: AgentState, terminal: bool) {
    assert_eq!(state.is_terminal(), terminal);
}

#[test]
fn new_agent_starts_spawning() {
    let agent = AgentRecord::new(AgentRole::Coder, "claude", RuntimeId::local(), "s", 0, 0, 42);
    assert_eq!(agent.state, AgentState::Spawning);
    assert_eq!(agent.last_activity_at, 42);
    assert!(agent.id.as_str().starts_with("agt-"));
}

#[test]
fn pane_key_identifies_the_pane() {
    let a = AgentRecord::new(AgentRole::Coder, "claude", RuntimeId::local(), "s", 1, 2, 0);
    let b = AgentRecord::new(AgentRole::Tester, "gemini", RuntimeId::local(), "s", 1, 2, 0);
    assert_eq!(a.pane_key(), b.pane_key());
}
