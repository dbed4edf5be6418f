// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use mh_core::{AgentRecord, AgentRole, AgentState, CollectSink, RuntimeId};

use crate::Store;

fn store() -> (Store, CollectSink) {
    let sink = CollectSink::new();
    let store = Store::open_in_memory(Arc::new(sink.clone())).unwrap();
    (store, sink)
}

fn agent(role: AgentRole) -> AgentRecord {
    let mut agent = AgentRecord::new(role, "claude", RuntimeId::local(), "lane-x", 1, 0, 500);
    agent.expertise = vec!["rust".into(), "sql".into()];
    agent.model = Some("opus".into());
    agent
}

#[test]
fn round_trip_preserves_every_field() {
    let (store, _) = store();
    let a = agent(AgentRole::Coder);
    store.save_agent(&a).unwrap();
    assert_eq!(store.agent(&a.id).unwrap().unwrap(), a);
}

#[test]
fn save_fires_agent_updated() {
    let (store, sink) = store();
    store.save_agent(&agent(AgentRole::Coder)).unwrap();
    assert_eq!(sink.topics(), vec!["agent.updated"]);
}

#[test]
fn filters_by_state_role_team() {
    let (store, _) = store();
    let mut idle = agent(AgentRole::Coder);
    idle.state = AgentState::Idle;
    idle.team_id = Some("tea-one".into());
    let mut busy = agent(AgentRole::Tester);
    busy.state = AgentState::Working;
    store.save_agent(&idle).unwrap();
    store.save_agent(&busy).unwrap();

    assert_eq!(store.agents().unwrap().len(), 2);
    assert_eq!(store.agents_with_state(AgentState::Idle).unwrap().len(), 1);
    assert_eq!(store.agents_with_role(AgentRole::Tester).unwrap().len(), 1);
    assert_eq!(store.agents_in_team("tea-one").unwrap().len(), 1);
    assert!(store.agents_in_team("tea-none").unwrap().is_empty());
}

#[test]
fn delete_round_trip() {
    let (store, _) = store();
    let a = agent(AgentRole::Devops);
    store.save_agent(&a).unwrap();
    assert!(store.delete_agent(&a.id).unwrap().is_some());
    assert!(store.agent(&a.id).unwrap().is_none());
    assert!(store.delete_agent(&a.id).unwrap().is_none());
}
