// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Teams: named groups of agents, optionally attached to a pipeline.
//!
//! Teams hold agent ids, never agent objects — deleting a team does not
//! terminate its agents.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::pipeline::PipelineId;

crate::define_id! {
    /// Unique team identifier (`tea-` prefix).
    pub struct TeamId("tea-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub agent_ids: Vec<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<PipelineId>,
    pub created_at: u64,
}

impl Team {
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TeamId::new(),
            name: name.into(),
            agent_ids: Vec::new(),
            pipeline_id: None,
            created_at,
        }
    }

    /// Add an agent, ignoring duplicates.
    pub fn add_agent(&mut self, agent_id: AgentId) {
        if !self.agent_ids.contains(&agent_id) {
            self.agent_ids.push(agent_id);
        }
    }

    pub fn remove_agent(&mut self, agent_id: &AgentId) {
        self.agent_ids.retain(|a| a != agent_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_agent_deduplicates() {
        let mut team = Team::new("alpha", 1);
        let agent = AgentId::new();
        team.add_agent(agent.clone());
        team.add_agent(agent.clone());
        assert_eq!(team.agent_ids.len(), 1);
        team.remove_agent(&agent);
        assert!(team.agent_ids.is_empty());
    }
}
