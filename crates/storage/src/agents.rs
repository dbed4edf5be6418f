// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent persistence.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{AgentId, AgentRecord, AgentRole, AgentState, DomainEvent, RuntimeId};

use crate::tasks::corrupt;
use crate::{enum_from_str, enum_to_str, from_json, to_json, Store, StoreError};

impl Store {
    /// Insert or update an agent; fires `agent.updated`.
    pub fn save_agent(&self, agent: &AgentRecord) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO agents (
                    id, role, provider, model, runtime_id, session_name,
                    window_index, pane_index, state, team_id, swim_lane_id,
                    current_task_id, expertise, created_at, last_activity_at,
                    error_message, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    agent.id.as_str(),
                    agent.role.as_str(),
                    agent.provider,
                    agent.model,
                    agent.runtime_id.as_str(),
                    agent.session_name,
                    agent.window_index as i64,
                    agent.pane_index as i64,
                    enum_to_str(&agent.state)?,
                    agent.team_id.as_ref().map(|t| t.as_str()),
                    agent.swim_lane_id.as_ref().map(|l| l.as_str()),
                    agent.current_task_id.as_ref().map(|t| t.as_str()),
                    to_json(&agent.expertise)?,
                    agent.created_at as i64,
                    agent.last_activity_at as i64,
                    agent.error_message,
                    updated_at,
                ],
            )?;
            Ok(())
        })?;
        self.publish(DomainEvent::AgentUpdated { agent: agent.clone() });
        Ok(())
    }

    pub fn agent(&self, id: &AgentId) -> Result<Option<AgentRecord>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM agents WHERE id = ?1", params![id.as_str()], row_to_agent)
                .optional()
                .map_err(StoreError::from)
        })
    }

    pub fn agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        self.query_agents("SELECT * FROM agents ORDER BY created_at", params![])
    }

    pub fn agents_with_state(&self, state: AgentState) -> Result<Vec<AgentRecord>, StoreError> {
        let state = enum_to_str(&state)?;
        self.query_agents("SELECT * FROM agents WHERE state = ?1 ORDER BY created_at", params![state])
    }

    pub fn agents_with_role(&self, role: AgentRole) -> Result<Vec<AgentRecord>, StoreError> {
        self.query_agents(
            "SELECT * FROM agents WHERE role = ?1 ORDER BY created_at",
            params![role.as_str()],
        )
    }

    pub fn agents_in_team(&self, team_id: &str) -> Result<Vec<AgentRecord>, StoreError> {
        self.query_agents(
            "SELECT * FROM agents WHERE team_id = ?1 ORDER BY created_at",
            params![team_id],
        )
    }

    /// Delete an agent record; fires `agent.updated` with the final snapshot.
    pub fn delete_agent(&self, id: &AgentId) -> Result<Option<AgentRecord>, StoreError> {
        let Some(agent) = self.agent(id)? else {
            return Ok(None);
        };
        self.with_conn(|conn| {
            conn.execute("DELETE FROM agents WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })?;
        self.publish(DomainEvent::AgentUpdated { agent: agent.clone() });
        Ok(Some(agent))
    }

    fn query_agents(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<AgentRecord>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, row_to_agent)?;
            let mut agents = Vec::new();
            for row in rows {
                agents.push(row?);
            }
            Ok(agents)
        })
    }
}

fn row_to_agent(row: &Row<'_>) -> rusqlite::Result<AgentRecord> {
    let role: String = row.get("role")?;
    let state: String = row.get("state")?;
    let expertise: String = row.get("expertise")?;
    Ok(AgentRecord {
        id: AgentId::from_string(row.get::<_, String>("id")?),
        role: AgentRole::parse(&role)
            .ok_or_else(|| corrupt(StoreError::Corrupt(format!("bad role {role:?}"))))?,
        provider: row.get("provider")?,
        model: row.get("model")?,
        runtime_id: RuntimeId::new(row.get::<_, String>("runtime_id")?),
        session_name: row.get("session_name")?,
        window_index: row.get::<_, i64>("window_index")? as u32,
        pane_index: row.get::<_, i64>("pane_index")? as u32,
        state: enum_from_str(&state).map_err(corrupt)?,
        team_id: row.get::<_, Option<String>>("team_id")?.map(Into::into),
        swim_lane_id: row.get::<_, Option<String>>("swim_lane_id")?.map(Into::into),
        current_task_id: row.get::<_, Option<String>>("current_task_id")?.map(Into::into),
        expertise: from_json(&expertise).map_err(corrupt)?,
        created_at: row.get::<_, i64>("created_at")? as u64,
        last_activity_at: row.get::<_, i64>("last_activity_at")? as u64,
        error_message: row.get("error_message")?,
    })
}

#[cfg(test)]
#[path = "agents_tests.rs"]
mod tests;
