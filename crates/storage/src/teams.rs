// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team persistence. Teams hold agent ids only; deleting a team never
//! touches agent records.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{Team, TeamId};

use crate::tasks::corrupt;
use crate::{from_json, to_json, Store, StoreError};

impl Store {
    pub fn save_team(&self, team: &Team) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO teams (id, name, agent_ids, pipeline_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    team.id.as_str(),
                    team.name,
                    to_json(&team.agent_ids)?,
                    team.pipeline_id.as_ref().map(|p| p.as_str()),
                    team.created_at as i64,
                    updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn team(&self, id: &TeamId) -> Result<Option<Team>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM teams WHERE id = ?1", params![id.as_str()], row_to_team)
                .optional()
                .map_err(StoreError::from)
        })
    }

    pub fn teams(&self) -> Result<Vec<Team>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM teams ORDER BY created_at")?;
            let rows = stmt.query_map([], row_to_team)?;
            let mut teams = Vec::new();
            for row in rows {
                teams.push(row?);
            }
            Ok(teams)
        })
    }

    /// The team containing a given agent, if any.
    pub fn team_of_agent(&self, agent_id: &str) -> Result<Option<Team>, StoreError> {
        Ok(self
            .teams()?
            .into_iter()
            .find(|t| t.agent_ids.iter().any(|a| a.as_str() == agent_id)))
    }

    pub fn delete_team(&self, id: &TeamId) -> Result<Option<Team>, StoreError> {
        let Some(team) = self.team(id)? else {
            return Ok(None);
        };
        self.with_conn(|conn| {
            conn.execute("DELETE FROM teams WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })?;
        Ok(Some(team))
    }
}

fn row_to_team(row: &Row<'_>) -> rusqlite::Result<Team> {
    let agent_ids: String = row.get("agent_ids")?;
    Ok(Team {
        id: TeamId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        agent_ids: from_json(&agent_ids).map_err(corrupt)?,
        pipeline_id: row.get::<_, Option<String>>("pipeline_id")?.map(Into::into),
        created_at: row.get::<_, i64>("created_at")? as u64,
    })
}
