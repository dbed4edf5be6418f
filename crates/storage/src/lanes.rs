// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Swim-lane persistence.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{DomainEvent, LaneId, RuntimeId, SwimLane};

use crate::{Store, StoreError};

impl Store {
    /// Insert or update a lane; fires `lane.updated`.
    pub fn save_lane(&self, lane: &SwimLane) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO lanes (
                    id, name, runtime_id, working_dir, session_name, session_active,
                    context_instructions, ai_provider, model, memory_file_id,
                    auto_start, auto_pilot, auto_close, use_worktree,
                    created_at, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
                params![
                    lane.id.as_str(),
                    lane.name,
                    lane.runtime_id.as_str(),
                    lane.working_dir.display().to_string(),
                    lane.session_name,
                    lane.session_active,
                    lane.context_instructions,
                    lane.ai_provider,
                    lane.model,
                    lane.memory_file_id,
                    lane.auto_start,
                    lane.auto_pilot,
                    lane.auto_close,
                    lane.use_worktree,
                    lane.created_at as i64,
                    updated_at,
                ],
            )?;
            Ok(())
        })?;
        self.publish(DomainEvent::LaneUpdated { lane: lane.clone() });
        Ok(())
    }

    pub fn lane(&self, id: &LaneId) -> Result<Option<SwimLane>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT * FROM lanes WHERE id = ?1", params![id.as_str()], row_to_lane)
                .optional()
                .map_err(StoreError::from)
        })
    }

    pub fn lanes(&self) -> Result<Vec<SwimLane>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM lanes ORDER BY created_at")?;
            let rows = stmt.query_map([], row_to_lane)?;
            let mut lanes = Vec::new();
            for row in rows {
                lanes.push(row?);
            }
            Ok(lanes)
        })
    }

    /// Delete a lane; task references are nulled by the foreign key.
    /// Fires one `lane.updated` with the final snapshot.
    pub fn delete_lane(&self, id: &LaneId) -> Result<Option<SwimLane>, StoreError> {
        let Some(lane) = self.lane(id)? else {
            return Ok(None);
        };
        self.with_conn(|conn| {
            conn.execute("DELETE FROM lanes WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })?;
        self.publish(DomainEvent::LaneUpdated { lane: lane.clone() });
        Ok(Some(lane))
    }
}

fn row_to_lane(row: &Row<'_>) -> rusqlite::Result<SwimLane> {
    let working_dir: String = row.get("working_dir")?;
    Ok(SwimLane {
        id: LaneId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        runtime_id: RuntimeId::new(row.get::<_, String>("runtime_id")?),
        working_dir: working_dir.into(),
        session_name: row.get("session_name")?,
        session_active: row.get("session_active")?,
        context_instructions: row.get("context_instructions")?,
        ai_provider: row.get("ai_provider")?,
        model: row.get("model")?,
        memory_file_id: row.get("memory_file_id")?,
        auto_start: row.get("auto_start")?,
        auto_pilot: row.get("auto_pilot")?,
        auto_close: row.get("auto_close")?,
        use_worktree: row.get("use_worktree")?,
        created_at: row.get::<_, i64>("created_at")? as u64,
    })
}

#[cfg(test)]
#[path = "lanes_tests.rs"]
mod tests;
