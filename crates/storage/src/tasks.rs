// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task persistence and the kanban move semantics.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{
    Clock, DomainEvent, KanbanColumn, MuxBinding, RuntimeId, SystemClock, Task, TaskId, TaskStatus,
};

use crate::{enum_from_str, enum_to_str, from_json, opt_ts, to_json, ts_opt, Store, StoreError};

impl Store {
    /// Insert or update a task; fires `task.updated`.
    pub fn save_task(&self, task: &Task) -> Result<(), StoreError> {
        self.write_task(task)?;
        self.publish(DomainEvent::TaskUpdated { task: task.clone() });
        Ok(())
    }

    /// Write without firing — used by multi-entity operations that fire
    /// their own, more specific event.
    pub(crate) fn write_task(&self, task: &Task) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        let binding = task.binding.as_ref();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tasks (
                    id, swim_lane_id, description, details, target_role, priority,
                    status, kanban_column,
                    auto_start, auto_pilot, auto_close, use_worktree,
                    ai_provider, ai_model,
                    depends_on, parent_task_id, subtask_ids,
                    pipeline_run_id, pipeline_stage_id,
                    output, error_message, verification_status, sentinel_token,
                    bind_runtime_id, bind_session_name, bind_window_index, bind_pane_index,
                    worktree_path, assigned_agent_id,
                    done_at, created_at, started_at, completed_at, updated_at
                 ) VALUES (
                    ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30,
                    ?31, ?32, ?33, ?34
                 )",
                params![
                    task.id.as_str(),
                    task.swim_lane_id.as_ref().map(|l| l.as_str()),
                    task.description,
                    task.details,
                    task.target_role.map(|r| r.as_str()),
                    task.priority as i64,
                    enum_to_str(&task.status)?,
                    task.kanban_column.as_str(),
                    task.auto_start,
                    task.auto_pilot,
                    task.auto_close,
                    task.use_worktree,
                    task.ai_provider,
                    task.ai_model,
                    to_json(&task.depends_on)?,
                    task.parent_task_id.as_ref().map(|t| t.as_str()),
                    to_json(&task.subtask_ids)?,
                    task.pipeline_run_id.as_ref().map(|r| r.as_str()),
                    task.pipeline_stage_id.as_ref().map(|s| s.as_str()),
                    task.output,
                    task.error_message,
                    enum_to_str(&task.verification_status)?,
                    task.sentinel_token,
                    binding.map(|b| b.runtime_id.as_str().to_string()),
                    binding.map(|b| b.session_name.clone()),
                    binding.map(|b| b.window_index as i64),
                    binding.map(|b| b.pane_index as i64),
                    task.worktree_path.as_ref().map(|p| p.display().to_string()),
                    task.assigned_agent_id.as_ref().map(|a| a.as_str()),
                    ts_opt(task.done_at),
                    task.created_at as i64,
                    ts_opt(task.started_at),
                    ts_opt(task.completed_at),
                    updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM tasks WHERE id = ?1",
                params![id.as_str()],
                row_to_task,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    pub fn tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.query_tasks("SELECT * FROM tasks ORDER BY created_at", params![])
    }

    pub fn tasks_in_lane(&self, lane: &str) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE swim_lane_id = ?1 ORDER BY created_at",
            params![lane],
        )
    }

    pub fn tasks_in_column(&self, column: KanbanColumn) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE kanban_column = ?1 ORDER BY created_at",
            params![column.as_str()],
        )
    }

    pub fn tasks_with_status(&self, status: TaskStatus) -> Result<Vec<Task>, StoreError> {
        let status = enum_to_str(&status)?;
        self.query_tasks(
            "SELECT * FROM tasks WHERE status = ?1 ORDER BY priority DESC, created_at",
            params![status],
        )
    }

    /// Tasks still carrying a tmux binding.
    pub fn bound_tasks(&self) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE bind_session_name IS NOT NULL ORDER BY created_at",
            params![],
        )
    }

    /// Tasks produced by a fan-out stage, for `task.getFanOutResults`.
    pub fn tasks_for_stage(&self, stage_id: &str) -> Result<Vec<Task>, StoreError> {
        self.query_tasks(
            "SELECT * FROM tasks WHERE pipeline_stage_id = ?1 ORDER BY created_at",
            params![stage_id],
        )
    }

    fn query_tasks(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Task>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, row_to_task)?;
            let mut tasks = Vec::new();
            for row in rows {
                tasks.push(row?);
            }
            Ok(tasks)
        })
    }

    /// Move a task between kanban columns; fires `task.moved`, plus
    /// `task.completed` exactly once when the task first reaches `done`.
    ///
    /// Moving to the current column is a no-op (no events), which makes
    /// repeated `moveTask(t, "done")` idempotent. Moving out of `done`
    /// clears `done_at`.
    pub fn move_task(&self, id: &TaskId, to: KanbanColumn) -> Result<Option<Task>, StoreError> {
        let Some(mut task) = self.task(id)? else {
            return Ok(None);
        };
        let from = task.kanban_column;
        if from == to {
            return Ok(Some(task));
        }

        task.kanban_column = to;
        let mut completed_event = None;
        match to {
            KanbanColumn::Done => {
                if task.done_at.is_none() {
                    let now = SystemClock.epoch_ms();
                    task.done_at = Some(now);
                    task.completed_at = Some(now);
                    task.status = TaskStatus::Completed;
                    completed_event = Some(DomainEvent::TaskCompleted { task: task.clone() });
                }
            }
            KanbanColumn::InProgress => {
                task.status = TaskStatus::InProgress;
                task.done_at = None;
            }
            _ => {
                // Leaving done resets the completion stamp
                task.done_at = None;
                if task.status == TaskStatus::Completed {
                    task.status = TaskStatus::Pending;
                }
            }
        }

        self.write_task(&task)?;
        self.publish(DomainEvent::TaskMoved { task: task.clone(), from, to });
        if let Some(event) = completed_event {
            self.publish(event);
        }
        Ok(Some(task))
    }

    /// Delete a task; fires `task.updated` with the final snapshot.
    pub fn delete_task(&self, id: &TaskId) -> Result<Option<Task>, StoreError> {
        let Some(task) = self.task(id)? else {
            return Ok(None);
        };
        self.with_conn(|conn| {
            conn.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])?;
            Ok(())
        })?;
        self.publish(DomainEvent::TaskUpdated { task: task.clone() });
        Ok(Some(task))
    }
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get("status")?;
    let column: String = row.get("kanban_column")?;
    let verification: String = row.get("verification_status")?;
    let target_role: Option<String> = row.get("target_role")?;
    let depends_on: String = row.get("depends_on")?;
    let subtask_ids: String = row.get("subtask_ids")?;

    let binding = match (
        row.get::<_, Option<String>>("bind_runtime_id")?,
        row.get::<_, Option<String>>("bind_session_name")?,
        row.get::<_, Option<i64>>("bind_window_index")?,
        row.get::<_, Option<i64>>("bind_pane_index")?,
    ) {
        (Some(runtime), Some(session), Some(window), Some(pane)) => Some(MuxBinding {
            runtime_id: RuntimeId::new(runtime),
            session_name: session,
            window_index: window as u32,
            pane_index: pane as u32,
        }),
        _ => None,
    };

    Ok(Task {
        id: TaskId::from_string(row.get::<_, String>("id")?),
        swim_lane_id: row.get::<_, Option<String>>("swim_lane_id")?.map(Into::into),
        description: row.get("description")?,
        details: row.get("details")?,
        target_role: target_role.as_deref().and_then(mh_core::AgentRole::parse),
        priority: row.get::<_, i64>("priority")? as u8,
        status: enum_from_str(&status).map_err(corrupt)?,
        kanban_column: KanbanColumn::parse(&column)
            .ok_or_else(|| corrupt(StoreError::Corrupt(format!("bad column {column:?}"))))?,
        auto_start: row.get("auto_start")?,
        auto_pilot: row.get("auto_pilot")?,
        auto_close: row.get("auto_close")?,
        use_worktree: row.get("use_worktree")?,
        ai_provider: row.get("ai_provider")?,
        ai_model: row.get("ai_model")?,
        depends_on: from_json(&depends_on).map_err(corrupt)?,
        parent_task_id: row.get::<_, Option<String>>("parent_task_id")?.map(Into::into),
        subtask_ids: from_json(&subtask_ids).map_err(corrupt)?,
        pipeline_run_id: row.get::<_, Option<String>>("pipeline_run_id")?.map(Into::into),
        pipeline_stage_id: row.get::<_, Option<String>>("pipeline_stage_id")?.map(Into::into),
        output: row.get("output")?,
        error_message: row.get("error_message")?,
        verification_status: enum_from_str(&verification).map_err(corrupt)?,
        sentinel_token: row.get("sentinel_token")?,
        binding,
        worktree_path: row.get::<_, Option<String>>("worktree_path")?.map(Into::into),
        assigned_agent_id: row.get::<_, Option<String>>("assigned_agent_id")?.map(Into::into),
        done_at: opt_ts(row.get("done_at")?),
        created_at: row.get::<_, i64>("created_at")? as u64,
        started_at: opt_ts(row.get("started_at")?),
        completed_at: opt_ts(row.get("completed_at")?),
    })
}

/// Adapt a decode failure to rusqlite's error channel.
pub(crate) fn corrupt(e: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())),
    )
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
