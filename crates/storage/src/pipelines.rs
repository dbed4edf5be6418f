// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline and run persistence.

use rusqlite::{params, OptionalExtension, Row};

use mh_core::{DomainEvent, Pipeline, PipelineId, PipelineRun, RunId, RunStatus};

use crate::tasks::corrupt;
use crate::{enum_from_str, enum_to_str, from_json, opt_ts, to_json, ts_opt, Store, StoreError};

impl Store {
    pub fn save_pipeline(&self, pipeline: &Pipeline) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pipelines (id, name, stages, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    pipeline.id.as_str(),
                    pipeline.name,
                    to_json(&pipeline.stages)?,
                    pipeline.created_at as i64,
                    updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn pipeline(&self, id: &PipelineId) -> Result<Option<Pipeline>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM pipelines WHERE id = ?1",
                params![id.as_str()],
                row_to_pipeline,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    pub fn pipelines(&self) -> Result<Vec<Pipeline>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM pipelines ORDER BY created_at")?;
            let rows = stmt.query_map([], row_to_pipeline)?;
            let mut pipelines = Vec::new();
            for row in rows {
                pipelines.push(row?);
            }
            Ok(pipelines)
        })
    }

    pub fn delete_pipeline(&self, id: &PipelineId) -> Result<bool, StoreError> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM pipelines WHERE id = ?1", params![id.as_str()])?;
            Ok(n > 0)
        })
    }

    /// Insert or update a run; fires `pipeline.run.updated`.
    pub fn save_run(&self, run: &PipelineRun) -> Result<(), StoreError> {
        let updated_at = self.next_stamp() as i64;
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO pipeline_runs
                    (id, pipeline_id, status, stage_results, started_at, completed_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    run.id.as_str(),
                    run.pipeline_id.as_str(),
                    enum_to_str(&run.status)?,
                    to_json(&run.stage_results)?,
                    run.started_at as i64,
                    ts_opt(run.completed_at),
                    updated_at,
                ],
            )?;
            Ok(())
        })?;
        self.publish(DomainEvent::PipelineRunUpdated { run: run.clone() });
        Ok(())
    }

    pub fn run(&self, id: &RunId) -> Result<Option<PipelineRun>, StoreError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT * FROM pipeline_runs WHERE id = ?1",
                params![id.as_str()],
                row_to_run,
            )
            .optional()
            .map_err(StoreError::from)
        })
    }

    pub fn runs(&self) -> Result<Vec<PipelineRun>, StoreError> {
        self.query_runs("SELECT * FROM pipeline_runs ORDER BY started_at", params![])
    }

    /// Runs that are `running` or `paused`.
    pub fn active_runs(&self) -> Result<Vec<PipelineRun>, StoreError> {
        self.query_runs(
            "SELECT * FROM pipeline_runs WHERE status IN ('running', 'paused') ORDER BY started_at",
            params![],
        )
    }

    fn query_runs(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<PipelineRun>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(params, row_to_run)?;
            let mut runs = Vec::new();
            for row in rows {
                runs.push(row?);
            }
            Ok(runs)
        })
    }
}

fn row_to_pipeline(row: &Row<'_>) -> rusqlite::Result<Pipeline> {
    let stages: String = row.get("stages")?;
    Ok(Pipeline {
        id: PipelineId::from_string(row.get::<_, String>("id")?),
        name: row.get("name")?,
        stages: from_json(&stages).map_err(corrupt)?,
        created_at: row.get::<_, i64>("created_at")? as u64,
        updated_at: row.get::<_, i64>("updated_at")? as u64,
    })
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<PipelineRun> {
    let status: String = row.get("status")?;
    let results: String = row.get("stage_results")?;
    let status: RunStatus = enum_from_str(&status).map_err(corrupt)?;
    Ok(PipelineRun {
        id: RunId::from_string(row.get::<_, String>("id")?),
        pipeline_id: PipelineId::from_string(row.get::<_, String>("pipeline_id")?),
        status,
        stage_results: from_json(&results).map_err(corrupt)?,
        started_at: row.get::<_, i64>("started_at")? as u64,
        completed_at: opt_ts(row.get("completed_at")?),
    })
}

#[cfg(test)]
#[path = "pipelines_tests.rs"]
mod tests;
