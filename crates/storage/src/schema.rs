// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema creation and migrations.
//!
//! Migrations are append-only: each entry runs at most once, tracked by
//! the `schema_version` pragma.

use rusqlite::Connection;

use crate::StoreError;

const MIGRATIONS: &[&str] = &[
    // v1: initial schema
    "
    CREATE TABLE IF NOT EXISTS lanes (
        id                   TEXT PRIMARY KEY,
        name                 TEXT NOT NULL,
        runtime_id           TEXT NOT NULL,
        working_dir          TEXT NOT NULL,
        session_name         TEXT NOT NULL,
        session_active       INTEGER NOT NULL DEFAULT 0,
        context_instructions TEXT,
        ai_provider          TEXT,
        model                TEXT,
        memory_file_id       TEXT,
        auto_start           INTEGER,
        auto_pilot           INTEGER,
        auto_close           INTEGER,
        use_worktree         INTEGER,
        created_at           INTEGER NOT NULL,
        updated_at           INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tasks (
        id                  TEXT PRIMARY KEY,
        swim_lane_id        TEXT REFERENCES lanes(id) ON DELETE SET NULL,
        description         TEXT NOT NULL,
        details             TEXT,
        target_role         TEXT,
        priority            INTEGER NOT NULL DEFAULT 5,
        status              TEXT NOT NULL,
        kanban_column       TEXT NOT NULL,
        auto_start          INTEGER,
        auto_pilot          INTEGER,
        auto_close          INTEGER,
        use_worktree        INTEGER,
        ai_provider         TEXT,
        ai_model            TEXT,
        depends_on          TEXT NOT NULL DEFAULT '[]',
        parent_task_id      TEXT,
        subtask_ids         TEXT NOT NULL DEFAULT '[]',
        pipeline_run_id     TEXT,
        pipeline_stage_id   TEXT,
        output              TEXT,
        error_message       TEXT,
        verification_status TEXT NOT NULL DEFAULT 'none',
        sentinel_token      TEXT,
        bind_runtime_id     TEXT,
        bind_session_name   TEXT,
        bind_window_index   INTEGER,
        bind_pane_index     INTEGER,
        worktree_path       TEXT,
        assigned_agent_id   TEXT,
        done_at             INTEGER,
        created_at          INTEGER NOT NULL,
        started_at          INTEGER,
        completed_at        INTEGER,
        updated_at          INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_tasks_lane ON tasks(swim_lane_id);
    CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(kanban_column);
    CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);

    CREATE TABLE IF NOT EXISTS agents (
        id               TEXT PRIMARY KEY,
        role             TEXT NOT NULL,
        provider         TEXT NOT NULL,
        model            TEXT,
        runtime_id       TEXT NOT NULL,
        session_name     TEXT NOT NULL,
        window_index     INTEGER NOT NULL,
        pane_index       INTEGER NOT NULL,
        state            TEXT NOT NULL,
        team_id          TEXT,
        swim_lane_id     TEXT,
        current_task_id  TEXT,
        expertise        TEXT NOT NULL DEFAULT '[]',
        created_at       INTEGER NOT NULL,
        last_activity_at INTEGER NOT NULL,
        error_message    TEXT,
        updated_at       INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_agents_state ON agents(state);

    CREATE TABLE IF NOT EXISTS teams (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        agent_ids   TEXT NOT NULL DEFAULT '[]',
        pipeline_id TEXT,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS pipelines (
        id         TEXT PRIMARY KEY,
        name       TEXT NOT NULL,
        stages     TEXT NOT NULL DEFAULT '[]',
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS pipeline_runs (
        id            TEXT PRIMARY KEY,
        pipeline_id   TEXT NOT NULL,
        status        TEXT NOT NULL,
        stage_results TEXT NOT NULL DEFAULT '{}',
        started_at    INTEGER NOT NULL,
        completed_at  INTEGER,
        updated_at    INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_runs_pipeline ON pipeline_runs(pipeline_id);

    CREATE TABLE IF NOT EXISTS favorites (
        id         TEXT PRIMARY KEY,
        kind       TEXT NOT NULL,
        ref_id     TEXT NOT NULL,
        label      TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS templates (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL,
        description TEXT NOT NULL,
        details     TEXT,
        role        TEXT,
        built_in    INTEGER NOT NULL DEFAULT 0,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS agent_messages (
        id         TEXT PRIMARY KEY,
        from_agent TEXT NOT NULL,
        to_agent   TEXT NOT NULL,
        content    TEXT NOT NULL,
        ts         INTEGER NOT NULL,
        read       INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_messages_to ON agent_messages(to_agent);
    ",
];

/// Apply outstanding migrations.
pub(crate) fn migrate(conn: &Connection) -> Result<(), StoreError> {
    let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let target = (i + 1) as i64;
        if version >= target {
            continue;
        }
        conn.execute_batch(migration)?;
        conn.pragma_update(None, "user_version", target)?;
        tracing::info!(version = target, "applied schema migration");
    }
    Ok(())
}
