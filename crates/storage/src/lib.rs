// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable persistence for muxherd.
//!
//! One SQLite database file holds every entity: tasks, swim lanes,
//! agents, teams, pipelines, pipeline runs, favourites, templates and
//! agent messages. The store is the exclusive owner of persisted state:
//! every mutating method (i) writes, (ii) fires exactly one domain
//! event through the [`EventSink`], (iii) returns. Reads are
//! synchronous snapshots.
//!
//! Writes are serialised through a single connection behind a mutex —
//! the single-writer discipline means no queue-bomb is possible. Events
//! are published after the lock is released.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod agents;
mod lanes;
mod misc;
mod pipelines;
mod schema;
mod tasks;
mod teams;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;

use mh_core::{Clock, DomainError, DomainEvent, EventSink, SystemClock};

/// Storage-layer failures. Fatal for the daemon process — the
/// supervisor restarts on them rather than limping on with a broken
/// database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        DomainError::internal(format!("storage failure: {e}"))
    }
}

type SyncHook = Box<dyn Fn() + Send + Sync>;

/// The embedded SQL store.
pub struct Store {
    conn: Mutex<Connection>,
    sink: Arc<dyn EventSink>,
    path: PathBuf,
    /// Monotonic `updated_at` stamp; never repeats even within one ms.
    stamp: AtomicU64,
    sync_hooks: Mutex<Vec<SyncHook>>,
}

impl Store {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open(path: &Path, sink: Arc<dyn EventSink>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn, sink, path.to_path_buf())
    }

    /// In-memory store for tests.
    pub fn open_in_memory(sink: Arc<dyn EventSink>) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, sink, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, sink: Arc<dyn EventSink>, path: PathBuf) -> Result<Self, StoreError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        schema::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            sink,
            path,
            stamp: AtomicU64::new(SystemClock.epoch_ms()),
            sync_hooks: Mutex::new(Vec::new()),
        })
    }

    /// Database file path (for health reporting).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cheap liveness probe for `health.get`.
    pub fn healthy(&self) -> bool {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
    }

    /// Register a coarse "refresh everything" hook fired when an
    /// external writer mutates the database file.
    pub fn on_sync(&self, hook: impl Fn() + Send + Sync + 'static) {
        self.sync_hooks.lock().push(Box::new(hook));
    }

    /// Invoke every registered sync hook.
    pub fn notify_sync(&self) {
        for hook in self.sync_hooks.lock().iter() {
            hook();
        }
    }

    /// Next monotonic `updated_at` value.
    pub(crate) fn next_stamp(&self) -> u64 {
        let now = SystemClock.epoch_ms();
        self.stamp
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                Some(now.max(prev + 1))
            })
            .map(|prev| now.max(prev + 1))
            .unwrap_or(now)
    }

    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub(crate) fn publish(&self, event: DomainEvent) {
        self.sink.publish(event);
    }
}

/// Encode a unit-variant enum as its bare serde string.
pub(crate) fn enum_to_str<T: Serialize>(value: &T) -> Result<String, StoreError> {
    match serde_json::to_value(value)? {
        serde_json::Value::String(s) => Ok(s),
        other => Err(StoreError::Corrupt(format!("expected string encoding, got {other}"))),
    }
}

/// Decode a unit-variant enum from its bare serde string.
pub(crate) fn enum_from_str<T: DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_value(serde_json::Value::String(s.to_string()))?)
}

/// Encode a list/struct column as JSON.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a list/struct column from JSON.
pub(crate) fn from_json<T: DeserializeOwned>(s: &str) -> Result<T, StoreError> {
    Ok(serde_json::from_str(s)?)
}

/// Convert an optional u64 timestamp to a nullable i64 column.
pub(crate) fn ts_opt(v: Option<u64>) -> Option<i64> {
    v.map(|t| t as i64)
}

/// Convert a nullable i64 column back to an optional u64 timestamp.
pub(crate) fn opt_ts(v: Option<i64>) -> Option<u64> {
    v.map(|t| t as u64)
}
