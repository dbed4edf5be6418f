// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The muxherd engine: orchestrator, task launcher, pipeline engine,
//! auto-close monitor and reconciler.
//!
//! One [`Engine`] value owns the moving parts and is shared behind an
//! `Arc` by the daemon's listener and background workers. All persisted
//! state lives in the [`Store`]; the engine keeps only the in-memory
//! agent registry, the set of live sentinel watchers, and the
//! auto-close processing guard. Public methods lock briefly and never
//! hold a lock across a capture or an RPC.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod autoclose;
mod launcher;
mod orchestrator;
mod pipeline;
pub mod prompt;
mod reconcile;
pub mod sentinel;
mod watcher;

#[cfg(test)]
mod test_helpers;

pub use autoclose::summarize_capture;
pub use launcher::LaunchOptions;
pub use orchestrator::SpawnAgentParams;
pub use pipeline::built_in_pipelines;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use mh_adapters::{MuxDriver, RuntimeRegistry};
use mh_core::{
    AgentId, AgentRecord, Clock, DomainError, DomainEvent, EventSink, Periods, RuntimeDef,
    RuntimeId, SystemClock, TaskId,
};
use mh_storage::Store;

/// Shared engine context.
pub struct Engine<C: Clock = SystemClock> {
    pub store: Arc<Store>,
    pub mux: Arc<dyn MuxDriver>,
    pub registry: Arc<RuntimeRegistry>,
    sink: Arc<dyn EventSink>,
    clock: C,
    periods: Periods,
    runtimes: HashMap<RuntimeId, RuntimeDef>,
    /// In-memory agent registry; short critical sections only.
    agents: Mutex<HashMap<AgentId, AgentRecord>>,
    /// Live sentinel watchers by task, cancelled on stop/shutdown.
    watchers: Mutex<HashMap<TaskId, CancellationToken>>,
    /// Per-task guard against overlapping auto-close scans.
    autoclose_busy: Mutex<HashSet<TaskId>>,
    /// Cancelled once at daemon shutdown; watchers inherit it.
    shutdown: CancellationToken,
}

impl<C: Clock> Engine<C> {
    pub fn new(
        store: Arc<Store>,
        mux: Arc<dyn MuxDriver>,
        registry: Arc<RuntimeRegistry>,
        sink: Arc<dyn EventSink>,
        runtimes: Vec<RuntimeDef>,
        periods: Periods,
        clock: C,
    ) -> Self {
        let agents = store
            .agents()
            .map(|list| {
                list.into_iter()
                    .filter(|a| !a.state.is_terminal())
                    .map(|a| (a.id.clone(), a))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            store,
            mux,
            registry,
            sink,
            clock,
            periods,
            runtimes: runtimes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            agents: Mutex::new(agents),
            watchers: Mutex::new(HashMap::new()),
            autoclose_busy: Mutex::new(HashSet::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn periods(&self) -> &Periods {
        &self.periods
    }

    pub fn runtimes(&self) -> Vec<&RuntimeDef> {
        let mut list: Vec<&RuntimeDef> = self.runtimes.values().collect();
        list.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        list
    }

    pub fn runtime(&self, id: &RuntimeId) -> Result<&RuntimeDef, DomainError> {
        self.runtimes
            .get(id)
            .ok_or_else(|| DomainError::not_found(format!("Runtime {id} is not configured.")))
    }

    /// Token cancelled at daemon shutdown; loops and watchers observe it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel every watcher and signal shutdown.
    pub fn begin_shutdown(&self) {
        self.shutdown.cancel();
        for (_, token) in self.watchers.lock().drain() {
            token.cancel();
        }
    }

    pub(crate) fn publish(&self, event: DomainEvent) {
        self.sink.publish(event);
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }
}
