// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task sentinel watchers.
//!
//! Each auto-close task owns one short-lived watcher task that scans
//! the pane tail every few seconds for the completion markers, then
//! terminates. Watchers also carry the optional auto-pilot injector:
//! when the status heuristic reports `waiting` for two consecutive
//! ticks, a canned continue line is sent. The heuristic can
//! false-positive on CLI menus, so this stays best-effort.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mh_adapters::registry::{detect_status, PaneStatus};
use mh_core::{Clock, DomainError, DomainEvent, KanbanColumn, TaskId, VerificationStatus};

use crate::sentinel::{self, SentinelScan};
use crate::Engine;

/// Pane lines scanned per tick.
const CAPTURE_LINES: u32 = 500;
/// Consecutive `waiting` ticks before the auto-pilot injects.
const AUTOPILOT_GRACE_TICKS: u32 = 2;
/// The canned auto-pilot response.
const AUTOPILOT_NUDGE: &str = "continue";

impl<C: Clock> Engine<C> {
    /// Arm a sentinel watcher for a launched auto-close task.
    pub(crate) fn spawn_watcher(self: &Arc<Self>, task_id: TaskId, autopilot: bool, verification: bool) {
        let token = self.shutdown_token().child_token();
        {
            let mut watchers = self.watchers.lock();
            if let Some(previous) = watchers.insert(task_id.clone(), token.clone()) {
                previous.cancel();
            }
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            engine.watch_task(task_id, autopilot, verification, token).await;
        });
    }

    /// Cancel a task's watcher, if one is running.
    pub(crate) fn cancel_watcher(&self, task_id: &TaskId) {
        if let Some(token) = self.watchers.lock().remove(task_id) {
            token.cancel();
        }
    }

    /// Re-arm watchers for recovered tasks (daemon restart).
    pub(crate) fn rearm_watcher(self: &Arc<Self>, task_id: TaskId, autopilot: bool) {
        info!(task_id = %task_id, "re-arming sentinel watcher");
        self.spawn_watcher(task_id, autopilot, false);
    }

    async fn watch_task(
        self: Arc<Self>,
        task_id: TaskId,
        autopilot: bool,
        verification: bool,
        cancel: CancellationToken,
    ) {
        let period = Duration::from_millis(self.periods().watcher_ms.max(250));
        let mut waiting_ticks = 0u32;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(task_id = %task_id, "watcher cancelled");
                    return;
                }
                _ = tokio::time::sleep(period) => {}
            }

            match self.watch_tick(&task_id, autopilot, verification, &mut waiting_ticks).await {
                Ok(true) => break,
                Ok(false) => {}
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "watcher failed, marking task failed");
                    self.fail_watched_task(&task_id, &e);
                    break;
                }
            }
        }
        self.watchers.lock().remove(&task_id);
    }

    /// One scan; returns `true` when the watcher is finished.
    async fn watch_tick(
        self: &Arc<Self>,
        task_id: &TaskId,
        autopilot: bool,
        verification: bool,
        waiting_ticks: &mut u32,
    ) -> Result<bool, DomainError> {
        let Some(task) = self.store.task(task_id)? else {
            return Ok(true);
        };
        if task.kanban_column == KanbanColumn::Done {
            return Ok(true);
        }
        let (Some(binding), Some(token)) = (task.binding.clone(), task.sentinel_token.clone())
        else {
            // Stopped or unbound from under us; nothing left to watch
            return Ok(true);
        };

        let rt = self.runtime(&binding.runtime_id)?.clone();
        let captured = self
            .mux
            .capture(&rt, &binding.session_name, binding.window_index, binding.pane_index, CAPTURE_LINES)
            .await?;

        match sentinel::scan(&captured, &token) {
            SentinelScan::Done { summary } => {
                let mut task = task;
                // Malformed summary: fall back to the raw session tail
                task.output = Some(summary.unwrap_or_else(|| tail_of(&captured, 40)));
                if verification {
                    task.verification_status = VerificationStatus::Pending;
                }
                self.store.save_task(&task)?;
                if verification {
                    self.publish(DomainEvent::TaskVerificationStarted { task_id: task.id.clone() });
                }
                self.store.move_task(task_id, KanbanColumn::Done)?;
                info!(task_id = %task_id, "sentinel complete");
                self.on_task_completed(task_id).await?;
                Ok(true)
            }
            SentinelScan::NotReady => {
                if autopilot {
                    self.autopilot_nudge(&rt, &binding, &captured, waiting_ticks).await?;
                }
                Ok(false)
            }
        }
    }

    /// Inject a canned continue once `waiting` has persisted through
    /// the grace interval.
    async fn autopilot_nudge(
        &self,
        rt: &mh_core::RuntimeDef,
        binding: &mh_core::MuxBinding,
        captured: &str,
        waiting_ticks: &mut u32,
    ) -> Result<(), DomainError> {
        if detect_status(captured) == PaneStatus::Waiting {
            *waiting_ticks += 1;
        } else {
            *waiting_ticks = 0;
            return Ok(());
        }
        if *waiting_ticks >= AUTOPILOT_GRACE_TICKS {
            debug!(session = %binding.session_name, "auto-pilot nudge");
            self.mux
                .send_keys(
                    rt,
                    &binding.session_name,
                    binding.window_index,
                    binding.pane_index,
                    AUTOPILOT_NUDGE,
                    true,
                )
                .await?;
            *waiting_ticks = 0;
        }
        Ok(())
    }

    fn fail_watched_task(&self, task_id: &TaskId, error: &DomainError) {
        let result = self.store.task(task_id).and_then(|task| match task {
            Some(mut task) => {
                task.status = mh_core::TaskStatus::Failed;
                task.error_message = Some(error.message.clone());
                self.store.save_task(&task)
            }
            None => Ok(()),
        });
        if let Err(e) = result {
            warn!(task_id = %task_id, error = %e, "could not record watcher failure");
        }
    }
}

/// Last `lines` lines of a capture.
fn tail_of(captured: &str, lines: usize) -> String {
    let all: Vec<&str> = captured.lines().collect();
    let start = all.len().saturating_sub(lines);
    all[start..].join("\n").trim().to_string()
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
