// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciliation: bring the daemon's beliefs about sessions and
//! bindings back in line with tmux ground truth.
//!
//! Runs once at startup and then periodically. The reconciler never
//! destroys user sessions — it only adjusts what the daemon believes.

use std::sync::Arc;

use tracing::{info, warn};

use mh_core::{resolve_flag, Clock, KanbanColumn, MuxBinding, TaskStatus};

use crate::Engine;

impl<C: Clock> Engine<C> {
    /// One reconciliation pass.
    pub async fn reconcile_tick(self: &Arc<Self>) {
        if let Err(e) = self.reconcile_lanes().await {
            warn!(error = %e, "lane reconciliation failed");
        }
        if let Err(e) = self.reconcile_bindings().await {
            warn!(error = %e, "binding reconciliation failed");
        }
    }

    /// Lanes claiming an active session whose session is gone: correct
    /// the belief and clear any task bindings into it.
    async fn reconcile_lanes(self: &Arc<Self>) -> Result<(), mh_core::DomainError> {
        for lane in self.store.lanes()? {
            if !lane.session_active {
                continue;
            }
            let Ok(rt) = self.runtime(&lane.runtime_id) else {
                continue;
            };
            let rt = rt.clone();
            let sessions = match self.mux.list_sessions(&rt).await {
                Ok(sessions) => sessions,
                Err(e) => {
                    // Unreachable runtime: leave beliefs alone, retry next tick
                    warn!(lane = %lane.id, error = %e, "runtime unreachable during reconcile");
                    continue;
                }
            };
            if sessions.iter().any(|s| s == &lane.session_name) {
                continue;
            }

            info!(lane = %lane.id, session = %lane.session_name, "lane session vanished");
            let mut lane = lane;
            lane.session_active = false;
            self.store.save_lane(&lane)?;

            for task in self.store.tasks_in_lane(lane.id.as_str())? {
                if let Some(binding) = &task.binding {
                    if binding.session_name == lane.session_name {
                        self.cancel_watcher(&task.id);
                        let mut task = task;
                        task.binding = None;
                        self.store.save_task(&task)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Tasks with bindings: confirm the window still exists, rebind by
    /// the window-name anchor when the index moved, clear otherwise.
    /// Also recovers in-progress auto-start tasks that lost their
    /// binding while the daemon was down.
    async fn reconcile_bindings(self: &Arc<Self>) -> Result<(), mh_core::DomainError> {
        for task in self.store.bound_tasks()? {
            let Some(binding) = task.binding.clone() else {
                continue;
            };
            let Ok(rt) = self.runtime(&binding.runtime_id) else {
                continue;
            };
            let rt = rt.clone();
            let tree = match self.mux.get_tree_fresh(&rt).await {
                Ok(tree) => tree,
                Err(e) => {
                    warn!(task_id = %task.id, error = %e, "runtime unreachable during reconcile");
                    continue;
                }
            };
            let session = tree.iter().find(|s| s.session == binding.session_name);
            let window_alive = session
                .map(|s| s.window(binding.window_index).is_some_and(|w| w.name.contains(task.short_id())))
                .unwrap_or(false);
            if window_alive {
                continue;
            }

            // Window index is stale; the name anchor is authoritative
            let rebound = session.and_then(|s| s.find_window_containing(task.short_id()));
            let mut task = task;
            match rebound {
                Some(window) => {
                    info!(task_id = %task.id, window = window.index, "rebound task window");
                    task.binding = Some(MuxBinding { window_index: window.index, ..binding });
                    self.store.save_task(&task)?;
                    self.rearm_recovered(&task);
                }
                None => {
                    info!(task_id = %task.id, "task window vanished, clearing binding");
                    self.cancel_watcher(&task.id);
                    task.binding = None;
                    // Worktree teardown is left to stop/restart paths;
                    // the tree may still hold uncommitted agent work.
                    self.store.save_task(&task)?;
                }
            }
        }

        // Recovery: in-progress auto-start tasks with no binding whose
        // lane session is live again (daemon restart with live windows).
        for task in self.store.tasks_in_column(KanbanColumn::InProgress)? {
            if task.binding.is_some() || task.status != TaskStatus::InProgress {
                continue;
            }
            let Some(lane_id) = &task.swim_lane_id else { continue };
            let Some(lane) = self.store.lane(lane_id)? else { continue };
            if !resolve_flag(task.auto_start, lane.auto_start) {
                continue;
            }
            let Ok(rt) = self.runtime(&lane.runtime_id) else { continue };
            let rt = rt.clone();
            let Ok(tree) = self.mux.get_tree_fresh(&rt).await else { continue };
            let Some(session) = tree.iter().find(|s| s.session == lane.session_name) else {
                continue;
            };
            if let Some(window) = session.find_window_containing(task.short_id()) {
                info!(task_id = %task.id, window = window.index, "recovered live task window");
                let mut task = task;
                task.binding = Some(MuxBinding {
                    runtime_id: lane.runtime_id.clone(),
                    session_name: lane.session_name.clone(),
                    window_index: window.index,
                    pane_index: 0,
                });
                self.store.save_task(&task)?;
                self.rearm_recovered(&task);
            }
        }
        Ok(())
    }

    /// Re-arm the sentinel watcher for a recovered task that still
    /// carries its token.
    fn rearm_recovered(self: &Arc<Self>, task: &mh_core::Task) {
        if task.sentinel_token.is_none() {
            return;
        }
        if self.watchers.lock().contains_key(&task.id) {
            return;
        }
        let autopilot = task.auto_pilot.unwrap_or(false);
        self.rearm_watcher(task.id.clone(), autopilot);
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
