// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-close: summarise a finished task's pane, then tear the window
//! down.
//!
//! The summariser is deterministic, no model involved: it classifies
//! captured lines into commands, outcomes and errors and emits a
//! sectioned markdown digest, falling back to the raw session tail when
//! nothing classifies.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mh_core::{Clock, DomainError, DomainEvent, KanbanColumn, Task, TaskId};

use crate::Engine;

/// Pane lines captured for the digest.
const CAPTURE_LINES: u32 = 500;
/// Marker under which the digest is appended to the description.
const SUMMARY_SEPARATOR: &str = "**Auto-close session summary:**";

const OUTCOME_KEYWORDS: &[&str] =
    &["passed", "success", "completed", "done", "deployed", "merged", "built", "created"];
const ERROR_KEYWORDS: &[&str] = &["error", "fail", "exception", "panic", "abort", "fatal", "warn"];

impl<C: Clock> Engine<C> {
    /// One monitor pass over finished tasks with live windows.
    pub async fn autoclose_tick(self: &Arc<Self>) {
        let delay = self.periods().autoclose_delay_ms;
        let now = self.now();

        let candidates = match self.store.tasks_in_column(KanbanColumn::Done) {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "auto-close scan failed");
                return;
            }
        };

        for task in candidates {
            let Some(done_at) = task.done_at else { continue };
            if task.binding.is_none() || now.saturating_sub(done_at) < delay {
                continue;
            }
            // Per-task guard against overlapping scans
            if !self.autoclose_busy.lock().insert(task.id.clone()) {
                continue;
            }
            let result = self.close_task_window(&task).await;
            self.autoclose_busy.lock().remove(&task.id);
            if let Err(e) = result {
                warn!(task_id = %task.id, error = %e, "auto-close failed");
            }
        }
    }

    /// Summarise and tear down one task's window immediately
    /// (`kanban.summarizeTask` and the timer path).
    pub async fn close_task_window(self: &Arc<Self>, task: &Task) -> Result<(), DomainError> {
        let Some(binding) = task.binding.clone() else {
            return Err(DomainError::precondition("Task has no live window."));
        };
        let rt = self.runtime(&binding.runtime_id)?.clone();

        let captured = self
            .mux
            .capture(&rt, &binding.session_name, binding.window_index, binding.pane_index, CAPTURE_LINES)
            .await
            .unwrap_or_default();
        let summary = summarize_capture(&captured);

        let mut task = task.clone();
        let stamp = chrono::DateTime::from_timestamp_millis(self.now() as i64)
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_default();
        task.description = format!("{}\n\n{SUMMARY_SEPARATOR} ({stamp})\n\n{summary}", task.description);

        if let Err(e) = self.mux.kill_window(&rt, &binding.session_name, binding.window_index).await
        {
            debug!(task_id = %task.id, error = %e, "window already gone at auto-close");
        }
        self.remove_task_worktree(&task).await;

        task.binding = None;
        task.sentinel_token = None;
        task.worktree_path = None;
        self.store.save_task(&task)?;
        self.publish(DomainEvent::TaskAutoCloseCompleted { task_id: task.id.clone() });
        info!(task_id = %task.id, "auto-closed");
        Ok(())
    }

    /// Manual trigger by task id.
    pub async fn summarize_task(self: &Arc<Self>, id: &TaskId) -> Result<Task, DomainError> {
        let task = self.require_task(id)?;
        self.close_task_window(&task).await?;
        self.require_task(id)
    }
}

/// Deterministic digest of a captured session.
///
/// Classifies lines into commands (`$`/`>`/`#` prefixes, or starting
/// with `running`/`executing`), outcomes and errors by keyword, and
/// emits a sectioned markdown digest. Falls back to the last lines of
/// the capture when nothing classifies.
pub fn summarize_capture(captured: &str) -> String {
    let mut commands: Vec<&str> = Vec::new();
    let mut outcomes: Vec<&str> = Vec::new();
    let mut errors: Vec<&str> = Vec::new();

    for line in captured.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();
        if trimmed.starts_with('$')
            || trimmed.starts_with('>')
            || trimmed.starts_with('#')
            || lower.starts_with("running")
            || lower.starts_with("executing")
        {
            commands.push(trimmed);
        } else if ERROR_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            errors.push(trimmed);
        } else if OUTCOME_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            outcomes.push(trimmed);
        }
    }

    if commands.is_empty() && outcomes.is_empty() && errors.is_empty() {
        let tail: Vec<&str> = captured.lines().rev().take(15).collect();
        let tail: Vec<&str> = tail.into_iter().rev().collect();
        return format!("Session tail:\n```\n{}\n```", tail.join("\n").trim());
    }

    let mut out = String::new();
    push_section(&mut out, "Commands", &commands, 10);
    push_section(&mut out, "Outcomes", &outcomes, 10);
    push_section(&mut out, "Errors", &errors, 10);
    out.trim_end().to_string()
}

fn push_section(out: &mut String, title: &str, lines: &[&str], cap: usize) {
    if lines.is_empty() {
        return;
    }
    out.push_str(&format!("### {title}\n"));
    for line in lines.iter().take(cap) {
        out.push_str(&format!("- {line}\n"));
    }
    if lines.len() > cap {
        out.push_str(&format!("- …and {} more\n", lines.len() - cap));
    }
    out.push('\n');
}

#[cfg(test)]
#[path = "autoclose_tests.rs"]
mod tests;
