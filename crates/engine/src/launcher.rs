// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The task launcher: swim-lane task → live tmux window running an AI
//! CLI, plus stop/restart/attach and the auto-start cascade.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use mh_core::{
    resolve_flag, Clock, DomainError, KanbanColumn, MuxBinding, RuntimeDef, SwimLane, Task, TaskId,
    TaskStatus, VerificationStatus,
};

use mh_adapters::mux::NewSessionOpts;
use mh_adapters::worktree;

use crate::prompt::{self, PromptCtx};
use crate::sentinel;
use crate::Engine;

/// Disposable first window of a freshly created lane session.
const LANE_INIT_WINDOW: &str = "__lane_init__";

/// Caller-controlled launch behaviour.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Appended to the prompt before the closing context line.
    pub extra_instructions: Option<String>,
    /// Ask the user for context first instead of implementing directly.
    pub ask_for_context: bool,
    /// Mark the task `verification: pending` when the sentinel fires.
    pub verification: bool,
}

impl<C: Clock> Engine<C> {
    /// Validate and persist a new task; auto-started tasks with a lane
    /// launch immediately.
    pub async fn submit_task(self: &Arc<Self>, mut task: Task) -> Result<Task, DomainError> {
        if task.description.trim().is_empty() {
            return Err(DomainError::invalid_param("Task description must not be empty."));
        }
        if !(1..=10).contains(&task.priority) {
            return Err(DomainError::invalid_param("Task priority must be between 1 and 10."));
        }
        if !task.depends_on.is_empty() {
            let edges: HashMap<TaskId, Vec<TaskId>> = self
                .store
                .tasks()?
                .into_iter()
                .map(|t| (t.id, t.depends_on))
                .collect();
            if mh_core::would_cycle(&task.id, &task.depends_on, &edges) {
                return Err(DomainError::conflict(
                    "Task dependencies would introduce a cycle.",
                ));
            }
        }
        let lane = match &task.swim_lane_id {
            Some(id) => Some(self.store.lane(id)?.ok_or_else(|| {
                DomainError::not_found(format!("Swim lane {id} is unknown."))
            })?),
            None => None,
        };
        if task.created_at == 0 {
            task.created_at = self.now();
        }
        self.store.save_task(&task)?;

        if let Some(lane) = lane {
            if resolve_flag(task.auto_start, lane.auto_start) {
                if let Err(e) = self.start_task(&task.id, LaunchOptions::default()).await {
                    warn!(task_id = %task.id, error = %e, "auto-start launch failed");
                }
            }
        }
        self.store
            .task(&task.id)?
            .ok_or_else(|| DomainError::internal("Task vanished during submit."))
    }

    /// Launch a task into a window inside its lane's session.
    ///
    /// Returns a boxed future (rather than being declared `async fn`) to
    /// break the recursive-Send-inference cycle with
    /// `cascade_dependencies`, which calls back into this function.
    pub fn start_task<'a>(
        self: &'a Arc<Self>,
        id: &'a TaskId,
        opts: LaunchOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Task, DomainError>> + Send + 'a>>
    {
        Box::pin(async move {
        let mut task = self.require_task(id)?;

        // Preconditions, checked in order
        let lane_id = task
            .swim_lane_id
            .clone()
            .ok_or_else(|| DomainError::precondition("Task has no swim lane."))?;
        let lane = self
            .store
            .lane(&lane_id)?
            .ok_or_else(|| DomainError::not_found(format!("Swim lane {lane_id} is unknown.")))?;
        if task.binding.is_some() && task.status == TaskStatus::InProgress {
            return Err(DomainError::conflict("Task is already running."));
        }

        // Dependency gate: incomplete dependencies either cascade
        // (auto-start) or block the launch.
        let incomplete = self.incomplete_deps(&task)?;
        if !incomplete.is_empty() {
            if resolve_flag(task.auto_start, lane.auto_start) {
                self.cascade_dependencies(&incomplete).await?;
                debug!(task_id = %task.id, "deferred behind {} dependencies", incomplete.len());
                return self.require_task(id);
            }
            return Err(DomainError::precondition(
                "Task has incomplete dependencies.",
            ));
        }

        let rt = self.runtime(&lane.runtime_id)?.clone();
        self.ensure_lane_session(&rt, &lane).await?;

        // Worktree isolation
        if resolve_flag(task.use_worktree, lane.use_worktree) && task.worktree_path.is_none() {
            let path = worktree::create(self.mux.as_ref(), &rt, &lane.working_dir, task.short_id())
                .await
                .map_err(|e| {
                    DomainError::runtime_unavailable(format!("Worktree creation failed: {e}"))
                })?;
            task.worktree_path = Some(path);
        }

        let profile = self
            .registry
            .resolve_provider(task.ai_provider.as_deref(), lane.ai_provider.as_deref())
            .clone();
        let model = self.registry.resolve_model(task.ai_model.as_deref(), lane.model.as_deref());

        // The window name embeds task.id[:15]; the reconciler rebinds by it.
        let window_name = task.window_name();
        let cwd = task.worktree_path.clone().unwrap_or_else(|| lane.working_dir.clone());
        let window = self
            .mux
            .new_window(&rt, &lane.session_name, Some(&window_name), Some(&cwd))
            .await?;

        self.kill_lane_placeholder(&rt, &lane).await;

        // Launch the CLI, wait out its warm-up, then paste the prompt.
        let launch = self.registry.interactive_launch(&profile, model.as_deref());
        self.mux.send_keys(&rt, &lane.session_name, window, 0, &launch, true).await?;
        if profile.warmup_ms > 0 {
            tokio::time::sleep(Duration::from_millis(profile.warmup_ms)).await;
        }

        let auto_close = resolve_flag(task.auto_close, lane.auto_close);
        let token = auto_close.then(sentinel::fresh_token);
        let text = self.compose_launch_prompt(&task, &lane, &opts, token.as_deref())?;
        self.mux.send_keys(&rt, &lane.session_name, window, 0, &text, true).await?;

        task.binding = Some(MuxBinding {
            runtime_id: lane.runtime_id.clone(),
            session_name: lane.session_name.clone(),
            window_index: window,
            pane_index: 0,
        });
        task.sentinel_token = token.clone();
        task.status = TaskStatus::InProgress;
        task.started_at = Some(self.now());
        if opts.verification {
            task.verification_status = VerificationStatus::Pending;
        }
        self.store.save_task(&task)?;
        self.store.move_task(&task.id, KanbanColumn::InProgress)?;

        if auto_close {
            let autopilot = resolve_flag(task.auto_pilot, lane.auto_pilot);
            self.spawn_watcher(task.id.clone(), autopilot, opts.verification);
        }

        info!(task_id = %task.id, window = %window_name, "task launched");
        self.require_task(id)
        })
    }

    /// Kill the bound window and reset the task to pending/todo.
    pub async fn stop_task(self: &Arc<Self>, id: &TaskId) -> Result<Task, DomainError> {
        let mut task = self.require_task(id)?;
        self.cancel_watcher(id);

        if let Some(binding) = task.binding.take() {
            let rt = self.runtime(&binding.runtime_id)?.clone();
            if let Err(e) =
                self.mux.kill_window(&rt, &binding.session_name, binding.window_index).await
            {
                debug!(task_id = %id, error = %e, "window already gone at stop");
            }
            self.remove_task_worktree(&task).await;
        }

        task.worktree_path = None;
        task.sentinel_token = None;
        task.status = TaskStatus::Pending;
        task.started_at = None;
        self.store.save_task(&task)?;
        self.store.move_task(id, KanbanColumn::Todo)?;
        self.require_task(id)
    }

    /// Stop then relaunch.
    pub async fn restart_task(
        self: &Arc<Self>,
        id: &TaskId,
        opts: LaunchOptions,
    ) -> Result<Task, DomainError> {
        self.stop_task(id).await?;
        self.start_task(id, opts).await
    }

    /// Read-only window coordinates for a client wanting to attach.
    pub fn attach_task(&self, id: &TaskId) -> Result<MuxBinding, DomainError> {
        let task = self.require_task(id)?;
        task.binding
            .ok_or_else(|| DomainError::precondition("Task has no live window."))
    }

    /// Kill a lane's session and clear every binding into it.
    pub async fn kill_lane_session(self: &Arc<Self>, lane_id: &mh_core::LaneId) -> Result<(), DomainError> {
        let mut lane = self
            .store
            .lane(lane_id)?
            .ok_or_else(|| DomainError::not_found(format!("Swim lane {lane_id} is unknown.")))?;
        let rt = self.runtime(&lane.runtime_id)?.clone();

        for task in self.store.tasks_in_lane(lane_id.as_str())? {
            if let Some(binding) = &task.binding {
                if binding.session_name == lane.session_name {
                    self.cancel_watcher(&task.id);
                    let mut task = task.clone();
                    task.binding = None;
                    task.sentinel_token = None;
                    self.store.save_task(&task)?;
                }
            }
        }

        if let Err(e) = self.mux.kill_session(&rt, &lane.session_name).await {
            debug!(lane = %lane_id, error = %e, "session already gone at kill");
        }
        lane.session_active = false;
        self.store.save_lane(&lane)?;
        Ok(())
    }

    /// Called whenever a task reaches `done`: derives task-box status,
    /// feeds the pipeline engine, and launches auto-start dependents
    /// that just became unblocked.
    pub(crate) async fn on_task_completed(self: &Arc<Self>, id: &TaskId) -> Result<(), DomainError> {
        let Some(task) = self.store.task(id)? else {
            return Ok(());
        };
        self.derive_box_status(&task)?;
        self.note_stage_task_completed(&task).await?;
        self.launch_unblocked_dependents(id).await
    }

    /// A task box's own status is derived: it completes exactly when
    /// every subtask has completed.
    fn derive_box_status(&self, task: &Task) -> Result<(), DomainError> {
        let Some(parent_id) = &task.parent_task_id else {
            return Ok(());
        };
        let Some(parent) = self.store.task(parent_id)? else {
            return Ok(());
        };
        if !parent.is_task_box() || parent.kanban_column == KanbanColumn::Done {
            return Ok(());
        }
        for sub_id in &parent.subtask_ids {
            match self.store.task(sub_id)? {
                Some(sub) if sub.status == TaskStatus::Completed => {}
                _ => return Ok(()),
            }
        }
        info!(task_id = %parent.id, "all subtasks complete, closing the task box");
        self.store.move_task(parent_id, KanbanColumn::Done)?;
        Ok(())
    }

    async fn launch_unblocked_dependents(
        self: &Arc<Self>,
        completed: &TaskId,
    ) -> Result<(), DomainError> {
        let all = self.store.tasks()?;
        let by_id: HashMap<TaskId, TaskStatus> =
            all.iter().map(|t| (t.id.clone(), t.status)).collect();

        for task in &all {
            if !task.depends_on.iter().any(|d| d == completed) {
                continue;
            }
            if !matches!(task.kanban_column, KanbanColumn::Todo | KanbanColumn::Backlog) {
                continue;
            }
            let Some(lane_id) = &task.swim_lane_id else { continue };
            let Some(lane) = self.store.lane(lane_id)? else { continue };
            if !resolve_flag(task.auto_start, lane.auto_start) {
                continue;
            }
            let unblocked = task.depends_on.iter().all(|d| {
                by_id.get(d).map(|s| *s == TaskStatus::Completed).unwrap_or(true)
            });
            if !unblocked {
                continue;
            }
            info!(task_id = %task.id, dep = %completed, "dependency complete, launching");
            if let Err(e) = self.start_task(&task.id, LaunchOptions::default()).await {
                warn!(task_id = %task.id, error = %e, "dependent launch failed");
            }
        }
        Ok(())
    }

    /// Force auto flags on each dependency and launch the launchable
    /// ones (still in todo/backlog with a lane).
    async fn cascade_dependencies(self: &Arc<Self>, deps: &[TaskId]) -> Result<(), DomainError> {
        for dep_id in deps {
            let Some(mut dep) = self.store.task(dep_id)? else {
                continue;
            };
            dep.auto_start = Some(true);
            dep.auto_pilot = Some(true);
            dep.auto_close = Some(true);
            self.store.save_task(&dep)?;

            let launchable = matches!(dep.kanban_column, KanbanColumn::Todo | KanbanColumn::Backlog)
                && dep.swim_lane_id.is_some();
            if launchable {
                let engine = Arc::clone(self);
                let dep_id = dep_id.clone();
                // Box the recursion — cascades can be arbitrarily deep.
                let fut: std::pin::Pin<
                    Box<dyn std::future::Future<Output = Result<Task, DomainError>> + Send>,
                > = Box::pin(async move {
                    engine.start_task(&dep_id, LaunchOptions::default()).await
                });
                if let Err(e) = fut.await {
                    warn!(dep = %dep.id, error = %e, "cascade launch failed");
                }
            }
        }
        Ok(())
    }

    fn incomplete_deps(&self, task: &Task) -> Result<Vec<TaskId>, DomainError> {
        let mut incomplete = Vec::new();
        for dep in &task.depends_on {
            match self.store.task(dep)? {
                Some(d) if d.status == TaskStatus::Completed => {}
                Some(_) => incomplete.push(dep.clone()),
                None => {}
            }
        }
        Ok(incomplete)
    }

    fn compose_launch_prompt(
        &self,
        task: &Task,
        lane: &SwimLane,
        opts: &LaunchOptions,
        token: Option<&str>,
    ) -> Result<String, DomainError> {
        let mut subtasks = Vec::new();
        for sub_id in &task.subtask_ids {
            if let Some(sub) = self.store.task(sub_id)? {
                subtasks.push(sub);
            }
        }
        let peers = match &task.pipeline_stage_id {
            Some(stage) => self
                .store
                .tasks_for_stage(stage.as_str())?
                .into_iter()
                .filter(|p| p.id != task.id)
                .collect(),
            None => Vec::new(),
        };
        let persona = task
            .target_role
            .map(|role| format!("You are acting as the project's dedicated {} agent.", role.as_str()));
        let memory = lane
            .memory_file_id
            .as_ref()
            .map(|id| format!("- Read the shared memory file {id} in the working directory."));
        let ctx = PromptCtx {
            task,
            lane: Some(lane),
            subtasks: &subtasks,
            peers: &peers,
            persona: persona.as_deref(),
            memory: memory.as_deref(),
            extra_instructions: opts.extra_instructions.as_deref(),
            ask_for_context: opts.ask_for_context,
            sentinel_token: token,
        };
        Ok(prompt::compose(&ctx))
    }

    /// Make sure the lane's session exists, creating it with the
    /// disposable placeholder window when absent. Updates the lane's
    /// `session_active` belief either way.
    pub(crate) async fn ensure_lane_session(
        &self,
        rt: &RuntimeDef,
        lane: &SwimLane,
    ) -> Result<(), DomainError> {
        let sessions = self.mux.list_sessions(rt).await?;
        let exists = sessions.iter().any(|s| s == &lane.session_name);
        if !exists {
            self.mux
                .new_session(
                    rt,
                    &lane.session_name,
                    NewSessionOpts {
                        cwd: Some(lane.working_dir.clone()),
                        initial_window_name: Some(LANE_INIT_WINDOW.to_string()),
                    },
                )
                .await?;
            self.mux.set_automatic_rename(rt, &lane.session_name, 0, false).await?;
        }
        if !lane.session_active || !exists {
            let mut lane = lane.clone();
            lane.session_active = true;
            self.store.save_lane(&lane)?;
        }
        Ok(())
    }

    /// Create a bare session (used by `session.create` and agent spawns
    /// outside lanes).
    pub(crate) async fn ensure_session(
        &self,
        rt: &RuntimeDef,
        name: &str,
        cwd: Option<std::path::PathBuf>,
    ) -> Result<(), DomainError> {
        let sessions = self.mux.list_sessions(rt).await?;
        if !sessions.iter().any(|s| s == name) {
            self.mux.new_session(rt, name, NewSessionOpts { cwd, initial_window_name: None }).await?;
        }
        Ok(())
    }

    /// Kill the `__lane_init__` placeholder iff a real window exists.
    async fn kill_lane_placeholder(&self, rt: &RuntimeDef, lane: &SwimLane) {
        let Ok(tree) = self.mux.get_tree_fresh(rt).await else {
            return;
        };
        let Some(session) = tree.iter().find(|s| s.session == lane.session_name) else {
            return;
        };
        let placeholder = session.windows.iter().find(|w| w.name == LANE_INIT_WINDOW);
        let real_windows = session.windows.iter().filter(|w| w.name != LANE_INIT_WINDOW).count();
        if let Some(placeholder) = placeholder {
            if real_windows > 0 {
                if let Err(e) =
                    self.mux.kill_window(rt, &lane.session_name, placeholder.index).await
                {
                    debug!(lane = %lane.id, error = %e, "placeholder kill failed");
                }
            }
        }
    }

    /// Remove a task's worktree, best-effort.
    pub(crate) async fn remove_task_worktree(&self, task: &Task) {
        let Some(path) = &task.worktree_path else {
            return;
        };
        let Some(lane_id) = &task.swim_lane_id else {
            return;
        };
        let Ok(Some(lane)) = self.store.lane(lane_id) else {
            return;
        };
        let Ok(rt) = self.runtime(&lane.runtime_id) else {
            return;
        };
        if let Err(e) = worktree::remove(self.mux.as_ref(), rt, &lane.working_dir, path).await {
            warn!(task_id = %task.id, error = %e, "worktree removal failed");
        }
    }

    pub(crate) fn require_task(&self, id: &TaskId) -> Result<Task, DomainError> {
        self.store
            .task(id)?
            .ok_or_else(|| DomainError::not_found(format!("Task {id} is unknown.")))
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
