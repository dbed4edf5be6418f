// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry, state machine and role-aware dispatch.
//!
//! The poller re-derives every agent's state from pane scraping each
//! tick, then dispatches the highest-priority pending task to an idle
//! agent. Captures happen outside the registry lock.

use std::sync::Arc;

use tracing::{debug, info, warn};

use mh_adapters::registry::{effective_status, read_pane_metadata, PaneStatus};
use mh_core::{
    AgentId, AgentMessage, AgentRecord, AgentRole, AgentState, Clock, DomainError, KanbanColumn,
    LaneId, MessageId, RuntimeId, Task, TaskStatus, TeamId,
};

use crate::prompt::{self, PromptCtx};
use crate::Engine;

/// Parameters for `agent.spawn`.
#[derive(Debug, Clone, Default)]
pub struct SpawnAgentParams {
    pub role: Option<AgentRole>,
    pub provider: Option<String>,
    pub model: Option<String>,
    /// Spawn into this lane's session (and inherit its provider).
    pub swim_lane_id: Option<LaneId>,
    /// Explicit placement, used when no lane is given.
    pub runtime_id: Option<RuntimeId>,
    pub session_name: Option<String>,
    pub team_id: Option<TeamId>,
    pub expertise: Vec<String>,
}

impl<C: Clock> Engine<C> {
    /// Spawn an interactive AI CLI into a new window and register the
    /// agent as `spawning`.
    pub async fn spawn_agent(&self, params: SpawnAgentParams) -> Result<AgentRecord, DomainError> {
        let lane = match &params.swim_lane_id {
            Some(id) => Some(self.store.lane(id)?.ok_or_else(|| {
                DomainError::not_found(format!("Swim lane {id} is unknown."))
            })?),
            None => None,
        };

        let runtime_id = params
            .runtime_id
            .clone()
            .or_else(|| lane.as_ref().map(|l| l.runtime_id.clone()))
            .unwrap_or_else(RuntimeId::local);
        let rt = self.runtime(&runtime_id)?.clone();

        let session = match (&lane, &params.session_name) {
            (Some(lane), _) => {
                self.ensure_lane_session(&rt, lane).await?;
                lane.session_name.clone()
            }
            (None, Some(session)) => {
                self.ensure_session(&rt, session, None).await?;
                session.clone()
            }
            (None, None) => {
                return Err(DomainError::invalid_param(
                    "Agent spawn needs a swim lane or a session name.",
                ));
            }
        };

        let profile = self
            .registry
            .resolve_provider(
                params.provider.as_deref(),
                lane.as_ref().and_then(|l| l.ai_provider.as_deref()),
            )
            .clone();
        let model = self
            .registry
            .resolve_model(params.model.as_deref(), lane.as_ref().and_then(|l| l.model.as_deref()));

        let role = params.role.unwrap_or(AgentRole::Coder);
        let mut agent =
            AgentRecord::new(role, profile.provider.clone(), runtime_id, session.clone(), 0, 0, self.now());
        agent.model = model.clone();
        agent.team_id = params.team_id.clone();
        agent.swim_lane_id = params.swim_lane_id.clone();
        agent.expertise = params.expertise.clone();

        let window_name = format!("agent-{}-{}", role.as_str(), agent.id.short(12));
        let window = self
            .mux
            .new_window(&rt, &session, Some(&window_name), lane.as_ref().map(|l| l.working_dir.as_path()))
            .await?;
        agent.window_index = window;

        // One non-terminal agent per pane
        let occupied = {
            let agents = self.agents.lock();
            agents.values().any(|a| !a.state.is_terminal() && a.pane_key() == agent.pane_key())
        };
        if occupied {
            let _ = self.mux.kill_window(&rt, &session, window).await;
            return Err(DomainError::conflict("Another agent already occupies that pane."));
        }

        let launch = self.registry.interactive_launch(&profile, model.as_deref());
        self.mux.send_keys(&rt, &session, window, 0, &launch, true).await?;

        self.save_agent(agent.clone())?;
        info!(agent_id = %agent.id, provider = %profile.provider, "agent spawned");
        Ok(agent)
    }

    /// Kill an agent's window and mark it terminated. Its in-flight
    /// task, if any, returns to the queue.
    pub async fn kill_agent(&self, id: &AgentId) -> Result<(), DomainError> {
        let mut agent = self.require_agent(id)?;
        let rt = self.runtime(&agent.runtime_id)?.clone();
        if let Err(e) = self.mux.kill_window(&rt, &agent.session_name, agent.window_index).await {
            debug!(agent_id = %id, error = %e, "window already gone at kill");
        }

        if let Some(task_id) = agent.current_task_id.take() {
            if let Some(mut task) = self.store.task(&task_id)? {
                task.status = TaskStatus::Pending;
                task.assigned_agent_id = None;
                self.store.save_task(&task)?;
            }
        }
        agent.state = AgentState::Terminated;
        agent.last_activity_at = self.now();
        self.save_agent(agent)?;
        Ok(())
    }

    /// Send freeform text to an agent's pane.
    pub async fn send_prompt(&self, id: &AgentId, text: &str) -> Result<(), DomainError> {
        let agent = self.require_agent(id)?;
        let rt = self.runtime(&agent.runtime_id)?.clone();
        self.mux
            .send_keys(&rt, &agent.session_name, agent.window_index, agent.pane_index, text, true)
            .await?;
        Ok(())
    }

    /// Capture the tail of an agent's pane.
    pub async fn agent_output(&self, id: &AgentId, lines: u32) -> Result<String, DomainError> {
        let agent = self.require_agent(id)?;
        let rt = self.runtime(&agent.runtime_id)?.clone();
        Ok(self
            .mux
            .capture(&rt, &agent.session_name, agent.window_index, agent.pane_index, lines)
            .await?)
    }

    /// Manual state override (`agent.updateState`).
    pub fn update_agent_state(&self, id: &AgentId, state: AgentState) -> Result<(), DomainError> {
        let mut agent = self.require_agent(id)?;
        agent.state = state;
        agent.last_activity_at = self.now();
        self.save_agent(agent)?;
        Ok(())
    }

    pub fn list_agents(&self) -> Vec<AgentRecord> {
        let mut list: Vec<AgentRecord> = self.agents.lock().values().cloned().collect();
        list.sort_by_key(|a| a.created_at);
        list
    }

    pub fn idle_agents(&self) -> Vec<AgentRecord> {
        self.list_agents().into_iter().filter(|a| a.state == AgentState::Idle).collect()
    }

    pub fn agents_by_role(&self, role: AgentRole) -> Vec<AgentRecord> {
        self.list_agents().into_iter().filter(|a| a.role == role).collect()
    }

    pub fn agents_by_team(&self, team: &TeamId) -> Vec<AgentRecord> {
        self.list_agents().into_iter().filter(|a| a.team_id.as_ref() == Some(team)).collect()
    }

    pub fn get_agent(&self, id: &AgentId) -> Option<AgentRecord> {
        self.agents.lock().get(id).cloned()
    }

    /// Queue a side-channel message and broadcast it.
    pub fn post_agent_message(
        &self,
        from: AgentId,
        to: AgentId,
        content: String,
    ) -> Result<AgentMessage, DomainError> {
        let message = AgentMessage {
            id: MessageId::new(),
            from,
            to,
            content,
            ts: self.now(),
            read: false,
        };
        self.store.post_message(&message)?;
        Ok(message)
    }

    /// One orchestrator tick: scrape every pane, advance the state
    /// machine, then dispatch the next pending task.
    pub async fn orchestrator_tick(self: &Arc<Self>) {
        let agents: Vec<AgentRecord> = self.list_agents();
        for agent in agents {
            if agent.state.is_terminal() {
                continue;
            }
            if let Err(e) = self.scrape_agent(&agent).await {
                warn!(agent_id = %agent.id, error = %e, "agent scrape failed");
            }
        }
        if let Err(e) = self.dispatch_next().await {
            warn!(error = %e, "dispatch failed");
        }
    }

    /// Scrape one agent's pane and apply the state machine.
    async fn scrape_agent(self: &Arc<Self>, agent: &AgentRecord) -> Result<(), DomainError> {
        let rt = self.runtime(&agent.runtime_id)?.clone();
        let captured = self
            .mux
            .capture(&rt, &agent.session_name, agent.window_index, agent.pane_index, 40)
            .await;

        let mut next = agent.clone();
        match captured {
            Err(e) => {
                // Capture failures only demote live agents
                if matches!(agent.state, AgentState::Idle | AgentState::Working) {
                    next.state = AgentState::Error;
                    next.error_message = Some(e.to_string());
                } else {
                    return Ok(());
                }
            }
            Ok(text) => {
                let status = self.pane_status(&rt, agent, &text).await;
                match (agent.state, status) {
                    (AgentState::Spawning, _) if !text.trim().is_empty() => {
                        next.state = AgentState::Idle;
                    }
                    (AgentState::Idle, PaneStatus::Working) => {
                        next.state = AgentState::Working;
                    }
                    (AgentState::Working, PaneStatus::Waiting | PaneStatus::Idle) => {
                        next.state = AgentState::Idle;
                        if let Some(task_id) = next.current_task_id.take() {
                            self.complete_agent_task(&task_id).await?;
                        }
                    }
                    _ => return Ok(()),
                }
            }
        }

        if next.state != agent.state {
            next.last_activity_at = self.now();
            debug!(agent_id = %next.id, from = ?agent.state, to = ?next.state, "agent transition");
            self.save_agent(next)?;
        }
        Ok(())
    }

    /// Combined pane status: `@cc_state` annotation overrides the text
    /// heuristic when the provider publishes one.
    async fn pane_status(
        &self,
        rt: &mh_core::RuntimeDef,
        agent: &AgentRecord,
        captured: &str,
    ) -> PaneStatus {
        let heuristic = mh_adapters::registry::detect_status(captured);
        let Ok(tree) = self.mux.get_tree(rt).await else {
            return heuristic;
        };
        let pane_id = tree
            .iter()
            .find(|s| s.session == agent.session_name)
            .and_then(|s| s.window(agent.window_index))
            .and_then(|w| w.panes.iter().find(|p| p.index == agent.pane_index))
            .map(|p| p.pane_id.clone());
        let Some(pane_id) = pane_id else {
            return heuristic;
        };
        match self.mux.read_pane_options(rt, std::slice::from_ref(&pane_id)).await {
            Ok(options) => match options.get(&pane_id) {
                Some(opts) => effective_status(&read_pane_metadata(opts), heuristic),
                None => heuristic,
            },
            Err(_) => heuristic,
        }
    }

    /// A working agent went quiet: its task is complete.
    async fn complete_agent_task(self: &Arc<Self>, task_id: &mh_core::TaskId) -> Result<(), DomainError> {
        let Some(task) = self.store.task(task_id)? else {
            return Ok(());
        };
        if task.kanban_column != KanbanColumn::Done {
            info!(task_id = %task_id, "agent finished task");
            self.store.move_task(task_id, KanbanColumn::Done)?;
            self.on_task_completed(task_id).await?;
        }
        Ok(())
    }

    /// Dispatch the highest-priority pending task to an idle agent.
    pub async fn dispatch_next(&self) -> Result<Option<(mh_core::TaskId, AgentId)>, DomainError> {
        let pending = self.store.tasks_with_status(TaskStatus::Pending)?;
        let tasks_by_id: std::collections::HashMap<_, _> =
            self.store.tasks()?.into_iter().map(|t| (t.id.clone(), t)).collect();

        let Some(task) = pending.into_iter().find(|t| {
            !t.is_task_box()
                && t.depends_on.iter().all(|dep| {
                    tasks_by_id
                        .get(dep)
                        .map(|d| d.status == TaskStatus::Completed)
                        .unwrap_or(true)
                })
        }) else {
            return Ok(None);
        };

        let Some(agent) = self.pick_candidate(&task) else {
            return Ok(None);
        };

        let lane = match &task.swim_lane_id {
            Some(id) => self.store.lane(id)?,
            None => None,
        };
        let text = prompt::compose(&PromptCtx::single(&task, lane.as_ref()));

        let rt = self.runtime(&agent.runtime_id)?.clone();
        let sent = self
            .mux
            .send_keys(&rt, &agent.session_name, agent.window_index, agent.pane_index, &text, true)
            .await;

        let mut task = task;
        let mut agent = agent;
        match sent {
            Ok(()) => {
                task.status = TaskStatus::Assigned;
                task.assigned_agent_id = Some(agent.id.clone());
                task.started_at = Some(self.now());
                self.store.save_task(&task)?;

                agent.state = AgentState::Working;
                agent.current_task_id = Some(task.id.clone());
                agent.last_activity_at = self.now();
                let pair = (task.id.clone(), agent.id.clone());
                self.save_agent(agent)?;
                info!(task_id = %pair.0, agent_id = %pair.1, "task dispatched");
                Ok(Some(pair))
            }
            Err(e) => {
                task.status = TaskStatus::Failed;
                task.error_message = Some(format!("Prompt delivery failed: {e}"));
                self.store.save_task(&task)?;

                agent.state = AgentState::Error;
                agent.error_message = Some(e.to_string());
                self.save_agent(agent)?;
                Err(e.into())
            }
        }
    }

    /// Idle candidates, role-filtered, expertise matches first
    /// (stable, so earlier-created agents win ties).
    fn pick_candidate(&self, task: &Task) -> Option<AgentRecord> {
        let mut candidates: Vec<AgentRecord> = self
            .list_agents()
            .into_iter()
            .filter(|a| a.state == AgentState::Idle)
            .filter(|a| match task.target_role {
                Some(role) => a.role == role,
                None => true,
            })
            .collect();
        let hint = task.description.to_lowercase();
        candidates.sort_by_key(|a| {
            let matches = a.expertise.iter().any(|e| hint.contains(&e.to_lowercase()));
            !matches
        });
        candidates.into_iter().next()
    }

    pub(crate) fn require_agent(&self, id: &AgentId) -> Result<AgentRecord, DomainError> {
        self.get_agent(id)
            .ok_or_else(|| DomainError::not_found(format!("Agent {id} is unknown.")))
    }

    /// Persist an agent and refresh the in-memory registry.
    pub(crate) fn save_agent(&self, agent: AgentRecord) -> Result<(), DomainError> {
        self.store.save_agent(&agent)?;
        self.agents.lock().insert(agent.id.clone(), agent);
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
