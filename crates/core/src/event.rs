// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain change events.
//!
//! Every successful store write fires exactly one event; the daemon's
//! event bus fans them out to WebSocket subscribers. Events serialize
//! with a `{"type": "task.updated", ...fields}` shape — the type tag is
//! also the subscription topic.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentMessage, AgentRecord};
use crate::lane::SwimLane;
use crate::pipeline::PipelineRun;
use crate::runtime::RuntimeId;
use crate::task::{KanbanColumn, Task, TaskId};

/// A change broadcast to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    #[serde(rename = "task.updated")]
    TaskUpdated { task: Task },

    /// A task changed kanban column.
    #[serde(rename = "task.moved")]
    TaskMoved { task: Task, from: KanbanColumn, to: KanbanColumn },

    /// A task reached `done` (fired exactly once per completion).
    #[serde(rename = "task.completed")]
    TaskCompleted { task: Task },

    /// Auto-close summarised and tore down a task's window.
    #[serde(rename = "task.autoclose.completed")]
    TaskAutoCloseCompleted { task_id: TaskId },

    #[serde(rename = "task.verification.started")]
    TaskVerificationStarted { task_id: TaskId },

    #[serde(rename = "agent.updated")]
    AgentUpdated { agent: AgentRecord },

    /// Inter-agent side-channel message was posted.
    #[serde(rename = "agent.message")]
    AgentMessagePosted { message: AgentMessage },

    #[serde(rename = "lane.updated")]
    LaneUpdated { lane: SwimLane },

    #[serde(rename = "pipeline.run.updated")]
    PipelineRunUpdated { run: PipelineRun },

    /// Runtime reachability changed (e.g. a connection test).
    #[serde(rename = "runtime.updated")]
    RuntimeUpdated { runtime_id: RuntimeId, ok: bool },
}

impl DomainEvent {
    /// The subscription topic, identical to the serialized type tag.
    pub fn topic(&self) -> &'static str {
        match self {
            DomainEvent::TaskUpdated { .. } => "task.updated",
            DomainEvent::TaskMoved { .. } => "task.moved",
            DomainEvent::TaskCompleted { .. } => "task.completed",
            DomainEvent::TaskAutoCloseCompleted { .. } => "task.autoclose.completed",
            DomainEvent::TaskVerificationStarted { .. } => "task.verification.started",
            DomainEvent::AgentUpdated { .. } => "agent.updated",
            DomainEvent::AgentMessagePosted { .. } => "agent.message",
            DomainEvent::LaneUpdated { .. } => "lane.updated",
            DomainEvent::PipelineRunUpdated { .. } => "pipeline.run.updated",
            DomainEvent::RuntimeUpdated { .. } => "runtime.updated",
        }
    }
}

/// Where components publish domain events.
///
/// The store and the engine both hold an `Arc<dyn EventSink>`; the
/// daemon wires it to the event bus. Publishing never blocks and never
/// fails — slow subscribers are the bus's problem.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Sink that discards everything (tests, tools).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: DomainEvent) {}
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
