// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipelines: DAGs of stages, and their runs.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentRole};

crate::define_id! {
    /// Unique pipeline identifier (`pip-` prefix).
    pub struct PipelineId("pip-");
}

crate::define_id! {
    /// Unique stage identifier (`stg-` prefix).
    pub struct StageId("stg-");
}

crate::define_id! {
    /// Unique pipeline-run identifier (`run-` prefix).
    pub struct RunId("run-");
}

/// How a stage schedules the tasks it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageType {
    Sequential,
    Parallel,
    Conditional,
    FanOut,
}

/// One stage in a pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    #[serde(rename = "type")]
    pub stage_type: StageType,
    pub agent_role: AgentRole,
    pub task_description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<StageId>,
    /// Required ≥ 1 for fan-out stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_out_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Stage {
    pub fn new(name: impl Into<String>, stage_type: StageType, agent_role: AgentRole) -> Self {
        Self {
            id: StageId::new(),
            name: name.into(),
            stage_type,
            agent_role,
            task_description: String::new(),
            depends_on: Vec::new(),
            fan_out_count: None,
            condition: None,
            timeout_ms: None,
        }
    }

    /// How many sibling tasks this stage fans out into (1 for others).
    pub fn task_count(&self) -> u32 {
        match self.stage_type {
            StageType::FanOut => self.fan_out_count.unwrap_or(1).max(1),
            _ => 1,
        }
    }
}

/// A pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
    pub created_at: u64,
    pub updated_at: u64,
}

impl Pipeline {
    pub fn new(name: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: PipelineId::new(),
            name: name.into(),
            stages: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    pub fn stage(&self, id: &StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| &s.id == id)
    }

    /// Whether the stage `depends_on` edges contain a cycle.
    ///
    /// Iterative colouring walk so deep chains cannot blow the stack.
    pub fn has_cycle(&self) -> bool {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }

        let index: IndexMap<&StageId, usize> =
            self.stages.iter().enumerate().map(|(i, s)| (&s.id, i)).collect();
        let mut marks = vec![Mark::Unvisited; self.stages.len()];

        for start in 0..self.stages.len() {
            if marks[start] != Mark::Unvisited {
                continue;
            }
            // (node, next dependency edge to explore)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            marks[start] = Mark::InProgress;
            while let Some(&mut (node, ref mut edge)) = stack.last_mut() {
                let deps = &self.stages[node].depends_on;
                if *edge >= deps.len() {
                    marks[node] = Mark::Done;
                    stack.pop();
                    continue;
                }
                let dep = &deps[*edge];
                *edge += 1;
                let Some(&next) = index.get(dep) else {
                    // Dangling reference; not a cycle
                    continue;
                };
                match marks[next] {
                    Mark::InProgress => return true,
                    Mark::Unvisited => {
                        marks[next] = Mark::InProgress;
                        stack.push((next, 0));
                    }
                    Mark::Done => {}
                }
            }
        }
        false
    }
}

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Draft,
    Running,
    Paused,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Recorded outcome of one stage within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// One execution of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: RunId,
    pub pipeline_id: PipelineId,
    pub status: RunStatus,
    /// Insertion-ordered so clients render stages in launch order.
    #[serde(default)]
    pub stage_results: IndexMap<StageId, StageResult>,
    pub started_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
}

impl PipelineRun {
    pub fn new(pipeline_id: PipelineId, started_at: u64) -> Self {
        Self {
            id: RunId::new(),
            pipeline_id,
            status: RunStatus::Running,
            stage_results: IndexMap::new(),
            started_at,
            completed_at: None,
        }
    }

    /// Whether every stage of `pipeline` has a terminal result recorded.
    pub fn is_settled(&self, pipeline: &Pipeline) -> bool {
        pipeline.stages.iter().all(|s| {
            self.stage_results
                .get(&s.id)
                .map(|r| matches!(r.status, StageStatus::Completed | StageStatus::Failed))
                .unwrap_or(false)
        })
    }

    /// Whether any recorded stage failed.
    pub fn any_failed(&self) -> bool {
        self.stage_results.values().any(|r| r.status == StageStatus::Failed)
    }
}

/// Stages of `pipeline` that are ready to launch for `run`: not yet
/// recorded in `stage_results`, with every dependency `completed`.
pub fn ready_stages<'p>(pipeline: &'p Pipeline, run: &PipelineRun) -> Vec<&'p Stage> {
    let completed: HashSet<&StageId> = run
        .stage_results
        .iter()
        .filter(|(_, r)| r.status == StageStatus::Completed)
        .map(|(id, _)| id)
        .collect();

    pipeline
        .stages
        .iter()
        .filter(|s| !run.stage_results.contains_key(&s.id))
        .filter(|s| s.depends_on.iter().all(|d| completed.contains(d)))
        .collect()
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
