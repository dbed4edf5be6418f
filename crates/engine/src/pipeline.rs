// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline engine: stage DAG scheduling over the task queue.
//!
//! Ready stages are translated into pending tasks (one per stage, or
//! `fan_out_count` siblings for fan-out stages); the orchestrator's
//! dispatcher picks them up like any other task. Stage completion is
//! fed back by the completion paths via [`Engine::note_stage_task_completed`].

use std::sync::Arc;

use tracing::{debug, info};

use mh_core::{
    ready_stages, AgentRole, Clock, DomainError, Pipeline, PipelineId, PipelineRun, RunId,
    RunStatus, Stage, StageId, StageResult, StageStatus, StageType, Task, TaskStatus,
};

use crate::Engine;

impl<C: Clock> Engine<C> {
    /// Create a pipeline definition, rejecting invalid stage graphs.
    pub fn create_pipeline(&self, name: &str, stages: Vec<Stage>) -> Result<Pipeline, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_param("Pipeline name must not be empty."));
        }
        let mut pipeline = Pipeline::new(name, self.now());
        pipeline.stages = stages;
        validate_stages(&pipeline)?;
        self.store.save_pipeline(&pipeline)?;
        Ok(pipeline)
    }

    pub fn delete_pipeline(&self, id: &PipelineId) -> Result<(), DomainError> {
        if !self.store.delete_pipeline(id)? {
            return Err(DomainError::not_found(format!("Pipeline {id} is unknown.")));
        }
        Ok(())
    }

    /// Append a stage; rejects cycles introduced by its `depends_on`.
    pub fn add_stage(&self, id: &PipelineId, stage: Stage) -> Result<Pipeline, DomainError> {
        let mut pipeline = self.require_pipeline(id)?;
        pipeline.stages.push(stage);
        validate_stages(&pipeline)?;
        pipeline.updated_at = self.now();
        self.store.save_pipeline(&pipeline)?;
        Ok(pipeline)
    }

    pub fn remove_stage(&self, id: &PipelineId, stage_id: &StageId) -> Result<Pipeline, DomainError> {
        let mut pipeline = self.require_pipeline(id)?;
        let before = pipeline.stages.len();
        pipeline.stages.retain(|s| &s.id != stage_id);
        if pipeline.stages.len() == before {
            return Err(DomainError::not_found(format!("Stage {stage_id} is unknown.")));
        }
        // Drop dangling dependency references to the removed stage
        for stage in &mut pipeline.stages {
            stage.depends_on.retain(|d| d != stage_id);
        }
        pipeline.updated_at = self.now();
        self.store.save_pipeline(&pipeline)?;
        Ok(pipeline)
    }

    /// Start a run and immediately launch its root stages.
    pub async fn start_run(self: &Arc<Self>, id: &PipelineId) -> Result<PipelineRun, DomainError> {
        let pipeline = self.require_pipeline(id)?;
        let run = PipelineRun::new(pipeline.id.clone(), self.now());
        self.store.save_run(&run)?;
        info!(run_id = %run.id, pipeline = %pipeline.name, "pipeline run started");
        self.pump_run(&run.id).await?;
        self.require_run(&run.id)
    }

    /// Ready stages for a run (`pipeline.getReadyStages`).
    pub fn run_ready_stages(&self, run_id: &RunId) -> Result<Vec<Stage>, DomainError> {
        let run = self.require_run(run_id)?;
        let pipeline = self.require_pipeline(&run.pipeline_id)?;
        Ok(ready_stages(&pipeline, &run).into_iter().cloned().collect())
    }

    /// Translate every ready stage into queued tasks. Paused and
    /// terminal runs are left untouched.
    pub async fn pump_run(self: &Arc<Self>, run_id: &RunId) -> Result<(), DomainError> {
        let mut run = self.require_run(run_id)?;
        if run.status != RunStatus::Running {
            return Ok(());
        }
        let pipeline = self.require_pipeline(&run.pipeline_id)?;

        let ready: Vec<Stage> = ready_stages(&pipeline, &run).into_iter().cloned().collect();
        if ready.is_empty() {
            return self.settle_run(&pipeline, run);
        }

        let previous_outputs = collect_outputs(&run);
        for stage in ready {
            let tasks = generate_tasks_for_stage(&pipeline, &stage, &previous_outputs, self.now());
            debug!(run_id = %run_id, stage = %stage.name, count = tasks.len(), "stage tasks queued");
            for mut task in tasks {
                task.pipeline_run_id = Some(run.id.clone());
                self.store.save_task(&task)?;
            }
            run.stage_results.insert(
                stage.id.clone(),
                StageResult {
                    status: StageStatus::Running,
                    agent_id: None,
                    output: None,
                    started_at: Some(self.now()),
                    completed_at: None,
                    error_message: None,
                },
            );
        }
        self.store.save_run(&run)?;
        Ok(())
    }

    /// Record a stage result (`pipeline.markStageCompleted`) and launch
    /// whatever became ready.
    pub async fn mark_stage_completed(
        self: &Arc<Self>,
        run_id: &RunId,
        stage_id: &StageId,
        output: Option<String>,
    ) -> Result<(), DomainError> {
        let mut run = self.require_run(run_id)?;
        let now = self.now();
        let entry = run.stage_results.entry(stage_id.clone()).or_insert(StageResult {
            status: StageStatus::Running,
            agent_id: None,
            output: None,
            started_at: Some(now),
            completed_at: None,
            error_message: None,
        });
        entry.status = StageStatus::Completed;
        entry.output = output;
        entry.completed_at = Some(now);
        self.store.save_run(&run)?;
        self.pump_run(run_id).await
    }

    /// Record a stage failure (`pipeline.markStageFailed`).
    pub async fn mark_stage_failed(
        self: &Arc<Self>,
        run_id: &RunId,
        stage_id: &StageId,
        error: String,
    ) -> Result<(), DomainError> {
        let mut run = self.require_run(run_id)?;
        let now = self.now();
        let entry = run.stage_results.entry(stage_id.clone()).or_insert(StageResult {
            status: StageStatus::Running,
            agent_id: None,
            output: None,
            started_at: Some(now),
            completed_at: None,
            error_message: None,
        });
        entry.status = StageStatus::Failed;
        entry.error_message = Some(error);
        entry.completed_at = Some(now);

        let pipeline = self.require_pipeline(&run.pipeline_id)?;
        self.store.save_run(&run)?;
        self.settle_run(&pipeline, self.require_run(run_id)?)
    }

    /// Gate readiness without touching in-flight tasks.
    pub fn pause_run(&self, run_id: &RunId) -> Result<PipelineRun, DomainError> {
        let mut run = self.require_run(run_id)?;
        if run.status != RunStatus::Running {
            return Err(DomainError::precondition("Only running runs can be paused."));
        }
        run.status = RunStatus::Paused;
        self.store.save_run(&run)?;
        Ok(run)
    }

    pub async fn resume_run(self: &Arc<Self>, run_id: &RunId) -> Result<PipelineRun, DomainError> {
        let mut run = self.require_run(run_id)?;
        if run.status != RunStatus::Paused {
            return Err(DomainError::precondition("Only paused runs can be resumed."));
        }
        run.status = RunStatus::Running;
        self.store.save_run(&run)?;
        self.pump_run(run_id).await?;
        self.require_run(run_id)
    }

    /// A stage task completed: when every sibling of its stage is done,
    /// record the stage as completed with the joined outputs.
    pub(crate) async fn note_stage_task_completed(
        self: &Arc<Self>,
        task: &Task,
    ) -> Result<(), DomainError> {
        let (Some(run_id), Some(stage_id)) = (&task.pipeline_run_id, &task.pipeline_stage_id)
        else {
            return Ok(());
        };
        let siblings = self.store.tasks_for_stage(stage_id.as_str())?;
        let all_done = siblings.iter().all(|t| t.status == TaskStatus::Completed);
        if !all_done {
            return Ok(());
        }
        let output = {
            let outputs: Vec<&str> =
                siblings.iter().filter_map(|t| t.output.as_deref()).collect();
            if outputs.is_empty() {
                None
            } else {
                Some(outputs.join("\n---\n"))
            }
        };
        self.mark_stage_completed(run_id, stage_id, output).await
    }

    /// Move a fully recorded run to its terminal status. A failed stage
    /// with nothing left ready or running also settles the run — its
    /// dependents can never become ready.
    fn settle_run(&self, pipeline: &Pipeline, mut run: PipelineRun) -> Result<(), DomainError> {
        if run.status != RunStatus::Running {
            return Ok(());
        }
        let deadlocked = run.any_failed()
            && ready_stages(pipeline, &run).is_empty()
            && !run.stage_results.values().any(|r| r.status == StageStatus::Running);
        if !run.is_settled(pipeline) && !deadlocked {
            return Ok(());
        }
        run.status = if run.any_failed() { RunStatus::Failed } else { RunStatus::Completed };
        run.completed_at = Some(self.now());
        info!(run_id = %run.id, status = ?run.status, "pipeline run settled");
        self.store.save_run(&run)?;
        Ok(())
    }

    pub fn require_pipeline(&self, id: &PipelineId) -> Result<Pipeline, DomainError> {
        self.store
            .pipeline(id)?
            .ok_or_else(|| DomainError::not_found(format!("Pipeline {id} is unknown.")))
    }

    pub fn require_run(&self, id: &RunId) -> Result<PipelineRun, DomainError> {
        self.store
            .run(id)?
            .ok_or_else(|| DomainError::not_found(format!("Pipeline run {id} is unknown.")))
    }
}

fn validate_stages(pipeline: &Pipeline) -> Result<(), DomainError> {
    for stage in &pipeline.stages {
        if stage.stage_type == StageType::FanOut && stage.fan_out_count.unwrap_or(0) < 1 {
            return Err(DomainError::invalid_param(format!(
                "Fan-out stage {:?} needs fan_out_count >= 1.",
                stage.name
            )));
        }
    }
    if pipeline.has_cycle() {
        return Err(DomainError::conflict("Stage dependencies would introduce a cycle."));
    }
    Ok(())
}

/// Outputs of completed stages, in recording order.
fn collect_outputs(run: &PipelineRun) -> Vec<String> {
    run.stage_results
        .values()
        .filter(|r| r.status == StageStatus::Completed)
        .filter_map(|r| r.output.clone())
        .collect()
}

/// Translate a ready stage into its tasks: one, or `fan_out_count`
/// numbered siblings for fan-out stages. Prior stage outputs ride in
/// `details`.
pub fn generate_tasks_for_stage(
    pipeline: &Pipeline,
    stage: &Stage,
    previous_outputs: &[String],
    now: u64,
) -> Vec<Task> {
    let details = if previous_outputs.is_empty() {
        None
    } else {
        Some(format!("Previous stage outputs:\n{}", previous_outputs.join("\n---\n")))
    };

    let count = stage.task_count();
    (1..=count)
        .map(|i| {
            let description = if count > 1 {
                format!("{} [{} {}/{}]", stage.task_description, stage.name, i, count)
            } else if stage.task_description.is_empty() {
                format!("{}: {}", pipeline.name, stage.name)
            } else {
                stage.task_description.clone()
            };
            let mut task = Task::new(description, now);
            task.details = details.clone();
            task.target_role = Some(stage.agent_role);
            task.pipeline_stage_id = Some(stage.id.clone());
            task
        })
        .collect()
}

/// Pipelines shipped with the daemon (`pipeline.getBuiltIn`).
pub fn built_in_pipelines(now: u64) -> Vec<Pipeline> {
    let mut review_flow = Pipeline::new("implement-and-review", now);
    let mut implement = Stage::new("implement", StageType::Sequential, AgentRole::Coder);
    implement.task_description = "Implement the requested change.".into();
    let mut review = Stage::new("review", StageType::Sequential, AgentRole::Reviewer);
    review.task_description = "Review the implementation from the previous stage.".into();
    review.depends_on.push(implement.id.clone());
    let mut test = Stage::new("test", StageType::Sequential, AgentRole::Tester);
    test.task_description = "Write and run tests for the change.".into();
    test.depends_on.push(implement.id.clone());
    review_flow.stages = vec![implement, review, test];

    let mut research_fan = Pipeline::new("research-fan-out", now);
    let mut research = Stage::new("research", StageType::Sequential, AgentRole::Researcher);
    research.task_description = "Research the problem space and write up findings.".into();
    let mut explore = Stage::new("explore", StageType::FanOut, AgentRole::Coder);
    explore.task_description = "Prototype one candidate approach.".into();
    explore.fan_out_count = Some(3);
    explore.depends_on.push(research.id.clone());
    research_fan.stages = vec![research, explore];

    vec![review_flow, research_fan]
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
