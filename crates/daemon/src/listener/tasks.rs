// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `task.*` method family.

use serde_json::{json, Value};

use mh_core::{Clock, DomainError, SystemClock, Task, TaskId, TaskStatus};

use crate::protocol::{StageIdParams, TaskIdParams, TaskStatusParams, TaskSubmitParams};

use super::{to_value, ListenCtx};

pub(super) fn require_task(ctx: &ListenCtx, id: &str) -> Result<Task, DomainError> {
    ctx.engine
        .store
        .task(&TaskId::from_string(id))?
        .ok_or_else(|| DomainError::not_found(format!("Task {id} is unknown.")))
}

pub(super) async fn submit(
    ctx: &ListenCtx,
    params: TaskSubmitParams,
) -> Result<Value, DomainError> {
    let mut task = Task::new(params.description, SystemClock.epoch_ms());
    task.swim_lane_id = params.swim_lane_id.map(Into::into);
    task.details = params.details;
    task.target_role = params.target_role;
    if let Some(priority) = params.priority {
        task.priority = priority;
    }
    if let Some(column) = params.kanban_column {
        task.kanban_column = column;
    }
    task.auto_start = params.auto_start;
    task.auto_pilot = params.auto_pilot;
    task.auto_close = params.auto_close;
    task.use_worktree = params.use_worktree;
    task.ai_provider = params.ai_provider;
    task.ai_model = params.ai_model;
    task.depends_on = params.depends_on.into_iter().map(Into::into).collect();
    task.parent_task_id = params.parent_task_id.map(Into::into);

    let task = ctx.engine.submit_task(task).await?;
    to_value(&task)
}

/// Cancel a task: tear down its window, then mark it cancelled.
pub(super) async fn cancel(ctx: &ListenCtx, params: TaskIdParams) -> Result<Value, DomainError> {
    let task = require_task(ctx, &params.task_id)?;
    if task.status.is_terminal() {
        return Err(DomainError::conflict("Task is already finished."));
    }
    if task.binding.is_some() {
        ctx.engine.stop_task(&task.id).await?;
    }
    let mut task = require_task(ctx, &params.task_id)?;
    task.status = TaskStatus::Cancelled;
    ctx.engine.store.save_task(&task)?;
    to_value(&task)
}

pub(super) async fn delete(ctx: &ListenCtx, params: TaskIdParams) -> Result<Value, DomainError> {
    let task = require_task(ctx, &params.task_id)?;
    if task.binding.is_some() {
        ctx.engine.stop_task(&task.id).await?;
    }
    ctx.engine.store.delete_task(&task.id)?;
    Ok(json!({ "deleted": true }))
}

pub(super) fn list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.tasks()?)
}

pub(super) fn query(ctx: &ListenCtx, params: TaskIdParams) -> Result<Value, DomainError> {
    to_value(&require_task(ctx, &params.task_id)?)
}

pub(super) fn update_status(
    ctx: &ListenCtx,
    params: TaskStatusParams,
) -> Result<Value, DomainError> {
    let mut task = require_task(ctx, &params.task_id)?;
    task.status = params.status;
    ctx.engine.store.save_task(&task)?;
    to_value(&task)
}

pub(super) async fn dispatch_next(ctx: &ListenCtx) -> Result<Value, DomainError> {
    let assigned = ctx.engine.dispatch_next().await?;
    match assigned {
        Some((task_id, agent_id)) => Ok(json!({ "taskId": task_id, "agentId": agent_id })),
        None => Ok(json!({ "taskId": null, "agentId": null })),
    }
}

/// Results of a fan-out stage's sibling tasks.
pub(super) fn get_fan_out_results(
    ctx: &ListenCtx,
    params: StageIdParams,
) -> Result<Value, DomainError> {
    let tasks = ctx.engine.store.tasks_for_stage(&params.stage_id)?;
    let results: Vec<Value> = tasks
        .iter()
        .map(|t| {
            json!({
                "taskId": t.id,
                "status": t.status,
                "output": t.output,
                "errorMessage": t.error_message,
            })
        })
        .collect();
    Ok(json!({ "stageId": params.stage_id, "results": results }))
}
