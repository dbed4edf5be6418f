// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `kanban.*` method family: lanes and board-side
//! task operations.

use serde_json::{json, Value};

use mh_core::{Clock, DomainError, LaneId, RuntimeId, SwimLane, SystemClock, Task, TaskId};
use mh_engine::LaunchOptions;

use crate::protocol::{
    AutoModeParams, LaneCreateParams, LaneEditParams, LaneIdParams, SubtaskAddParams,
    TaskEditParams, TaskIdParams, TaskListParams, TaskMergeParams, TaskMoveParams,
    TaskStartParams,
};

use super::tasks::require_task;
use super::{to_value, ListenCtx};

fn require_lane(ctx: &ListenCtx, id: &str) -> Result<SwimLane, DomainError> {
    ctx.engine
        .store
        .lane(&LaneId::from_string(id))?
        .ok_or_else(|| DomainError::not_found(format!("Swim lane {id} is unknown.")))
}

pub(super) fn create_lane(ctx: &ListenCtx, params: LaneCreateParams) -> Result<Value, DomainError> {
    if params.name.trim().is_empty() {
        return Err(DomainError::invalid_param("Lane name must not be empty."));
    }
    let runtime_id = params
        .runtime_id
        .map(RuntimeId::new)
        .unwrap_or_else(RuntimeId::local);
    // Reject unknown runtimes up front
    ctx.engine.runtime(&runtime_id)?;

    let mut lane = SwimLane::new(params.name, runtime_id, params.working_dir, SystemClock.epoch_ms());
    lane.context_instructions = params.context_instructions;
    lane.ai_provider = params.ai_provider;
    lane.model = params.model;
    lane.auto_start = params.auto_start;
    lane.auto_pilot = params.auto_pilot;
    lane.auto_close = params.auto_close;
    lane.use_worktree = params.use_worktree;
    ctx.engine.store.save_lane(&lane)?;
    to_value(&lane)
}

pub(super) fn list_lanes(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.lanes()?)
}

pub(super) fn edit_lane(ctx: &ListenCtx, params: LaneEditParams) -> Result<Value, DomainError> {
    let mut lane = require_lane(ctx, &params.lane_id)?;
    if let Some(name) = params.name {
        lane.name = name;
    }
    if let Some(working_dir) = params.working_dir {
        lane.working_dir = working_dir.into();
    }
    if params.context_instructions.is_some() {
        lane.context_instructions = params.context_instructions;
    }
    if params.ai_provider.is_some() {
        lane.ai_provider = params.ai_provider;
    }
    if params.model.is_some() {
        lane.model = params.model;
    }
    if params.auto_start.is_some() {
        lane.auto_start = params.auto_start;
    }
    if params.auto_pilot.is_some() {
        lane.auto_pilot = params.auto_pilot;
    }
    if params.auto_close.is_some() {
        lane.auto_close = params.auto_close;
    }
    if params.use_worktree.is_some() {
        lane.use_worktree = params.use_worktree;
    }
    ctx.engine.store.save_lane(&lane)?;
    to_value(&lane)
}

/// Delete a lane, killing its session first.
pub(super) async fn delete_lane(
    ctx: &ListenCtx,
    params: LaneIdParams,
) -> Result<Value, DomainError> {
    let lane = require_lane(ctx, &params.lane_id)?;
    if lane.session_active {
        ctx.engine.kill_lane_session(&lane.id).await?;
    }
    ctx.engine.store.delete_lane(&lane.id)?;
    Ok(json!({ "deleted": true }))
}

pub(super) async fn kill_lane_session(
    ctx: &ListenCtx,
    params: LaneIdParams,
) -> Result<Value, DomainError> {
    let lane = require_lane(ctx, &params.lane_id)?;
    ctx.engine.kill_lane_session(&lane.id).await?;
    Ok(json!({ "killed": true }))
}

pub(super) fn move_task(ctx: &ListenCtx, params: TaskMoveParams) -> Result<Value, DomainError> {
    let task = ctx
        .engine
        .store
        .move_task(&TaskId::from_string(&*params.task_id), params.column)?
        .ok_or_else(|| DomainError::not_found(format!("Task {} is unknown.", params.task_id)))?;
    to_value(&task)
}

pub(super) fn list_tasks(ctx: &ListenCtx, params: TaskListParams) -> Result<Value, DomainError> {
    let tasks = match params.lane_id {
        Some(lane_id) => ctx.engine.store.tasks_in_lane(&lane_id)?,
        None => ctx.engine.store.tasks()?,
    };
    to_value(&tasks)
}

pub(super) async fn start_task(
    ctx: &ListenCtx,
    params: TaskStartParams,
) -> Result<Value, DomainError> {
    let opts = LaunchOptions {
        extra_instructions: params.instructions,
        ask_for_context: params.ask_for_context,
        verification: params.verification,
    };
    to_value(&ctx.engine.start_task(&TaskId::from_string(params.task_id), opts).await?)
}

pub(super) async fn stop_task(
    ctx: &ListenCtx,
    params: TaskIdParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.stop_task(&TaskId::from_string(params.task_id)).await?)
}

pub(super) async fn restart_task(
    ctx: &ListenCtx,
    params: TaskStartParams,
) -> Result<Value, DomainError> {
    let opts = LaunchOptions {
        extra_instructions: params.instructions,
        ask_for_context: params.ask_for_context,
        verification: params.verification,
    };
    to_value(&ctx.engine.restart_task(&TaskId::from_string(params.task_id), opts).await?)
}

pub(super) fn attach_task(ctx: &ListenCtx, params: TaskIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.attach_task(&TaskId::from_string(params.task_id))?)
}

pub(super) async fn summarize_task(
    ctx: &ListenCtx,
    params: TaskIdParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.summarize_task(&TaskId::from_string(params.task_id)).await?)
}

pub(super) fn edit_task(ctx: &ListenCtx, params: TaskEditParams) -> Result<Value, DomainError> {
    let mut task = require_task(ctx, &params.task_id)?;
    if let Some(description) = params.description {
        task.description = description;
    }
    if params.details.is_some() {
        task.details = params.details;
    }
    if params.target_role.is_some() {
        task.target_role = params.target_role;
    }
    if let Some(priority) = params.priority {
        if !(1..=10).contains(&priority) {
            return Err(DomainError::invalid_param("Task priority must be between 1 and 10."));
        }
        task.priority = priority;
    }
    if params.ai_provider.is_some() {
        task.ai_provider = params.ai_provider;
    }
    if params.ai_model.is_some() {
        task.ai_model = params.ai_model;
    }
    ctx.engine.store.save_task(&task)?;
    to_value(&task)
}

/// Create a child task and register it on the parent box.
pub(super) fn add_subtask(ctx: &ListenCtx, params: SubtaskAddParams) -> Result<Value, DomainError> {
    let mut parent = require_task(ctx, &params.parent_task_id)?;
    let mut child = Task::new(params.description, SystemClock.epoch_ms());
    child.details = params.details;
    child.parent_task_id = Some(parent.id.clone());
    child.swim_lane_id = parent.swim_lane_id.clone();
    ctx.engine.store.save_task(&child)?;

    parent.subtask_ids.push(child.id.clone());
    ctx.engine.store.save_task(&parent)?;
    to_value(&child)
}

/// Merge existing tasks into a new task box.
pub(super) fn merge_tasks(ctx: &ListenCtx, params: TaskMergeParams) -> Result<Value, DomainError> {
    if params.task_ids.len() < 2 {
        return Err(DomainError::invalid_param("Merging needs at least two tasks."));
    }
    let mut children = Vec::new();
    for id in &params.task_ids {
        children.push(require_task(ctx, id)?);
    }

    let description = params
        .description
        .unwrap_or_else(|| format!("Task box ({} tasks)", children.len()));
    let mut parent = Task::new(description, SystemClock.epoch_ms());
    parent.swim_lane_id = children[0].swim_lane_id.clone();
    parent.subtask_ids = children.iter().map(|c| c.id.clone()).collect();
    ctx.engine.store.save_task(&parent)?;

    for mut child in children {
        child.parent_task_id = Some(parent.id.clone());
        ctx.engine.store.save_task(&child)?;
    }
    to_value(&parent)
}

/// Dissolve a task box: children become standalone, the box is deleted.
pub(super) fn split_task_box(ctx: &ListenCtx, params: TaskIdParams) -> Result<Value, DomainError> {
    let parent = require_task(ctx, &params.task_id)?;
    if !parent.is_task_box() {
        return Err(DomainError::precondition("Task is not a task box."));
    }
    let mut children = Vec::new();
    for id in &parent.subtask_ids {
        if let Some(mut child) = ctx.engine.store.task(id)? {
            child.parent_task_id = None;
            ctx.engine.store.save_task(&child)?;
            children.push(child);
        }
    }
    ctx.engine.store.delete_task(&parent.id)?;
    to_value(&children)
}

pub(super) fn set_auto_mode(ctx: &ListenCtx, params: AutoModeParams) -> Result<Value, DomainError> {
    let mut task = require_task(ctx, &params.task_id)?;
    if params.auto_start.is_some() {
        task.auto_start = params.auto_start;
    }
    if params.auto_pilot.is_some() {
        task.auto_pilot = params.auto_pilot;
    }
    if params.auto_close.is_some() {
        task.auto_close = params.auto_close;
    }
    ctx.engine.store.save_task(&task)?;
    to_value(&task)
}
