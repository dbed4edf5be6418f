// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `pipeline.*` and `template.*` method families.

use serde_json::{json, Value};

use mh_core::{
    built_in_templates, Clock, DomainError, PipelineId, RunId, StageId, SystemClock, TaskTemplate,
    TemplateId,
};
use mh_engine::built_in_pipelines;

use crate::protocol::{
    PipelineCreateParams, PipelineIdParams, RoleParams, RunIdParams, StageAddParams,
    StageCompleteParams, StageFailParams, StageRemoveParams, TemplateCreateParams,
    TemplateIdParams, TemplateUpdateParams,
};

use super::{to_value, ListenCtx};

pub(super) fn create(ctx: &ListenCtx, params: PipelineCreateParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.create_pipeline(&params.name, params.stages)?)
}

pub(super) fn delete(ctx: &ListenCtx, params: PipelineIdParams) -> Result<Value, DomainError> {
    ctx.engine.delete_pipeline(&PipelineId::from_string(params.pipeline_id))?;
    Ok(json!({ "deleted": true }))
}

pub(super) fn add_stage(ctx: &ListenCtx, params: StageAddParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.add_stage(&PipelineId::from_string(params.pipeline_id), params.stage)?)
}

pub(super) fn remove_stage(
    ctx: &ListenCtx,
    params: StageRemoveParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.remove_stage(
        &PipelineId::from_string(params.pipeline_id),
        &StageId::from_string(params.stage_id),
    )?)
}

pub(super) async fn start_run(
    ctx: &ListenCtx,
    params: PipelineIdParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.start_run(&PipelineId::from_string(params.pipeline_id)).await?)
}

pub(super) fn pause_run(ctx: &ListenCtx, params: RunIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.pause_run(&RunId::from_string(params.run_id))?)
}

pub(super) async fn resume_run(
    ctx: &ListenCtx,
    params: RunIdParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.resume_run(&RunId::from_string(params.run_id)).await?)
}

pub(super) fn list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.pipelines()?)
}

pub(super) fn query(ctx: &ListenCtx, params: PipelineIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.require_pipeline(&PipelineId::from_string(params.pipeline_id))?)
}

pub(super) fn get_active_runs(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.active_runs()?)
}

pub(super) fn get_run(ctx: &ListenCtx, params: RunIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.require_run(&RunId::from_string(params.run_id))?)
}

pub(super) fn get_ready_stages(
    ctx: &ListenCtx,
    params: RunIdParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.run_ready_stages(&RunId::from_string(params.run_id))?)
}

pub(super) async fn mark_stage_completed(
    ctx: &ListenCtx,
    params: StageCompleteParams,
) -> Result<Value, DomainError> {
    ctx.engine
        .mark_stage_completed(
            &RunId::from_string(params.run_id.clone()),
            &StageId::from_string(params.stage_id),
            params.output,
        )
        .await?;
    to_value(&ctx.engine.require_run(&RunId::from_string(params.run_id))?)
}

pub(super) async fn mark_stage_failed(
    ctx: &ListenCtx,
    params: StageFailParams,
) -> Result<Value, DomainError> {
    ctx.engine
        .mark_stage_failed(
            &RunId::from_string(params.run_id.clone()),
            &StageId::from_string(params.stage_id),
            params.error,
        )
        .await?;
    to_value(&ctx.engine.require_run(&RunId::from_string(params.run_id))?)
}

pub(super) fn get_built_in(_ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&built_in_pipelines(SystemClock.epoch_ms()))
}

// -- templates --

fn require_template(ctx: &ListenCtx, id: &str) -> Result<TaskTemplate, DomainError> {
    ctx.engine
        .store
        .template(&TemplateId::from_string(id))?
        .ok_or_else(|| DomainError::not_found(format!("Template {id} is unknown.")))
}

pub(super) fn template_create(
    ctx: &ListenCtx,
    params: TemplateCreateParams,
) -> Result<Value, DomainError> {
    if params.name.trim().is_empty() {
        return Err(DomainError::invalid_param("Template name must not be empty."));
    }
    let mut template =
        TaskTemplate::new(params.name, params.description, SystemClock.epoch_ms());
    template.details = params.details;
    template.role = params.role;
    ctx.engine.store.save_template(&template)?;
    to_value(&template)
}

pub(super) fn template_update(
    ctx: &ListenCtx,
    params: TemplateUpdateParams,
) -> Result<Value, DomainError> {
    let mut template = require_template(ctx, &params.template_id)?;
    if template.built_in {
        return Err(DomainError::conflict("Built-in templates cannot be edited."));
    }
    if let Some(name) = params.name {
        template.name = name;
    }
    if let Some(description) = params.description {
        template.description = description;
    }
    if params.details.is_some() {
        template.details = params.details;
    }
    if params.role.is_some() {
        template.role = params.role;
    }
    ctx.engine.store.save_template(&template)?;
    to_value(&template)
}

pub(super) fn template_delete(
    ctx: &ListenCtx,
    params: TemplateIdParams,
) -> Result<Value, DomainError> {
    let template = require_template(ctx, &params.template_id)?;
    if !ctx.engine.store.delete_template(&template.id)? {
        return Err(DomainError::conflict("Built-in templates cannot be deleted."));
    }
    Ok(json!({ "deleted": true }))
}

pub(super) fn template_list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.templates()?)
}

pub(super) fn template_query(
    ctx: &ListenCtx,
    params: TemplateIdParams,
) -> Result<Value, DomainError> {
    to_value(&require_template(ctx, &params.template_id)?)
}

pub(super) fn template_get_by_role(
    ctx: &ListenCtx,
    params: RoleParams,
) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.templates_for_role(params.role)?)
}

pub(super) fn template_get_built_in(ctx: &ListenCtx) -> Result<Value, DomainError> {
    let built_in: Vec<TaskTemplate> =
        ctx.engine.store.templates()?.into_iter().filter(|t| t.built_in).collect();
    if built_in.is_empty() {
        return to_value(&built_in_templates(SystemClock.epoch_ms()));
    }
    to_value(&built_in)
}
