// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `agent.*` method family.

use serde_json::{json, Value};

use mh_core::{AgentId, DomainError};
use mh_engine::SpawnAgentParams;

use crate::protocol::{
    AgentIdParams, AgentOutputParams, AgentPromptParams, AgentSpawnParams, AgentStateParams,
    RoleParams, TeamIdParams,
};

use super::{to_value, ListenCtx};

pub(super) async fn spawn(
    ctx: &ListenCtx,
    params: AgentSpawnParams,
) -> Result<Value, DomainError> {
    let agent = ctx
        .engine
        .spawn_agent(SpawnAgentParams {
            role: params.role,
            provider: params.provider,
            model: params.model,
            swim_lane_id: params.swim_lane_id.map(Into::into),
            runtime_id: params.runtime_id.map(|r| mh_core::RuntimeId::new(r)),
            session_name: params.session_name,
            team_id: params.team_id.map(Into::into),
            expertise: params.expertise,
        })
        .await?;
    to_value(&agent)
}

pub(super) async fn kill(ctx: &ListenCtx, params: AgentIdParams) -> Result<Value, DomainError> {
    ctx.engine.kill_agent(&AgentId::from_string(params.agent_id)).await?;
    Ok(json!({ "killed": true }))
}

pub(super) async fn send_prompt(
    ctx: &ListenCtx,
    params: AgentPromptParams,
) -> Result<Value, DomainError> {
    ctx.engine.send_prompt(&AgentId::from_string(params.agent_id), &params.text).await?;
    Ok(json!({ "sent": true }))
}

pub(super) async fn get_output(
    ctx: &ListenCtx,
    params: AgentOutputParams,
) -> Result<Value, DomainError> {
    let output = ctx
        .engine
        .agent_output(&AgentId::from_string(params.agent_id), params.lines)
        .await?;
    Ok(json!({ "output": output }))
}

pub(super) fn list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.list_agents())
}

pub(super) fn query(ctx: &ListenCtx, params: AgentIdParams) -> Result<Value, DomainError> {
    let id = AgentId::from_string(&*params.agent_id);
    let agent = ctx
        .engine
        .get_agent(&id)
        .ok_or_else(|| DomainError::not_found(format!("Agent {id} is unknown.")))?;
    to_value(&agent)
}

pub(super) fn get_idle(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.idle_agents())
}

pub(super) fn get_by_role(ctx: &ListenCtx, params: RoleParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.agents_by_role(params.role))
}

pub(super) fn get_by_team(ctx: &ListenCtx, params: TeamIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.agents_by_team(&params.team_id.into()))
}

pub(super) fn update_state(
    ctx: &ListenCtx,
    params: AgentStateParams,
) -> Result<Value, DomainError> {
    ctx.engine.update_agent_state(&AgentId::from_string(params.agent_id), params.state)?;
    Ok(json!({ "updated": true }))
}
