// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `team.*` method family.

use serde_json::{json, Value};

use mh_core::{Clock, DomainError, SystemClock, Team, TeamId};

use crate::protocol::{
    AgentIdParams, TeamAgentParams, TeamCreateParams, TeamIdParams, TeamPipelineParams,
};

use super::{to_value, ListenCtx};

fn require_team(ctx: &ListenCtx, id: &str) -> Result<Team, DomainError> {
    ctx.engine
        .store
        .team(&TeamId::from_string(id))?
        .ok_or_else(|| DomainError::not_found(format!("Team {id} is unknown.")))
}

pub(super) fn create(ctx: &ListenCtx, params: TeamCreateParams) -> Result<Value, DomainError> {
    if params.name.trim().is_empty() {
        return Err(DomainError::invalid_param("Team name must not be empty."));
    }
    let mut team = Team::new(params.name, SystemClock.epoch_ms());
    for agent_id in params.agent_ids {
        team.add_agent(agent_id.into());
    }
    team.pipeline_id = params.pipeline_id.map(Into::into);
    ctx.engine.store.save_team(&team)?;
    to_value(&team)
}

pub(super) fn delete(ctx: &ListenCtx, params: TeamIdParams) -> Result<Value, DomainError> {
    let team = ctx.engine.store.delete_team(&TeamId::from_string(&*params.team_id))?;
    match team {
        Some(_) => Ok(json!({ "deleted": true })),
        None => Err(DomainError::not_found(format!("Team {} is unknown.", params.team_id))),
    }
}

pub(super) fn add_agent(ctx: &ListenCtx, params: TeamAgentParams) -> Result<Value, DomainError> {
    let mut team = require_team(ctx, &params.team_id)?;
    team.add_agent(params.agent_id.into());
    ctx.engine.store.save_team(&team)?;
    to_value(&team)
}

pub(super) fn remove_agent(
    ctx: &ListenCtx,
    params: TeamAgentParams,
) -> Result<Value, DomainError> {
    let mut team = require_team(ctx, &params.team_id)?;
    team.remove_agent(&params.agent_id.into());
    ctx.engine.store.save_team(&team)?;
    to_value(&team)
}

pub(super) fn set_pipeline(
    ctx: &ListenCtx,
    params: TeamPipelineParams,
) -> Result<Value, DomainError> {
    let mut team = require_team(ctx, &params.team_id)?;
    team.pipeline_id = params.pipeline_id.map(Into::into);
    ctx.engine.store.save_team(&team)?;
    to_value(&team)
}

pub(super) fn list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.teams()?)
}

pub(super) fn query(ctx: &ListenCtx, params: TeamIdParams) -> Result<Value, DomainError> {
    to_value(&require_team(ctx, &params.team_id)?)
}

pub(super) fn find_by_agent(ctx: &ListenCtx, params: AgentIdParams) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.team_of_agent(&params.agent_id)?)
}

pub(super) fn get_agents(ctx: &ListenCtx, params: TeamIdParams) -> Result<Value, DomainError> {
    let team = require_team(ctx, &params.team_id)?;
    let agents: Vec<_> = team
        .agent_ids
        .iter()
        .filter_map(|id| ctx.engine.get_agent(id))
        .collect();
    to_value(&agents)
}
