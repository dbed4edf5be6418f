// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for `dashboard.getState`, `health.get` and `favorite.*`.

use serde_json::{json, Value};

use mh_core::{Clock, DomainError, Favorite, FavoriteId, SystemClock};

use crate::protocol::{FavoriteAddParams, FavoriteIdParams};

use super::{to_value, ListenCtx};

/// Aggregate snapshot for dashboards: one call, whole board.
pub(super) fn dashboard_state(ctx: &ListenCtx) -> Result<Value, DomainError> {
    let store = &ctx.engine.store;
    Ok(json!({
        "runtimes": ctx.engine.runtimes(),
        "lanes": store.lanes()?,
        "tasks": store.tasks()?,
        "agents": ctx.engine.list_agents(),
        "teams": store.teams()?,
        "pipelines": store.pipelines()?,
        "activeRuns": store.active_runs()?,
        "favorites": store.favorites()?,
    }))
}

/// Health probe: daemon, runtimes, database.
pub(super) async fn health(ctx: &ListenCtx) -> Result<Value, DomainError> {
    let mut runtimes = Vec::new();
    let mut all_ok = true;
    for rt in ctx.engine.runtimes() {
        let ok = ctx.engine.mux.list_sessions(rt).await.is_ok();
        all_ok &= ok;
        runtimes.push(json!({ "id": rt.id, "ok": ok }));
    }
    let db_ok = ctx.engine.store.healthy();

    Ok(json!({
        "ok": all_ok && db_ok,
        "uptimeMs": ctx.start_time.elapsed().as_millis() as u64,
        "version": env!("CARGO_PKG_VERSION"),
        "runtimes": runtimes,
        "database": {
            "ok": db_ok,
            "path": ctx.engine.store.path(),
        },
    }))
}

pub(super) fn favorite_add(ctx: &ListenCtx, params: FavoriteAddParams) -> Result<Value, DomainError> {
    let favorite = Favorite {
        id: FavoriteId::new(),
        kind: params.kind,
        ref_id: params.ref_id,
        label: params.label,
        created_at: SystemClock.epoch_ms(),
    };
    ctx.engine.store.save_favorite(&favorite)?;
    to_value(&favorite)
}

pub(super) fn favorite_remove(
    ctx: &ListenCtx,
    params: FavoriteIdParams,
) -> Result<Value, DomainError> {
    if !ctx.engine.store.delete_favorite(&FavoriteId::from_string(&*params.favorite_id))? {
        return Err(DomainError::not_found(format!(
            "Favorite {} is unknown.",
            params.favorite_id
        )));
    }
    Ok(json!({ "deleted": true }))
}

pub(super) fn favorite_list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.store.favorites()?)
}
