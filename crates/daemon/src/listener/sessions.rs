// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handlers for the `runtime.*`, `session.*`, `window.*` and `pane.*`
//! method families — thin pass-throughs to the mux driver.

use serde_json::{json, Value};

use mh_core::{DomainError, DomainEvent};

use crate::protocol::{
    PaneCaptureParams, PaneParams, PaneSendKeysParams, PaneSplitParams, RuntimeParams,
    SessionCreateParams, SessionParams, SessionRenameParams, WindowCreateParams, WindowParams,
    WindowRenameParams,
};

use super::{resolve_runtime, to_value, ListenCtx};

pub(super) fn runtime_list(ctx: &ListenCtx) -> Result<Value, DomainError> {
    to_value(&ctx.engine.runtimes())
}

pub(super) async fn runtime_test_connection(
    ctx: &ListenCtx,
    params: RuntimeParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let result = ctx.engine.mux.list_sessions(&rt).await;
    let (ok, reason) = match &result {
        Ok(_) => (true, None),
        Err(e) => (false, Some(e.reason())),
    };
    ctx.bus.publish(DomainEvent::RuntimeUpdated { runtime_id: rt.id.clone(), ok });
    Ok(json!({ "ok": ok, "reason": reason }))
}

pub(super) async fn session_create(
    ctx: &ListenCtx,
    params: SessionCreateParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let sessions = ctx.engine.mux.list_sessions(&rt).await?;
    if sessions.iter().any(|s| s == &params.name) {
        return Err(DomainError::conflict(format!("Session {:?} already exists.", params.name)));
    }
    ctx.engine
        .mux
        .new_session(
            &rt,
            &params.name,
            mh_adapters::mux::NewSessionOpts {
                cwd: params.cwd.map(Into::into),
                initial_window_name: None,
            },
        )
        .await?;
    Ok(json!({ "created": params.name }))
}

pub(super) async fn session_delete(
    ctx: &ListenCtx,
    params: SessionParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.kill_session(&rt, &params.name).await?;
    Ok(json!({ "deleted": params.name }))
}

pub(super) async fn session_rename(
    ctx: &ListenCtx,
    params: SessionRenameParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.rename_session(&rt, &params.from, &params.to).await?;
    Ok(json!({ "renamed": params.to }))
}

pub(super) async fn session_list(
    ctx: &ListenCtx,
    params: RuntimeParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let tree = ctx.engine.mux.get_tree(&rt).await?;
    to_value(&tree)
}

pub(super) async fn window_create(
    ctx: &ListenCtx,
    params: WindowCreateParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let cwd = params.cwd.map(std::path::PathBuf::from);
    let index = ctx
        .engine
        .mux
        .new_window(&rt, &params.session, params.name.as_deref(), cwd.as_deref())
        .await?;
    Ok(json!({ "window": index }))
}

pub(super) async fn window_kill(
    ctx: &ListenCtx,
    params: WindowParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.kill_window(&rt, &params.session, params.window).await?;
    Ok(json!({ "killed": params.window }))
}

pub(super) async fn window_select(
    ctx: &ListenCtx,
    params: WindowParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.select_window(&rt, &params.session, params.window).await?;
    Ok(json!({ "selected": params.window }))
}

pub(super) async fn window_rename(
    ctx: &ListenCtx,
    params: WindowRenameParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.rename_window(&rt, &params.session, params.window, &params.name).await?;
    Ok(json!({ "renamed": params.name }))
}

pub(super) async fn pane_split(
    ctx: &ListenCtx,
    params: PaneSplitParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let pane = ctx
        .engine
        .mux
        .split_pane(&rt, &params.session, params.window, params.pane, params.vertical)
        .await?;
    Ok(json!({ "pane": pane }))
}

pub(super) async fn pane_kill(ctx: &ListenCtx, params: PaneParams) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.kill_pane(&rt, &params.session, params.window, params.pane).await?;
    Ok(json!({ "killed": params.pane }))
}

pub(super) async fn pane_select(
    ctx: &ListenCtx,
    params: PaneParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine.mux.select_pane(&rt, &params.session, params.window, params.pane).await?;
    Ok(json!({ "selected": params.pane }))
}

pub(super) async fn pane_send_keys(
    ctx: &ListenCtx,
    params: PaneSendKeysParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    ctx.engine
        .mux
        .send_keys(&rt, &params.session, params.window, params.pane, &params.text, params.enter)
        .await?;
    Ok(json!({ "sent": true }))
}

pub(super) async fn pane_capture(
    ctx: &ListenCtx,
    params: PaneCaptureParams,
) -> Result<Value, DomainError> {
    let rt = resolve_runtime(ctx, &params.runtime)?;
    let content = ctx
        .engine
        .mux
        .capture(&rt, &params.session, params.window, params.pane, params.lines)
        .await?;
    Ok(json!({ "content": content }))
}
