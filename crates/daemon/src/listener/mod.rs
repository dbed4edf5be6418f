// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for socket I/O.
//!
//! Accepts Unix-socket and (optionally) TCP connections without
//! blocking the engine. Each connection carries one request/response
//! exchange — except `subscribe`, which upgrades the connection into a
//! long-lived event stream.

mod agents;
mod kanban;
mod misc;
mod pipelines;
mod sessions;
mod tasks;
mod teams;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::{TcpListener, UnixListener};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use mh_core::{DomainError, SystemClock};
use mh_engine::Engine;

use crate::env::ipc_timeout;
use crate::event_bus::EventBus;
use crate::protocol::{self, Request, RequestError, RpcRequest, RpcResponse};

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub engine: Arc<Engine<SystemClock>>,
    pub bus: EventBus,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

/// Listener accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    tcp: Option<TcpListener>,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, tcp: Option<TcpListener>, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, tcp, ctx }
    }

    /// Accept-loop until the daemon shuts down.
    pub async fn run(self, cancel: CancellationToken) {
        info!("listener running");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("listener stopping");
                    return;
                }
                result = self.unix.accept() => match result {
                    Ok((stream, _)) => {
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            handle_connection(reader, writer, &ctx).await;
                        });
                    }
                    Err(e) => error!(error = %e, "unix accept failed"),
                },
                result = accept_tcp(&self.tcp) => match result {
                    Ok((stream, addr)) => {
                        debug!(%addr, "tcp connection");
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, writer) = stream.into_split();
                            handle_connection(reader, writer, &ctx).await;
                        });
                    }
                    Err(e) => error!(error = %e, "tcp accept failed"),
                },
            }
        }
    }
}

/// Accept on the TCP listener, or pend forever when TCP is disabled.
async fn accept_tcp(
    tcp: &Option<TcpListener>,
) -> std::io::Result<(tokio::net::TcpStream, std::net::SocketAddr)> {
    match tcp {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}

/// Handle one client connection: one request, one response — or an
/// upgrade to an event stream.
async fn handle_connection<R, W>(mut reader: R, mut writer: W, ctx: &ListenCtx)
where
    R: AsyncRead + AsyncReadExt + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let envelope: RpcRequest = match protocol::read_message(&mut reader, ipc_timeout()).await {
        Ok(envelope) => envelope,
        Err(protocol::ProtocolError::ConnectionClosed) => return,
        Err(e) => {
            debug!(error = %e, "unreadable request");
            let response =
                RpcResponse::err(None, &DomainError::invalid_param(format!("Unreadable request: {e}.")));
            let _ = protocol::write_message(&mut writer, &response, ipc_timeout()).await;
            return;
        }
    };
    let id = envelope.id;

    let request = match Request::parse(envelope) {
        Ok(request) => request,
        Err(e) => {
            let error = match &e {
                RequestError::UnknownMethod(_) => DomainError::not_found(e.to_string()),
                RequestError::InvalidParams(_) => DomainError::invalid_param(e.to_string()),
            };
            let _ = protocol::write_message(&mut writer, &RpcResponse::err(id, &error), ipc_timeout())
                .await;
            return;
        }
    };

    if matches!(request, Request::Subscribe) {
        stream_events(writer, ctx, id).await;
        return;
    }

    debug!(request = ?request, "received request");

    // Race the handler against client disconnect so an abandoned call
    // does not keep shelling out.
    let cancel = CancellationToken::new();
    let response = tokio::select! {
        result = handle_request(request, ctx, cancel.clone()) => match result {
            Ok(value) => RpcResponse::ok(id, value),
            Err(error) => RpcResponse::err(id, &error),
        },
        _ = detect_disconnect(&mut reader) => {
            cancel.cancel();
            debug!("client disconnected, cancelling handler");
            return;
        }
    };

    if let Err(e) = protocol::write_message(&mut writer, &response, ipc_timeout()).await {
        debug!(error = %e, "response write failed");
    }
}

/// In the one-shot protocol the client sends nothing after its request;
/// a read completing means EOF (disconnect).
async fn detect_disconnect<R: AsyncReadExt + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 1];
    let _ = reader.read(&mut buf).await;
}

/// Forward bus events to a subscriber connection until it goes away.
async fn stream_events<W>(mut writer: W, ctx: &ListenCtx, id: Option<u64>)
where
    W: AsyncWrite + Unpin,
{
    let (sub_id, mut rx) = ctx.bus.subscribe(None);
    let ack = RpcResponse::ok(id, serde_json::json!({ "subscribed": true }));
    if protocol::write_message(&mut writer, &ack, ipc_timeout()).await.is_err() {
        ctx.bus.unsubscribe(sub_id);
        return;
    }
    while let Some(event) = rx.recv().await {
        if protocol::write_message(&mut writer, &event, ipc_timeout()).await.is_err() {
            break;
        }
    }
    ctx.bus.unsubscribe(sub_id);
    debug!(subscriber = sub_id, "event stream closed");
}

/// Dispatch a typed request to its handler.
pub(crate) async fn handle_request(
    request: Request,
    ctx: &ListenCtx,
    cancel: CancellationToken,
) -> Result<Value, DomainError> {
    if cancel.is_cancelled() {
        return Err(DomainError::cancelled("Client went away."));
    }
    match request {
        Request::RuntimeList => sessions::runtime_list(ctx),
        Request::RuntimeTestConnection(p) => sessions::runtime_test_connection(ctx, p).await,

        Request::SessionCreate(p) => sessions::session_create(ctx, p).await,
        Request::SessionDelete(p) => sessions::session_delete(ctx, p).await,
        Request::SessionRename(p) => sessions::session_rename(ctx, p).await,
        Request::SessionList(p) => sessions::session_list(ctx, p).await,

        Request::WindowCreate(p) => sessions::window_create(ctx, p).await,
        Request::WindowKill(p) => sessions::window_kill(ctx, p).await,
        Request::WindowSelect(p) => sessions::window_select(ctx, p).await,
        Request::WindowRename(p) => sessions::window_rename(ctx, p).await,

        Request::PaneSplit(p) => sessions::pane_split(ctx, p).await,
        Request::PaneKill(p) => sessions::pane_kill(ctx, p).await,
        Request::PaneSelect(p) => sessions::pane_select(ctx, p).await,
        Request::PaneSendKeys(p) => sessions::pane_send_keys(ctx, p).await,
        Request::PaneCapture(p) => sessions::pane_capture(ctx, p).await,

        Request::AgentSpawn(p) => agents::spawn(ctx, p).await,
        Request::AgentKill(p) => agents::kill(ctx, p).await,
        Request::AgentSendPrompt(p) => agents::send_prompt(ctx, p).await,
        Request::AgentGetOutput(p) => agents::get_output(ctx, p).await,
        Request::AgentList => agents::list(ctx),
        Request::AgentQuery(p) => agents::query(ctx, p),
        Request::AgentGetIdle => agents::get_idle(ctx),
        Request::AgentGetByRole(p) => agents::get_by_role(ctx, p),
        Request::AgentGetByTeam(p) => agents::get_by_team(ctx, p),
        Request::AgentUpdateState(p) => agents::update_state(ctx, p),

        Request::TeamCreate(p) => teams::create(ctx, p),
        Request::TeamDelete(p) => teams::delete(ctx, p),
        Request::TeamAddAgent(p) => teams::add_agent(ctx, p),
        Request::TeamRemoveAgent(p) => teams::remove_agent(ctx, p),
        Request::TeamSetPipeline(p) => teams::set_pipeline(ctx, p),
        Request::TeamList => teams::list(ctx),
        Request::TeamQuery(p) => teams::query(ctx, p),
        Request::TeamFindByAgent(p) => teams::find_by_agent(ctx, p),
        Request::TeamGetAgents(p) => teams::get_agents(ctx, p),

        Request::PipelineCreate(p) => pipelines::create(ctx, p),
        Request::PipelineDelete(p) => pipelines::delete(ctx, p),
        Request::PipelineAddStage(p) => pipelines::add_stage(ctx, p),
        Request::PipelineRemoveStage(p) => pipelines::remove_stage(ctx, p),
        Request::PipelineStartRun(p) => pipelines::start_run(ctx, p).await,
        Request::PipelinePauseRun(p) => pipelines::pause_run(ctx, p),
        Request::PipelineResumeRun(p) => pipelines::resume_run(ctx, p).await,
        Request::PipelineList => pipelines::list(ctx),
        Request::PipelineQuery(p) => pipelines::query(ctx, p),
        Request::PipelineGetActiveRuns => pipelines::get_active_runs(ctx),
        Request::PipelineGetRun(p) => pipelines::get_run(ctx, p),
        Request::PipelineGetReadyStages(p) => pipelines::get_ready_stages(ctx, p),
        Request::PipelineMarkStageCompleted(p) => pipelines::mark_stage_completed(ctx, p).await,
        Request::PipelineMarkStageFailed(p) => pipelines::mark_stage_failed(ctx, p).await,
        Request::PipelineGetBuiltIn => pipelines::get_built_in(ctx),

        Request::TemplateCreate(p) => pipelines::template_create(ctx, p),
        Request::TemplateUpdate(p) => pipelines::template_update(ctx, p),
        Request::TemplateDelete(p) => pipelines::template_delete(ctx, p),
        Request::TemplateList => pipelines::template_list(ctx),
        Request::TemplateQuery(p) => pipelines::template_query(ctx, p),
        Request::TemplateGetByRole(p) => pipelines::template_get_by_role(ctx, p),
        Request::TemplateGetBuiltIn => pipelines::template_get_built_in(ctx),

        Request::TaskSubmit(p) => tasks::submit(ctx, p).await,
        Request::TaskCancel(p) => tasks::cancel(ctx, p).await,
        Request::TaskDelete(p) => tasks::delete(ctx, p).await,
        Request::TaskList => tasks::list(ctx),
        Request::TaskQuery(p) => tasks::query(ctx, p),
        Request::TaskUpdateStatus(p) => tasks::update_status(ctx, p),
        Request::TaskDispatchNext => tasks::dispatch_next(ctx).await,
        Request::TaskGetFanOutResults(p) => tasks::get_fan_out_results(ctx, p),

        Request::KanbanCreateLane(p) => kanban::create_lane(ctx, p),
        Request::KanbanListLanes => kanban::list_lanes(ctx),
        Request::KanbanEditSwimLane(p) => kanban::edit_lane(ctx, p),
        Request::KanbanDeleteLane(p) => kanban::delete_lane(ctx, p).await,
        Request::KanbanKillLaneSession(p) => kanban::kill_lane_session(ctx, p).await,
        Request::KanbanCreateTask(p) => tasks::submit(ctx, p).await,
        Request::KanbanMoveTask(p) => kanban::move_task(ctx, p),
        Request::KanbanListTasks(p) => kanban::list_tasks(ctx, p),
        Request::KanbanStartTask(p) => kanban::start_task(ctx, p).await,
        Request::KanbanStopTask(p) => kanban::stop_task(ctx, p).await,
        Request::KanbanRestartTask(p) => kanban::restart_task(ctx, p).await,
        Request::KanbanAttachTask(p) => kanban::attach_task(ctx, p),
        Request::KanbanSummarizeTask(p) => kanban::summarize_task(ctx, p).await,
        Request::KanbanEditTask(p) => kanban::edit_task(ctx, p),
        Request::KanbanDeleteTask(p) => tasks::delete(ctx, p).await,
        Request::KanbanGetTask(p) => tasks::query(ctx, p),
        Request::KanbanAddSubtask(p) => kanban::add_subtask(ctx, p),
        Request::KanbanMergeTasks(p) => kanban::merge_tasks(ctx, p),
        Request::KanbanSplitTaskBox(p) => kanban::split_task_box(ctx, p),
        Request::KanbanSetAutoMode(p) => kanban::set_auto_mode(ctx, p),

        Request::FavoriteAdd(p) => misc::favorite_add(ctx, p),
        Request::FavoriteRemove(p) => misc::favorite_remove(ctx, p),
        Request::FavoriteList => misc::favorite_list(ctx),

        Request::DashboardGetState => misc::dashboard_state(ctx),
        Request::HealthGet => misc::health(ctx).await,

        Request::DaemonShutdown => {
            ctx.shutdown.notify_one();
            Ok(serde_json::json!({ "stopping": true }))
        }

        // Intercepted in handle_connection before dispatch
        Request::Subscribe => Err(DomainError::invalid_param(
            "subscribe is a connection upgrade, not a call.",
        )),
    }
}

/// Serialize a handler result into the response envelope payload.
pub(crate) fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::internal(format!("response serialization failed: {e}")))
}

/// Resolve the optional `runtime` param (default `local`).
pub(crate) fn resolve_runtime(
    ctx: &ListenCtx,
    runtime: &Option<String>,
) -> Result<mh_core::RuntimeDef, DomainError> {
    let id = runtime
        .as_deref()
        .map(mh_core::RuntimeId::new)
        .unwrap_or_else(mh_core::RuntimeId::local);
    ctx.engine.runtime(&id).cloned()
}

#[cfg(test)]
pub(crate) mod test_fixtures;

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
