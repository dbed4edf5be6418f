// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The typed request catalog.
//!
//! Clients send `{"id": 1, "method": "task.submit", "params": {...}}`.
//! The envelope is parsed first so an unknown method and malformed
//! params produce distinct errors; each method then deserializes into
//! its own typed param struct.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mh_core::{AgentRole, AgentState, KanbanColumn, Stage, TaskStatus};

/// Raw request envelope as read off the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    /// Client-chosen correlation id, echoed in the response.
    #[serde(default)]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Why an envelope could not be turned into a typed request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Unknown method {0:?}.")]
    UnknownMethod(String),

    #[error("Invalid params: {0}.")]
    InvalidParams(String),
}

fn params<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, RequestError> {
    serde_json::from_value(value).map_err(|e| RequestError::InvalidParams(e.to_string()))
}

// -- param structs --

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeParams {
    /// Defaults to `local` when omitted.
    #[serde(default)]
    pub runtime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreateParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub name: String,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRenameParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowCreateParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowRenameParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaneParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
    #[serde(default)]
    pub pane: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaneSplitParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
    #[serde(default)]
    pub pane: u32,
    #[serde(default)]
    pub vertical: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaneSendKeysParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
    #[serde(default)]
    pub pane: u32,
    pub text: String,
    #[serde(default = "default_true")]
    pub enter: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaneCaptureParams {
    #[serde(default)]
    pub runtime: Option<String>,
    pub session: String,
    pub window: u32,
    #[serde(default)]
    pub pane: u32,
    #[serde(default = "default_capture_lines")]
    pub lines: u32,
}

fn default_true() -> bool {
    true
}

fn default_capture_lines() -> u32 {
    100
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpawnParams {
    #[serde(default)]
    pub role: Option<AgentRole>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub swim_lane_id: Option<String>,
    #[serde(default)]
    pub runtime_id: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub team_id: Option<String>,
    #[serde(default)]
    pub expertise: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdParams {
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPromptParams {
    pub agent_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentOutputParams {
    pub agent_id: String,
    #[serde(default = "default_capture_lines")]
    pub lines: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentStateParams {
    pub agent_id: String,
    pub state: AgentState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleParams {
    pub role: AgentRole,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamCreateParams {
    pub name: String,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    #[serde(default)]
    pub pipeline_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamIdParams {
    pub team_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamAgentParams {
    pub team_id: String,
    pub agent_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeamPipelineParams {
    pub team_id: String,
    #[serde(default)]
    pub pipeline_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineCreateParams {
    pub name: String,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PipelineIdParams {
    pub pipeline_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageAddParams {
    pub pipeline_id: String,
    pub stage: Stage,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageRemoveParams {
    pub pipeline_id: String,
    pub stage_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunIdParams {
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageCompleteParams {
    pub run_id: String,
    pub stage_id: String,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageFailParams {
    pub run_id: String,
    pub stage_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCreateParams {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub role: Option<AgentRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateUpdateParams {
    pub template_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub role: Option<AgentRole>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateIdParams {
    pub template_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskSubmitParams {
    pub description: String,
    #[serde(default)]
    pub swim_lane_id: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub target_role: Option<AgentRole>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub kanban_column: Option<KanbanColumn>,
    #[serde(default)]
    pub auto_start: Option<bool>,
    #[serde(default)]
    pub auto_pilot: Option<bool>,
    #[serde(default)]
    pub auto_close: Option<bool>,
    #[serde(default)]
    pub use_worktree: Option<bool>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub parent_task_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskIdParams {
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusParams {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageIdParams {
    pub stage_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaneCreateParams {
    pub name: String,
    #[serde(default)]
    pub runtime_id: Option<String>,
    pub working_dir: String,
    #[serde(default)]
    pub context_instructions: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auto_start: Option<bool>,
    #[serde(default)]
    pub auto_pilot: Option<bool>,
    #[serde(default)]
    pub auto_close: Option<bool>,
    #[serde(default)]
    pub use_worktree: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaneIdParams {
    pub lane_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LaneEditParams {
    pub lane_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub context_instructions: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub auto_start: Option<bool>,
    #[serde(default)]
    pub auto_pilot: Option<bool>,
    #[serde(default)]
    pub auto_close: Option<bool>,
    #[serde(default)]
    pub use_worktree: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMoveParams {
    pub task_id: String,
    pub column: KanbanColumn,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskListParams {
    #[serde(default)]
    pub lane_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskStartParams {
    pub task_id: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub ask_for_context: bool,
    #[serde(default)]
    pub verification: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskEditParams {
    pub task_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub target_role: Option<AgentRole>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub ai_provider: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskAddParams {
    pub parent_task_id: String,
    pub description: String,
    #[serde(default)]
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskMergeParams {
    pub task_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AutoModeParams {
    pub task_id: String,
    #[serde(default)]
    pub auto_start: Option<bool>,
    #[serde(default)]
    pub auto_pilot: Option<bool>,
    #[serde(default)]
    pub auto_close: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteAddParams {
    pub kind: String,
    pub ref_id: String,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteIdParams {
    pub favorite_id: String,
}

/// One typed variant per RPC method.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    RuntimeList,
    RuntimeTestConnection(RuntimeParams),

    SessionCreate(SessionCreateParams),
    SessionDelete(SessionParams),
    SessionRename(SessionRenameParams),
    SessionList(RuntimeParams),

    WindowCreate(WindowCreateParams),
    WindowKill(WindowParams),
    WindowSelect(WindowParams),
    WindowRename(WindowRenameParams),

    PaneSplit(PaneSplitParams),
    PaneKill(PaneParams),
    PaneSelect(PaneParams),
    PaneSendKeys(PaneSendKeysParams),
    PaneCapture(PaneCaptureParams),

    AgentSpawn(AgentSpawnParams),
    AgentKill(AgentIdParams),
    AgentSendPrompt(AgentPromptParams),
    AgentGetOutput(AgentOutputParams),
    AgentList,
    AgentQuery(AgentIdParams),
    AgentGetIdle,
    AgentGetByRole(RoleParams),
    AgentGetByTeam(TeamIdParams),
    AgentUpdateState(AgentStateParams),

    TeamCreate(TeamCreateParams),
    TeamDelete(TeamIdParams),
    TeamAddAgent(TeamAgentParams),
    TeamRemoveAgent(TeamAgentParams),
    TeamSetPipeline(TeamPipelineParams),
    TeamList,
    TeamQuery(TeamIdParams),
    TeamFindByAgent(AgentIdParams),
    TeamGetAgents(TeamIdParams),

    PipelineCreate(PipelineCreateParams),
    PipelineDelete(PipelineIdParams),
    PipelineAddStage(StageAddParams),
    PipelineRemoveStage(StageRemoveParams),
    PipelineStartRun(PipelineIdParams),
    PipelinePauseRun(RunIdParams),
    PipelineResumeRun(RunIdParams),
    PipelineList,
    PipelineQuery(PipelineIdParams),
    PipelineGetActiveRuns,
    PipelineGetRun(RunIdParams),
    PipelineGetReadyStages(RunIdParams),
    PipelineMarkStageCompleted(StageCompleteParams),
    PipelineMarkStageFailed(StageFailParams),
    PipelineGetBuiltIn,

    TemplateCreate(TemplateCreateParams),
    TemplateUpdate(TemplateUpdateParams),
    TemplateDelete(TemplateIdParams),
    TemplateList,
    TemplateQuery(TemplateIdParams),
    TemplateGetByRole(RoleParams),
    TemplateGetBuiltIn,

    TaskSubmit(TaskSubmitParams),
    TaskCancel(TaskIdParams),
    TaskDelete(TaskIdParams),
    TaskList,
    TaskQuery(TaskIdParams),
    TaskUpdateStatus(TaskStatusParams),
    TaskDispatchNext,
    TaskGetFanOutResults(StageIdParams),

    KanbanCreateLane(LaneCreateParams),
    KanbanListLanes,
    KanbanEditSwimLane(LaneEditParams),
    KanbanDeleteLane(LaneIdParams),
    KanbanKillLaneSession(LaneIdParams),
    KanbanCreateTask(TaskSubmitParams),
    KanbanMoveTask(TaskMoveParams),
    KanbanListTasks(TaskListParams),
    KanbanStartTask(TaskStartParams),
    KanbanStopTask(TaskIdParams),
    KanbanRestartTask(TaskStartParams),
    KanbanAttachTask(TaskIdParams),
    KanbanSummarizeTask(TaskIdParams),
    KanbanEditTask(TaskEditParams),
    KanbanDeleteTask(TaskIdParams),
    KanbanGetTask(TaskIdParams),
    KanbanAddSubtask(SubtaskAddParams),
    KanbanMergeTasks(TaskMergeParams),
    KanbanSplitTaskBox(TaskIdParams),
    KanbanSetAutoMode(AutoModeParams),

    FavoriteAdd(FavoriteAddParams),
    FavoriteRemove(FavoriteIdParams),
    FavoriteList,

    DashboardGetState,
    HealthGet,
    DaemonShutdown,

    /// Upgrade this connection to an event subscriber (socket clients;
    /// WebSocket subscribers connect to the WS port instead).
    Subscribe,
}

impl Request {
    /// Turn an envelope into a typed request.
    pub fn parse(envelope: RpcRequest) -> Result<Self, RequestError> {
        let RpcRequest { method, params: p, .. } = envelope;
        let request = match method.as_str() {
            "runtime.list" => Request::RuntimeList,
            "runtime.testConnection" => Request::RuntimeTestConnection(params(p)?),

            "session.create" => Request::SessionCreate(params(p)?),
            "session.delete" => Request::SessionDelete(params(p)?),
            "session.rename" => Request::SessionRename(params(p)?),
            "session.list" => Request::SessionList(params(p)?),

            "window.create" => Request::WindowCreate(params(p)?),
            "window.kill" => Request::WindowKill(params(p)?),
            "window.select" => Request::WindowSelect(params(p)?),
            "window.rename" => Request::WindowRename(params(p)?),

            "pane.split" => Request::PaneSplit(params(p)?),
            "pane.kill" => Request::PaneKill(params(p)?),
            "pane.select" => Request::PaneSelect(params(p)?),
            "pane.sendKeys" => Request::PaneSendKeys(params(p)?),
            "pane.capture" => Request::PaneCapture(params(p)?),

            "agent.spawn" => Request::AgentSpawn(params(p)?),
            "agent.kill" => Request::AgentKill(params(p)?),
            "agent.sendPrompt" => Request::AgentSendPrompt(params(p)?),
            "agent.getOutput" => Request::AgentGetOutput(params(p)?),
            "agent.list" => Request::AgentList,
            "agent.query" => Request::AgentQuery(params(p)?),
            "agent.getIdle" => Request::AgentGetIdle,
            "agent.getByRole" => Request::AgentGetByRole(params(p)?),
            "agent.getByTeam" => Request::AgentGetByTeam(params(p)?),
            "agent.updateState" => Request::AgentUpdateState(params(p)?),

            "team.create" => Request::TeamCreate(params(p)?),
            "team.delete" => Request::TeamDelete(params(p)?),
            "team.addAgent" => Request::TeamAddAgent(params(p)?),
            "team.removeAgent" => Request::TeamRemoveAgent(params(p)?),
            "team.setPipeline" => Request::TeamSetPipeline(params(p)?),
            "team.list" => Request::TeamList,
            "team.query" => Request::TeamQuery(params(p)?),
            "team.findByAgent" => Request::TeamFindByAgent(params(p)?),
            "team.getAgents" => Request::TeamGetAgents(params(p)?),

            "pipeline.create" => Request::PipelineCreate(params(p)?),
            "pipeline.delete" => Request::PipelineDelete(params(p)?),
            "pipeline.addStage" => Request::PipelineAddStage(params(p)?),
            "pipeline.removeStage" => Request::PipelineRemoveStage(params(p)?),
            "pipeline.startRun" => Request::PipelineStartRun(params(p)?),
            "pipeline.pauseRun" => Request::PipelinePauseRun(params(p)?),
            "pipeline.resumeRun" => Request::PipelineResumeRun(params(p)?),
            "pipeline.list" => Request::PipelineList,
            "pipeline.query" => Request::PipelineQuery(params(p)?),
            "pipeline.getActiveRuns" => Request::PipelineGetActiveRuns,
            "pipeline.getRun" => Request::PipelineGetRun(params(p)?),
            "pipeline.getReadyStages" => Request::PipelineGetReadyStages(params(p)?),
            "pipeline.markStageCompleted" => Request::PipelineMarkStageCompleted(params(p)?),
            "pipeline.markStageFailed" => Request::PipelineMarkStageFailed(params(p)?),
            "pipeline.getBuiltIn" => Request::PipelineGetBuiltIn,

            "template.create" => Request::TemplateCreate(params(p)?),
            "template.update" => Request::TemplateUpdate(params(p)?),
            "template.delete" => Request::TemplateDelete(params(p)?),
            "template.list" => Request::TemplateList,
            "template.query" => Request::TemplateQuery(params(p)?),
            "template.getByRole" => Request::TemplateGetByRole(params(p)?),
            "template.getBuiltIn" => Request::TemplateGetBuiltIn,

            "task.submit" => Request::TaskSubmit(params(p)?),
            "task.cancel" => Request::TaskCancel(params(p)?),
            "task.delete" => Request::TaskDelete(params(p)?),
            "task.list" => Request::TaskList,
            "task.query" => Request::TaskQuery(params(p)?),
            "task.updateStatus" => Request::TaskUpdateStatus(params(p)?),
            "task.dispatchNext" => Request::TaskDispatchNext,
            "task.getFanOutResults" => Request::TaskGetFanOutResults(params(p)?),

            "kanban.createLane" => Request::KanbanCreateLane(params(p)?),
            "kanban.listLanes" => Request::KanbanListLanes,
            "kanban.editSwimLane" => Request::KanbanEditSwimLane(params(p)?),
            "kanban.deleteLane" => Request::KanbanDeleteLane(params(p)?),
            "kanban.killLaneSession" => Request::KanbanKillLaneSession(params(p)?),
            "kanban.createTask" => Request::KanbanCreateTask(params(p)?),
            "kanban.moveTask" => Request::KanbanMoveTask(params(p)?),
            "kanban.listTasks" => Request::KanbanListTasks(params(p)?),
            "kanban.startTask" => Request::KanbanStartTask(params(p)?),
            "kanban.stopTask" => Request::KanbanStopTask(params(p)?),
            "kanban.restartTask" => Request::KanbanRestartTask(params(p)?),
            "kanban.attachTask" => Request::KanbanAttachTask(params(p)?),
            "kanban.summarizeTask" => Request::KanbanSummarizeTask(params(p)?),
            "kanban.editTask" => Request::KanbanEditTask(params(p)?),
            "kanban.deleteTask" => Request::KanbanDeleteTask(params(p)?),
            "kanban.getTask" => Request::KanbanGetTask(params(p)?),
            "kanban.addSubtask" => Request::KanbanAddSubtask(params(p)?),
            "kanban.mergeTasks" => Request::KanbanMergeTasks(params(p)?),
            "kanban.splitTaskBox" => Request::KanbanSplitTaskBox(params(p)?),
            "kanban.setAutoMode" => Request::KanbanSetAutoMode(params(p)?),

            "favorite.add" => Request::FavoriteAdd(params(p)?),
            "favorite.remove" => Request::FavoriteRemove(params(p)?),
            "favorite.list" => Request::FavoriteList,

            "dashboard.getState" => Request::DashboardGetState,
            "health.get" => Request::HealthGet,
            "daemon.shutdown" => Request::DaemonShutdown,
            "subscribe" => Request::Subscribe,

            _ => return Err(RequestError::UnknownMethod(method)),
        };
        Ok(request)
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
