// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//! Requests are `{"id", "method", "params"}` envelopes; responses are
//! `{"id", "result"}` or `{"id", "error": {code, message, data?}}`.

mod request;
mod response;
mod wire;

pub use request::{Request, RequestError, RpcRequest};
pub use response::{ErrorBody, RpcResponse};
pub use wire::{decode, encode, read_message, write_message, ProtocolError, MAX_FRAME_LEN};

pub use request::{
    AgentIdParams, AgentOutputParams, AgentPromptParams, AgentSpawnParams, AgentStateParams,
    AutoModeParams, FavoriteAddParams, FavoriteIdParams, LaneCreateParams, LaneEditParams,
    LaneIdParams, PaneCaptureParams, PaneParams, PaneSendKeysParams, PaneSplitParams,
    PipelineCreateParams, PipelineIdParams, RoleParams, RunIdParams, RuntimeParams,
    SessionCreateParams, SessionParams, SessionRenameParams, StageAddParams, StageCompleteParams,
    StageFailParams, StageIdParams, StageRemoveParams, SubtaskAddParams, TaskEditParams,
    TaskIdParams, TaskListParams, TaskMergeParams, TaskMoveParams, TaskStartParams,
    TaskStatusParams, TaskSubmitParams, TeamAgentParams, TeamCreateParams, TeamIdParams,
    TeamPipelineParams, TemplateCreateParams, TemplateIdParams, TemplateUpdateParams,
    WindowCreateParams, WindowParams, WindowRenameParams,
};
