// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the data directory: `MUXHERD_DATA_DIR` > `~/.tmux-agents`.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("MUXHERD_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".tmux-agents"))
}

/// Default IPC timeout (override: `MUXHERD_IPC_TIMEOUT_MS`).
pub fn ipc_timeout() -> Duration {
    std::env::var("MUXHERD_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// TCP port override for remote RPC clients.
pub fn tcp_port() -> Option<u16> {
    std::env::var("MUXHERD_TCP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// WebSocket port override for event subscribers.
pub fn ws_port() -> Option<u16> {
    std::env::var("MUXHERD_WS_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// HTTP health port override.
pub fn http_port() -> Option<u16> {
    std::env::var("MUXHERD_HTTP_PORT").ok().and_then(|s| s.parse::<u16>().ok())
}

/// Default AI provider override.
pub fn default_provider() -> Option<String> {
    std::env::var("MUXHERD_DEFAULT_PROVIDER").ok().filter(|s| !s.is_empty())
}

/// Fallback AI provider override.
pub fn fallback_provider() -> Option<String> {
    std::env::var("MUXHERD_FALLBACK_PROVIDER").ok().filter(|s| !s.is_empty())
}

/// Shutdown drain budget for in-flight RPCs.
pub fn drain_timeout() -> Duration {
    std::env::var("MUXHERD_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}
