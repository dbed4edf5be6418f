// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy.
//!
//! Every error that crosses the RPC boundary is reduced to an
//! [`ErrorKind`] plus a single human-readable sentence; clients format
//! the message verbatim. `Internal` errors additionally carry a
//! correlation id for log matching.

use serde::{Deserialize, Serialize};

/// Error kinds carried in RPC responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing or out-of-enum argument; caller recoverable.
    InvalidParam,
    /// Referenced task/lane/agent/pipeline id unknown.
    NotFound,
    /// Uniqueness violation, dependency cycle, or task already running.
    Conflict,
    /// Required state absent (no swim lane, dependency incomplete).
    Precondition,
    /// SSH unreachable, tmux missing on host, worktree tool missing.
    RuntimeUnavailable,
    /// AI CLI returned non-zero or was not found on PATH.
    External,
    /// Client disconnected or explicit cancel.
    Cancelled,
    /// Bounded operation exceeded its budget.
    Timeout,
    /// Anything else; includes a correlation id.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParam => "InvalidParam",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::Precondition => "Precondition",
            ErrorKind::RuntimeUnavailable => "RuntimeUnavailable",
            ErrorKind::External => "External",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Internal => "Internal",
        }
    }
}

/// A classified, client-facing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
#[serde(rename_all = "camelCase")]
pub struct DomainError {
    pub kind: ErrorKind,
    pub message: String,
    /// Set for `Internal` errors so operators can grep daemon logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), correlation_id: None }
    }

    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParam, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message)
    }

    pub fn runtime_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeUnavailable, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::External, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Internal errors get a fresh correlation id on construction.
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Internal,
            message: message.into(),
            correlation_id: Some(nanoid::nanoid!(12)),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
