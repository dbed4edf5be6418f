// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response envelope and the error body.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mh_core::DomainError;

/// Error body carried in `{error: {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// One of the nine error kinds, e.g. `"NotFound"`.
    pub code: String,
    /// A single human-readable sentence; clients render it verbatim.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Response envelope: exactly one of `result` / `error` is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl RpcResponse {
    pub fn ok(id: Option<u64>, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: Option<u64>, error: &DomainError) -> Self {
        let data = error
            .correlation_id
            .as_ref()
            .map(|cid| serde_json::json!({ "correlationId": cid }));
        Self {
            id,
            result: None,
            error: Some(ErrorBody {
                code: error.kind.as_str().to_string(),
                message: error.message.clone(),
                data,
            }),
        }
    }
}
