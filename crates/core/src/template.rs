// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reusable task templates, optionally scoped to an agent role.

use serde::{Deserialize, Serialize};

use crate::agent::AgentRole;

crate::define_id! {
    /// Unique template identifier (`tpl-` prefix).
    pub struct TemplateId("tpl-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub id: TemplateId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<AgentRole>,
    /// Built-in templates ship with the daemon and cannot be deleted.
    #[serde(default)]
    pub built_in: bool,
    pub created_at: u64,
}

impl TaskTemplate {
    pub fn new(name: impl Into<String>, description: impl Into<String>, created_at: u64) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            description: description.into(),
            details: None,
            role: None,
            built_in: false,
            created_at,
        }
    }
}

/// Templates shipped with the daemon.
pub fn built_in_templates(now: u64) -> Vec<TaskTemplate> {
    let mut fix = TaskTemplate::new("Fix failing tests", "Run the test suite, then fix every failing test.", now);
    fix.role = Some(AgentRole::Tester);
    fix.built_in = true;

    let mut review = TaskTemplate::new(
        "Review recent changes",
        "Review the most recent commits for correctness and style; write findings to REVIEW.md.",
        now,
    );
    review.role = Some(AgentRole::Reviewer);
    review.built_in = true;

    let mut docs = TaskTemplate::new(
        "Update documentation",
        "Bring README and module docs in line with the current behavior.",
        now,
    );
    docs.role = Some(AgentRole::Coder);
    docs.built_in = true;

    vec![fix, review, docs]
}
