// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;

use super::{effective_status, read_pane_metadata, CcState, PaneMetadata};
use crate::registry::PaneStatus;

fn options(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn full_annotation_set_parses() {
    let meta = read_pane_metadata(&options(&[
        ("@cc_model", "claude-opus"),
        ("@cc_session_id", "sess-42"),
        ("@cc_cwd", "/home/u/proj"),
        ("@cc_context_pct", "37%"),
        ("@cc_tokens_in", "1200"),
        ("@cc_tokens_out", "450"),
        ("@cc_cost", "$0.42"),
        ("@cc_git_branch", "task/fix"),
        ("@cc_last_tool", "Bash"),
        ("@cc_state", "busy"),
    ]));
    assert_eq!(meta.model.as_deref(), Some("claude-opus"));
    assert_eq!(meta.session_id.as_deref(), Some("sess-42"));
    assert_eq!(meta.context_pct, Some(37.0));
    assert_eq!(meta.tokens_in, Some(1200));
    assert_eq!(meta.tokens_out, Some(450));
    assert_eq!(meta.cost, Some(0.42));
    assert_eq!(meta.git_branch.as_deref(), Some("task/fix"));
    assert_eq!(meta.state, Some(CcState::Busy));
}

#[test]
fn unannotated_pane_yields_empty_metadata() {
    let meta = read_pane_metadata(&options(&[("@other_option", "x")]));
    assert!(meta.is_empty());
}

#[test]
fn malformed_numbers_are_dropped() {
    let meta = read_pane_metadata(&options(&[
        ("@cc_tokens_in", "lots"),
        ("@cc_state", "meditating"),
    ]));
    assert_eq!(meta.tokens_in, None);
    assert_eq!(meta.state, None);
}

#[test]
fn state_overrides_heuristic() {
    let mut meta = PaneMetadata::default();
    assert_eq!(effective_status(&meta, PaneStatus::Idle), PaneStatus::Idle);

    meta.state = Some(CcState::Busy);
    assert_eq!(effective_status(&meta, PaneStatus::Idle), PaneStatus::Working);

    meta.state = Some(CcState::User);
    assert_eq!(effective_status(&meta, PaneStatus::Working), PaneStatus::Waiting);

    meta.state = Some(CcState::Idle);
    assert_eq!(effective_status(&meta, PaneStatus::Working), PaneStatus::Idle);
}
