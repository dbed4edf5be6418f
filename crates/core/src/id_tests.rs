// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::task::TaskId;
use crate::id::short;

#[test]
fn generated_ids_carry_prefix_and_length() {
    let id = TaskId::new();
    assert!(id.as_str().starts_with("tsk-"));
    assert_eq!(id.as_str().len(), 23);
}

#[test]
fn generated_ids_are_unique() {
    let a = TaskId::new();
    let b = TaskId::new();
    assert_ne!(a, b);
}

#[test]
fn from_string_round_trips() {
    let id = TaskId::from_string("tsk-abc123");
    assert_eq!(id.as_str(), "tsk-abc123");
    assert_eq!(id, "tsk-abc123");
}

#[test]
fn short_truncates_full_id() {
    let id = TaskId::from_string("tsk-0123456789abcdefghi");
    assert_eq!(id.short(15), "tsk-01234567891");
    assert_eq!(id.short(15).len(), 15);
}

#[test]
fn short_of_short_string_is_identity() {
    let id = TaskId::from_string("tsk-x");
    assert_eq!(id.short(15), "tsk-x");
}

#[test]
fn short_respects_char_boundaries() {
    // 'é' is two bytes; cutting inside it must back off
    assert_eq!(short("é", 1), "");
    assert_eq!(short("abé", 3), "ab");
}

#[test]
fn serde_is_transparent() {
    let id = TaskId::from_string("tsk-serde");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"tsk-serde\"");
    let back: TaskId = serde_json::from_str(&json).unwrap();
    assert_eq!(back, id);
}
