// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mh_adapters::MuxDriver;
use mh_core::{Clock, KanbanColumn, MuxBinding, RuntimeId, Task, TaskStatus};

use super::summarize_capture;
use crate::test_helpers::ctx;

#[test]
fn summary_classifies_commands_outcomes_errors() {
    let capture = "\
$ cargo test
running 12 tests
All 12 tests passed
error[E0308]: mismatched types
Deployed to staging
just chatter
";
    let summary = summarize_capture(capture);
    assert!(summary.contains("### Commands"));
    assert!(summary.contains("- $ cargo test"));
    assert!(summary.contains("- running 12 tests"));
    assert!(summary.contains("### Outcomes"));
    assert!(summary.contains("- Deployed to staging"));
    assert!(summary.contains("### Errors"));
    assert!(summary.contains("- error[E0308]: mismatched types"));
    assert!(!summary.contains("just chatter"));
}

#[test]
fn unclassifiable_capture_falls_back_to_tail() {
    let summary = summarize_capture("la la la\nnothing recognisable here");
    assert!(summary.starts_with("Session tail:"));
    assert!(summary.contains("nothing recognisable here"));
}

#[test]
fn sections_are_capped() {
    let mut capture = String::new();
    for i in 0..25 {
        capture.push_str(&format!("$ command number {i}\n"));
    }
    let summary = summarize_capture(&capture);
    assert!(summary.contains("…and 15 more"));
}

#[test]
fn empty_capture_yields_empty_tail() {
    let summary = summarize_capture("");
    assert!(summary.starts_with("Session tail:"));
}

/// A done task with a live window, finished longer ago than the delay.
fn overdue_task(t: &crate::test_helpers::TestCtx, lane: &mh_core::SwimLane) -> Task {
    let now = t.clock.epoch_ms();
    let mut task = Task::new("finished work", now);
    task.swim_lane_id = Some(lane.id.clone());
    task.status = TaskStatus::Completed;
    task.kanban_column = KanbanColumn::Done;
    task.done_at = Some(now.saturating_sub(11 * 60 * 1000));
    task.binding = Some(MuxBinding {
        runtime_id: RuntimeId::local(),
        session_name: lane.session_name.clone(),
        window_index: 1,
        pane_index: 0,
    });
    t.engine.store.save_task(&task).unwrap();
    task
}

#[tokio::test]
async fn overdue_done_task_is_summarised_and_torn_down() {
    let t = ctx();
    let lane = t.lane("Demo");
    t.mux.add_session(&lane.session_name, "main");
    let rt = mh_core::RuntimeDef::local();
    let window = t.mux.new_window(&rt, &lane.session_name, Some("task-w"), None).await.unwrap();
    assert_eq!(window, 1);
    let task = overdue_task(&t, &lane);
    t.mux.set_output(&lane.session_name, 1, 0, "$ pytest\nall tests passed");
    t.sink.clear();

    t.engine.autoclose_tick().await;

    let task = t.engine.store.task(&task.id).unwrap().unwrap();
    assert!(task.binding.is_none(), "binding must be cleared");
    assert!(task.description.contains("**Auto-close session summary:**"));
    assert!(task.description.contains("- $ pytest"));
    assert!(t.mux.window_names(&lane.session_name).iter().all(|(i, _)| *i != 1));
    assert_eq!(t.sink.count("task.autoclose.completed"), 1);
}

#[tokio::test]
async fn recent_done_task_is_left_alone() {
    let t = ctx();
    let lane = t.lane("Demo");
    t.mux.add_session(&lane.session_name, "main");
    let now = t.clock.epoch_ms();
    let mut task = Task::new("just finished", now);
    task.swim_lane_id = Some(lane.id.clone());
    task.kanban_column = KanbanColumn::Done;
    task.done_at = Some(now);
    task.binding = Some(MuxBinding {
        runtime_id: RuntimeId::local(),
        session_name: lane.session_name.clone(),
        window_index: 0,
        pane_index: 0,
    });
    t.engine.store.save_task(&task).unwrap();

    t.engine.autoclose_tick().await;
    let task = t.engine.store.task(&task.id).unwrap().unwrap();
    assert!(task.binding.is_some(), "inside the delay window, nothing happens");
}

#[tokio::test]
async fn unbound_done_task_is_skipped() {
    let t = ctx();
    let lane = t.lane("Demo");
    let now = t.clock.epoch_ms();
    let mut task = Task::new("already closed", now);
    task.swim_lane_id = Some(lane.id.clone());
    task.kanban_column = KanbanColumn::Done;
    task.done_at = Some(now.saturating_sub(60 * 60 * 1000));
    t.engine.store.save_task(&task).unwrap();
    t.sink.clear();

    t.engine.autoclose_tick().await;
    assert_eq!(t.sink.count("task.autoclose.completed"), 0);
}

#[tokio::test]
async fn summarize_task_is_the_manual_trigger() {
    let t = ctx();
    let lane = t.lane("Demo");
    t.mux.add_session(&lane.session_name, "main");
    let rt = mh_core::RuntimeDef::local();
    t.mux.new_window(&rt, &lane.session_name, Some("task-w"), None).await.unwrap();
    let task = overdue_task(&t, &lane);
    t.mux.set_output(&lane.session_name, 1, 0, "$ make build\nbuilt successfully");

    let summarised = t.engine.summarize_task(&task.id).await.unwrap();
    assert!(summarised.description.contains("**Auto-close session summary:**"));
    assert!(summarised.binding.is_none());
}
