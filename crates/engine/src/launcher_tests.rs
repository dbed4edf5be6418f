// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mh_adapters::mux::MuxError;
use mh_core::{Clock, ErrorKind, KanbanColumn, Task, TaskStatus};

use crate::test_helpers::ctx;
use crate::LaunchOptions;

#[tokio::test]
async fn start_without_lane_is_a_precondition_error() {
    let t = ctx();
    let task = Task::new("no lane", 1);
    t.engine.store.save_task(&task).unwrap();
    let err = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Precondition);
}

#[tokio::test]
async fn start_unknown_task_is_not_found() {
    let t = ctx();
    let err = t
        .engine
        .start_task(&mh_core::TaskId::new(), LaunchOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn launch_creates_session_window_and_sends_prompt() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "write hello.py");

    let launched = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();

    // Session was created lazily; placeholder killed after the real window
    assert!(t.mux.has_session(&lane.session_name));
    let windows = t.mux.window_names(&lane.session_name);
    assert_eq!(windows.len(), 1, "placeholder must be gone: {windows:?}");
    assert!(windows[0].1.starts_with(&format!("task-{}-", task.short_id())));

    // Launch command then prompt
    let sent = t.mux.sent_keys();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].text, "claude");
    assert!(sent[0].enter);
    assert!(sent[1].text.contains("write hello.py"));
    assert!(sent[1].text.contains(&format!("Task ID: {}", task.id)));

    assert_eq!(launched.status, TaskStatus::InProgress);
    assert_eq!(launched.kanban_column, KanbanColumn::InProgress);
    let binding = launched.binding.unwrap();
    assert_eq!(binding.session_name, lane.session_name);
    assert!(launched.sentinel_token.is_none(), "no auto-close, no token");
}

#[tokio::test]
async fn launch_marks_lane_session_active() {
    let t = ctx();
    let lane = t.lane("Demo");
    assert!(!lane.session_active);
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();
    assert!(t.engine.store.lane(&lane.id).unwrap().unwrap().session_active);
}

#[tokio::test]
async fn double_start_is_a_conflict() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();
    let err = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn auto_close_launch_carries_sentinel_and_arms_watcher() {
    let t = ctx();
    let lane = t.lane("Demo");
    let mut task = Task::new("auto", t.clock.epoch_ms());
    task.swim_lane_id = Some(lane.id.clone());
    task.auto_close = Some(true);
    t.engine.store.save_task(&task).unwrap();

    let launched = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();
    let token = launched.sentinel_token.clone().unwrap();

    let sent = t.mux.sent_keys();
    let prompt = &sent[1].text;
    assert!(prompt.contains(&format!("<promise-summary>{token}")));
    assert!(prompt.contains(&format!("<promise>{token}-DONE</promise>")));
    assert!(t.engine.watchers.lock().contains_key(&task.id), "watcher must be armed");
}

#[tokio::test]
async fn unreachable_runtime_leaves_task_untouched() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.mux.fail_all(MuxError::ConnectionRefused("connect to host".into()));

    let err = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::RuntimeUnavailable);

    let task = t.engine.store.task(&task.id).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert!(task.binding.is_none());
}

#[tokio::test]
async fn worktree_lane_launches_inside_worktree() {
    let t = ctx();
    let mut lane = t.lane("Demo");
    lane.use_worktree = Some(true);
    t.engine.store.save_lane(&lane).unwrap();
    let task = t.task_in(&lane, "isolated");

    let launched = t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();
    let path = launched.worktree_path.unwrap();
    assert!(path.display().to_string().contains(".mh-worktrees"));
    let execs = t.mux.execs();
    assert!(execs.iter().any(|c| c.contains("worktree add")), "{execs:?}");
}

#[tokio::test]
async fn stop_task_kills_window_and_resets() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();

    let stopped = t.engine.stop_task(&task.id).await.unwrap();
    assert_eq!(stopped.status, TaskStatus::Pending);
    assert_eq!(stopped.kanban_column, KanbanColumn::Todo);
    assert!(stopped.binding.is_none());
    assert!(t.mux.window_names(&lane.session_name).is_empty());
}

#[tokio::test]
async fn restart_task_relaunches() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();

    let restarted = t.engine.restart_task(&task.id, LaunchOptions::default()).await.unwrap();
    assert_eq!(restarted.status, TaskStatus::InProgress);
    assert!(restarted.binding.is_some());
}

#[tokio::test]
async fn attach_returns_binding_coordinates() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();

    let binding = t.engine.attach_task(&task.id).unwrap();
    assert_eq!(binding.session_name, lane.session_name);

    let unbound = t.task_in(&lane, "y");
    assert_eq!(t.engine.attach_task(&unbound.id).unwrap_err().kind, ErrorKind::Precondition);
}

#[tokio::test]
async fn dependency_cascade_launches_dependency_first() {
    let t = ctx();
    let lane = t.lane("Demo");
    let a = t.task_in(&lane, "task a");
    let mut b = Task::new("task b", t.clock.epoch_ms());
    b.swim_lane_id = Some(lane.id.clone());
    b.auto_start = Some(true);
    b.depends_on = vec![a.id.clone()];
    t.engine.store.save_task(&b).unwrap();

    t.engine.start_task(&b.id, LaunchOptions::default()).await.unwrap();

    // A was cascade-launched with forced auto flags; B stays queued
    let a = t.engine.store.task(&a.id).unwrap().unwrap();
    assert_eq!(a.status, TaskStatus::InProgress);
    assert_eq!(a.auto_start, Some(true));
    assert_eq!(a.auto_pilot, Some(true));
    assert_eq!(a.auto_close, Some(true));
    assert!(a.binding.is_some());

    let b = t.engine.store.task(&b.id).unwrap().unwrap();
    assert_eq!(b.status, TaskStatus::Pending);
    assert!(b.binding.is_none(), "B must wait for A");
}

#[tokio::test]
async fn completing_dependency_launches_dependent() {
    let t = ctx();
    let lane = t.lane("Demo");
    let a = t.task_in(&lane, "task a");
    let mut b = Task::new("task b", t.clock.epoch_ms());
    b.swim_lane_id = Some(lane.id.clone());
    b.auto_start = Some(true);
    b.depends_on = vec![a.id.clone()];
    t.engine.store.save_task(&b).unwrap();

    // A completes
    t.engine.store.move_task(&a.id, KanbanColumn::Done).unwrap();
    t.engine.on_task_completed(&a.id).await.unwrap();

    let b = t.engine.store.task(&b.id).unwrap().unwrap();
    assert_eq!(b.status, TaskStatus::InProgress, "B must launch once A is done");
}

#[tokio::test]
async fn manual_start_with_incomplete_deps_is_precondition() {
    let t = ctx();
    let lane = t.lane("Demo");
    let a = t.task_in(&lane, "task a");
    let mut b = Task::new("task b", t.clock.epoch_ms());
    b.swim_lane_id = Some(lane.id.clone());
    b.depends_on = vec![a.id.clone()];
    t.engine.store.save_task(&b).unwrap();

    let err = t.engine.start_task(&b.id, LaunchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Precondition);
}

#[tokio::test]
async fn submit_rejects_dependency_cycles() {
    let t = ctx();
    let lane = t.lane("Demo");
    let a = t.task_in(&lane, "task a");

    let mut b = Task::new("task b", t.clock.epoch_ms());
    b.depends_on = vec![a.id.clone()];
    let b = t.engine.submit_task(b).await.unwrap();

    // a -> b would close the loop
    let mut a = t.engine.store.task(&a.id).unwrap().unwrap();
    a.depends_on = vec![b.id.clone()];
    let err = t.engine.submit_task(a).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
}

#[tokio::test]
async fn submit_validates_priority() {
    let t = ctx();
    let mut task = Task::new("p", 1);
    task.priority = 0;
    assert_eq!(t.engine.submit_task(task).await.unwrap_err().kind, ErrorKind::InvalidParam);
}

#[tokio::test]
async fn kill_lane_session_clears_bindings_and_belief() {
    let t = ctx();
    let lane = t.lane("Demo");
    let task = t.task_in(&lane, "x");
    t.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap();

    t.engine.kill_lane_session(&lane.id).await.unwrap();

    let lane = t.engine.store.lane(&lane.id).unwrap().unwrap();
    assert!(!lane.session_active);
    let task = t.engine.store.task(&task.id).unwrap().unwrap();
    assert!(task.binding.is_none());
    assert!(t.mux.killed_sessions().contains(&lane.session_name));
}

#[tokio::test]
async fn task_box_completes_when_all_subtasks_do() {
    let t = ctx();
    let lane = t.lane("Demo");
    let mut child_a = t.task_in(&lane, "part one");
    let mut child_b = t.task_in(&lane, "part two");
    let mut parent = Task::new("the feature", t.clock.epoch_ms());
    parent.swim_lane_id = Some(lane.id.clone());
    parent.subtask_ids = vec![child_a.id.clone(), child_b.id.clone()];
    t.engine.store.save_task(&parent).unwrap();
    child_a.parent_task_id = Some(parent.id.clone());
    child_b.parent_task_id = Some(parent.id.clone());
    t.engine.store.save_task(&child_a).unwrap();
    t.engine.store.save_task(&child_b).unwrap();

    t.engine.store.move_task(&child_a.id, KanbanColumn::Done).unwrap();
    t.engine.on_task_completed(&child_a.id).await.unwrap();
    let parent_live = t.engine.store.task(&parent.id).unwrap().unwrap();
    assert_ne!(parent_live.status, TaskStatus::Completed, "one child is not enough");

    t.engine.store.move_task(&child_b.id, KanbanColumn::Done).unwrap();
    t.engine.on_task_completed(&child_b.id).await.unwrap();
    let parent_live = t.engine.store.task(&parent.id).unwrap().unwrap();
    assert_eq!(parent_live.status, TaskStatus::Completed);
    assert_eq!(parent_live.kanban_column, KanbanColumn::Done);
}

#[tokio::test]
async fn task_box_prompt_lists_children() {
    let t = ctx();
    let lane = t.lane("Demo");
    let child_a = t.task_in(&lane, "part one");
    let child_b = t.task_in(&lane, "part two");
    let mut parent = Task::new("the feature", t.clock.epoch_ms());
    parent.swim_lane_id = Some(lane.id.clone());
    parent.subtask_ids = vec![child_a.id.clone(), child_b.id.clone()];
    t.engine.store.save_task(&parent).unwrap();

    t.engine.start_task(&parent.id, LaunchOptions::default()).await.unwrap();
    let sent = t.mux.sent_keys();
    let prompt = &sent[1].text;
    assert!(prompt.contains("2 sub-tasks"));
    assert!(prompt.contains("part one"));
    assert!(prompt.contains("part two"));
}
