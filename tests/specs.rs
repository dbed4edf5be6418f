// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level scenario tests: the end-to-end flows a client of the
//! daemon relies on, driven through the engine against the in-memory
//! tmux driver.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::Arc;

use mh_adapters::mux::MuxError;
use mh_adapters::{FakeMux, MuxDriver, RuntimeRegistry};
use mh_core::{
    AgentRole, Clock, CollectSink, FakeClock, KanbanColumn, Periods, ProviderOverride, RuntimeDef,
    RuntimeId, SshTarget, Stage, StageType, SwimLane, Task, TaskStatus,
};
use mh_engine::{Engine, LaunchOptions};
use mh_storage::Store;

struct Harness {
    engine: Arc<Engine<FakeClock>>,
    mux: Arc<FakeMux>,
    sink: CollectSink,
    clock: FakeClock,
}

fn harness() -> Harness {
    let sink = CollectSink::new();
    let store = Arc::new(Store::open_in_memory(Arc::new(sink.clone())).unwrap());
    let mux = Arc::new(FakeMux::new());

    let mut overrides = HashMap::new();
    overrides.insert(
        "claude".to_string(),
        ProviderOverride { warmup_ms: Some(0), ..ProviderOverride::default() },
    );
    let registry = Arc::new(RuntimeRegistry::new("claude", None, &overrides));

    let runtimes = vec![
        RuntimeDef::local(),
        RuntimeDef::ssh(
            "r2",
            "Remote",
            SshTarget {
                host: "r2.example.com".into(),
                port: None,
                user: None,
                identity_file: None,
                config_file: None,
            },
        ),
    ];
    let clock = FakeClock::new();
    let engine = Arc::new(Engine::new(
        store,
        mux.clone() as Arc<dyn MuxDriver>,
        registry,
        Arc::new(sink.clone()),
        runtimes,
        Periods { watcher_ms: 50, ..Periods::default() },
        clock.clone(),
    ));
    Harness { engine, mux, sink, clock }
}

impl Harness {
    fn lane(&self, name: &str, runtime: RuntimeId) -> SwimLane {
        let lane = SwimLane::new(name, runtime, "/tmp/p", self.clock.epoch_ms());
        self.engine.store.save_lane(&lane).unwrap();
        lane
    }

    fn auto_task(&self, lane: &SwimLane, description: &str) -> Task {
        let mut task = Task::new(description, self.clock.epoch_ms());
        task.swim_lane_id = Some(lane.id.clone());
        task.auto_start = Some(true);
        task.auto_pilot = Some(true);
        task.auto_close = Some(true);
        task
    }
}

/// Scenario 1: a single auto task runs to completion via the sentinel
/// protocol.
#[tokio::test]
async fn single_auto_task_completes() {
    let h = harness();
    let lane = h.lane("P", RuntimeId::local());
    let task = h.auto_task(&lane, "write hello.py");
    let task = h.engine.submit_task(task).await.unwrap();

    // Auto-start launched it immediately: window named after the task,
    // CLI launched, prompt delivered with the sentinel instruction.
    let launched = h.engine.store.task(&task.id).unwrap().unwrap();
    assert_eq!(launched.status, TaskStatus::InProgress);
    let binding = launched.binding.clone().unwrap();
    let windows = h.mux.window_names(&lane.session_name);
    assert!(
        windows.iter().any(|(i, name)| *i == binding.window_index
            && name.starts_with(&format!("task-{}-write-hello-py", launched.short_id()))),
        "window name must embed the anchor: {windows:?}"
    );
    let sent = h.mux.sent_keys();
    assert_eq!(sent[0].text, "claude");
    let token = launched.sentinel_token.clone().unwrap();
    assert!(sent[1].text.contains(&format!("<promise>{token}-DONE</promise>")));

    // The agent emits both markers; the watcher completes the task
    h.sink.clear();
    h.mux.set_output(
        &binding.session_name,
        binding.window_index,
        0,
        &format!(
            "...\n<promise-summary>{token}\nWrote hello.py and verified the output.\n</promise-summary>\n<promise>{token}-DONE</promise>\n"
        ),
    );
    for _ in 0..60 {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        if h.engine.store.task(&task.id).unwrap().unwrap().kanban_column == KanbanColumn::Done {
            break;
        }
    }

    let done = h.engine.store.task(&task.id).unwrap().unwrap();
    assert_eq!(done.kanban_column, KanbanColumn::Done);
    assert_eq!(done.output.as_deref(), Some("Wrote hello.py and verified the output."));
    assert_eq!(h.sink.count("task.completed"), 1, "completion fires exactly once");
}

/// Scenario 2: submitting a dependent task launches its dependency
/// first; the dependent launches only after the dependency is done.
#[tokio::test]
async fn dependency_cascade() {
    let h = harness();
    let lane = h.lane("P", RuntimeId::local());

    let mut a = Task::new("task a", h.clock.epoch_ms());
    a.swim_lane_id = Some(lane.id.clone());
    h.engine.store.save_task(&a).unwrap();

    let mut b = h.auto_task(&lane, "task b");
    b.depends_on = vec![a.id.clone()];
    let b = h.engine.submit_task(b).await.unwrap();

    // A launched first, with the auto flags forced on
    let a_live = h.engine.store.task(&a.id).unwrap().unwrap();
    assert_eq!(a_live.status, TaskStatus::InProgress);
    assert_eq!(a_live.auto_pilot, Some(true));
    assert_eq!(a_live.auto_close, Some(true));
    let b_live = h.engine.store.task(&b.id).unwrap().unwrap();
    assert_eq!(b_live.status, TaskStatus::Pending, "B waits for A");

    // A completes via its sentinel
    let a_binding = a_live.binding.clone().unwrap();
    let a_token = a_live.sentinel_token.clone().unwrap();
    h.mux.set_output(
        &a_binding.session_name,
        a_binding.window_index,
        0,
        &format!(
            "<promise-summary>{a_token}\nDid task a.\n</promise-summary>\n<promise>{a_token}-DONE</promise>"
        ),
    );
    for _ in 0..60 {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        if h.engine.store.task(&b.id).unwrap().unwrap().status == TaskStatus::InProgress {
            break;
        }
    }

    let a_done = h.engine.store.task(&a.id).unwrap().unwrap();
    assert_eq!(a_done.kanban_column, KanbanColumn::Done);
    let b_live = h.engine.store.task(&b.id).unwrap().unwrap();
    assert_eq!(b_live.status, TaskStatus::InProgress, "B launches once A is done");
}

/// Scenario 3: a fan-out stage spawns exactly `fanOutCount` sibling
/// tasks carrying the previous stage's output.
#[tokio::test]
async fn fan_out_pipeline() {
    let h = harness();
    let mut s1 = Stage::new("research", StageType::Sequential, AgentRole::Researcher);
    s1.task_description = "research".into();
    let mut s2 = Stage::new("spread", StageType::FanOut, AgentRole::Coder);
    s2.task_description = "implement one slice".into();
    s2.fan_out_count = Some(3);
    s2.depends_on.push(s1.id.clone());
    let (s1_id, s2_id) = (s1.id.clone(), s2.id.clone());

    let pipeline = h.engine.create_pipeline("P", vec![s1, s2]).unwrap();
    let run = h.engine.start_run(&pipeline.id).await.unwrap();

    h.engine.mark_stage_completed(&run.id, &s1_id, Some("x".into())).await.unwrap();

    let tasks = h.engine.store.tasks_for_stage(s2_id.as_str()).unwrap();
    assert_eq!(tasks.len(), 3);
    for task in &tasks {
        assert_eq!(task.pipeline_stage_id, Some(s2_id.clone()));
        assert!(task.details.as_deref().unwrap().contains('x'));
        assert_eq!(task.target_role, Some(AgentRole::Coder));
        assert_eq!(task.status, TaskStatus::Pending, "fan-out tasks enter the queue");
    }
}

/// Scenario 4: an unreachable SSH runtime yields a classified failure
/// and never mutates the task.
#[tokio::test]
async fn ssh_runtime_down() {
    let h = harness();
    let lane = h.lane("R", RuntimeId::new("r2"));
    let mut task = Task::new("remote work", h.clock.epoch_ms());
    task.swim_lane_id = Some(lane.id.clone());
    h.engine.store.save_task(&task).unwrap();

    h.mux.fail_all(MuxError::ConnectionRefused("connection refused".into()));

    // testConnection-style probe classifies the reason
    let rt = h.engine.runtime(&RuntimeId::new("r2")).unwrap().clone();
    let err = h.engine.mux.list_sessions(&rt).await.unwrap_err();
    assert_eq!(err.reason(), "connection refused");

    // startTask surfaces RuntimeUnavailable without mutating the task
    let err = h.engine.start_task(&task.id, LaunchOptions::default()).await.unwrap_err();
    assert_eq!(err.kind, mh_core::ErrorKind::RuntimeUnavailable);
    let untouched = h.engine.store.task(&task.id).unwrap().unwrap();
    assert_eq!(untouched.status, TaskStatus::Pending);
    assert!(untouched.binding.is_none());
    assert!(untouched.started_at.is_none());
}

/// Scenario 5: after a daemon restart, a live task window is rebound by
/// its name anchor and the sentinel watcher is re-armed.
#[tokio::test]
async fn crash_recovery_rebinds() {
    let h = harness();
    let lane = h.lane("P", RuntimeId::local());
    let task = h.auto_task(&lane, "survives restarts");
    let task = h.engine.submit_task(task).await.unwrap();
    let launched = h.engine.store.task(&task.id).unwrap().unwrap();
    let token = launched.sentinel_token.clone().unwrap();

    // Simulate the restart: a fresh engine over the same store and the
    // same (still live) tmux state, task binding wiped mid-flight.
    let mut wiped = launched.clone();
    wiped.binding = None;
    h.engine.store.save_task(&wiped).unwrap();

    h.engine.reconcile_tick().await;

    let recovered = h.engine.store.task(&task.id).unwrap().unwrap();
    let binding = recovered.binding.clone().expect("binding must be re-established");
    let windows = h.mux.window_names(&lane.session_name);
    assert!(windows
        .iter()
        .any(|(i, name)| *i == binding.window_index && name.contains(recovered.short_id())));

    // The re-armed watcher still completes the task
    h.mux.set_output(
        &binding.session_name,
        binding.window_index,
        0,
        &format!(
            "<promise-summary>{token}\nRecovered fine.\n</promise-summary>\n<promise>{token}-DONE</promise>"
        ),
    );
    for _ in 0..60 {
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        if h.engine.store.task(&task.id).unwrap().unwrap().kanban_column == KanbanColumn::Done {
            return;
        }
    }
    panic!("re-armed watcher did not complete the task");
}

/// Scenario 6: the auto-close timer summarises, appends, and tears the
/// window down.
#[tokio::test]
async fn auto_close_timer() {
    let h = harness();
    let lane = h.lane("P", RuntimeId::local());
    let task = h.auto_task(&lane, "old done work");
    let task = h.engine.submit_task(task).await.unwrap();
    let launched = h.engine.store.task(&task.id).unwrap().unwrap();
    let binding = launched.binding.clone().unwrap();
    h.mux.set_output(&binding.session_name, binding.window_index, 0, "$ pytest\nall checks passed");

    // Finished 11 minutes ago
    let mut done = launched.clone();
    done.kanban_column = KanbanColumn::Done;
    done.status = TaskStatus::Completed;
    done.done_at = Some(h.clock.epoch_ms());
    h.engine.store.save_task(&done).unwrap();
    h.clock.advance(11 * 60 * 1000);
    h.sink.clear();

    h.engine.autoclose_tick().await;

    let closed = h.engine.store.task(&task.id).unwrap().unwrap();
    assert!(closed.binding.is_none(), "binding cleared");
    assert!(closed.description.contains("**Auto-close session summary:**"));
    assert!(closed.description.contains("- $ pytest"));
    assert_eq!(h.sink.count("task.autoclose.completed"), 1);
    let windows = h.mux.window_names(&lane.session_name);
    assert!(windows.iter().all(|(i, _)| *i != binding.window_index), "window killed");
}

/// Killing a lane's session clears `session_active` and every binding
/// into the session.
#[tokio::test]
async fn kill_lane_session_property() {
    let h = harness();
    let lane = h.lane("P", RuntimeId::local());
    let task = h.auto_task(&lane, "bound");
    let task = h.engine.submit_task(task).await.unwrap();
    assert!(h.engine.store.task(&task.id).unwrap().unwrap().binding.is_some());

    h.engine.kill_lane_session(&lane.id).await.unwrap();

    let lane = h.engine.store.lane(&lane.id).unwrap().unwrap();
    assert!(!lane.session_active);
    for task in h.engine.store.tasks_in_lane(lane.id.as_str()).unwrap() {
        assert!(task.binding.is_none());
    }
}
