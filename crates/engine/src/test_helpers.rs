// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use std::collections::HashMap;
use std::sync::Arc;

use mh_adapters::{FakeMux, RuntimeRegistry};
use mh_core::{
    Clock, CollectSink, FakeClock, Periods, ProviderOverride, RuntimeDef, RuntimeId, SshTarget,
    SwimLane, Task,
};
use mh_storage::Store;

use crate::Engine;

pub struct TestCtx {
    pub engine: Arc<Engine<FakeClock>>,
    pub mux: Arc<FakeMux>,
    pub sink: CollectSink,
    pub clock: FakeClock,
}

pub fn ctx() -> TestCtx {
    let sink = CollectSink::new();
    let store = Arc::new(Store::open_in_memory(Arc::new(sink.clone())).unwrap());
    let mux = Arc::new(FakeMux::new());

    // Zero warm-up keeps launch tests instant
    let mut overrides = HashMap::new();
    for provider in ["claude", "gemini", "codex", "opencode", "aider"] {
        overrides.insert(
            provider.to_string(),
            ProviderOverride { warmup_ms: Some(0), ..ProviderOverride::default() },
        );
    }
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
    let periods = Periods {
        orchestrator_ms: 50,
        watcher_ms: 50,
        autoclose_ms: 50,
        autoclose_delay_ms: 600_000,
        reconcile_ms: 50,
    };
    let engine = Arc::new(Engine::new(
        Arc::clone(&store),
        mux.clone() as Arc<dyn mh_adapters::MuxDriver>,
        registry,
        Arc::new(sink.clone()),
        runtimes,
        periods,
        clock.clone(),
    ));
    TestCtx { engine, mux, sink, clock }
}

impl TestCtx {
    /// Persist a lane on the local runtime.
    pub fn lane(&self, name: &str) -> SwimLane {
        let lane = SwimLane::new(name, RuntimeId::local(), "/tmp/proj", self.clock.epoch_ms());
        self.engine.store.save_lane(&lane).unwrap();
        lane
    }

    /// Persist a pending task in the given lane.
    pub fn task_in(&self, lane: &SwimLane, description: &str) -> Task {
        let mut task = Task::new(description, self.clock.epoch_ms());
        task.swim_lane_id = Some(lane.id.clone());
        self.engine.store.save_task(&task).unwrap();
        task
    }
}
