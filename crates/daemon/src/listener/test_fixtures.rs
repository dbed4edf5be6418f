// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures for listener handler tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Notify;

use mh_adapters::{FakeMux, RuntimeRegistry};
use mh_core::{Periods, ProviderOverride, RuntimeDef, RuntimeId, SwimLane, SystemClock};
use mh_engine::Engine;
use mh_storage::Store;

use crate::event_bus::EventBus;

use super::ListenCtx;

pub(crate) struct Fixture {
    pub ctx: ListenCtx,
    pub mux: Arc<FakeMux>,
}

pub(crate) fn fixture() -> Fixture {
    let bus = EventBus::new();
    let store = Arc::new(Store::open_in_memory(Arc::new(bus.clone())).unwrap());
    let mux = Arc::new(FakeMux::new());

    let mut overrides = HashMap::new();
    overrides.insert(
        "claude".to_string(),
        ProviderOverride { warmup_ms: Some(0), ..ProviderOverride::default() },
    );
    let registry = Arc::new(RuntimeRegistry::new("claude", None, &overrides));

    let engine = Arc::new(Engine::new(
        store,
        mux.clone() as Arc<dyn mh_adapters::MuxDriver>,
        registry,
        Arc::new(bus.clone()),
        vec![RuntimeDef::local()],
        Periods::default(),
        SystemClock,
    ));

    Fixture {
        ctx: ListenCtx {
            engine,
            bus,
            start_time: Instant::now(),
            shutdown: Arc::new(Notify::new()),
        },
        mux,
    }
}

impl Fixture {
    pub fn lane(&self, name: &str) -> SwimLane {
        let lane = SwimLane::new(name, RuntimeId::local(), "/tmp/proj", 1);
        self.ctx.engine.store.save_lane(&lane).unwrap();
        lane
    }
}
