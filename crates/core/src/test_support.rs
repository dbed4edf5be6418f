// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for other crates' tests (behind the `test-support` feature).

use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{DomainEvent, EventSink};

/// Sink that records every published event for assertions.
#[derive(Clone, Default)]
pub struct CollectSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything published so far.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().clone()
    }

    /// Topics of everything published so far, in order.
    pub fn topics(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.topic()).collect()
    }

    /// Number of events published on `topic`.
    pub fn count(&self, topic: &str) -> usize {
        self.events.lock().iter().filter(|e| e.topic() == topic).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for CollectSink {
    fn publish(&self, event: DomainEvent) {
        self.events.lock().push(event);
    }
}
