// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-runtime TTL cache for the scraped tmux tree.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use mh_core::RuntimeId;

use super::SessionTree;

/// Default cache lifetime. Pollers hit `get_tree` several times per
/// tick; anything fresher than this is close enough to ground truth.
pub const DEFAULT_TTL: Duration = Duration::from_secs(2);

struct Entry {
    tree: Vec<SessionTree>,
    fetched_at: Instant,
}

/// Short-TTL tree cache, one slot per runtime.
pub struct TreeCache {
    ttl: Duration,
    entries: Mutex<HashMap<RuntimeId, Entry>>,
}

impl TreeCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entries: Mutex::new(HashMap::new()) }
    }

    /// A still-fresh cached tree, if any.
    pub fn get(&self, runtime: &RuntimeId) -> Option<Vec<SessionTree>> {
        let entries = self.entries.lock();
        let entry = entries.get(runtime)?;
        if entry.fetched_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.tree.clone())
    }

    pub fn put(&self, runtime: RuntimeId, tree: Vec<SessionTree>) {
        self.entries
            .lock()
            .insert(runtime, Entry { tree, fetched_at: Instant::now() });
    }

    pub fn invalidate(&self, runtime: &RuntimeId) {
        self.entries.lock().remove(runtime);
    }
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
