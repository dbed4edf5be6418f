// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use mh_core::RuntimeId;

use super::TreeCache;
use crate::mux::SessionTree;

fn tree(name: &str) -> Vec<SessionTree> {
    vec![SessionTree { session: name.to_string(), windows: Vec::new() }]
}

#[test]
fn fresh_entries_are_served() {
    let cache = TreeCache::new(Duration::from_secs(60));
    let rt = RuntimeId::local();
    assert!(cache.get(&rt).is_none());
    cache.put(rt.clone(), tree("main"));
    assert_eq!(cache.get(&rt).unwrap()[0].session, "main");
}

#[test]
fn expired_entries_are_not_served() {
    let cache = TreeCache::new(Duration::from_millis(0));
    let rt = RuntimeId::local();
    cache.put(rt.clone(), tree("main"));
    std::thread::sleep(Duration::from_millis(5));
    assert!(cache.get(&rt).is_none());
}

#[test]
fn invalidate_removes_the_slot() {
    let cache = TreeCache::new(Duration::from_secs(60));
    let rt = RuntimeId::local();
    cache.put(rt.clone(), tree("main"));
    cache.invalidate(&rt);
    assert!(cache.get(&rt).is_none());
}

#[test]
fn runtimes_have_independent_slots() {
    let cache = TreeCache::new(Duration::from_secs(60));
    let local = RuntimeId::local();
    let remote = RuntimeId::new("r2");
    cache.put(local.clone(), tree("a"));
    cache.put(remote.clone(), tree("b"));
    cache.invalidate(&local);
    assert!(cache.get(&local).is_none());
    assert_eq!(cache.get(&remote).unwrap()[0].session, "b");
}
