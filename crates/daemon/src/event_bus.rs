// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process topic-keyed pub/sub.
//!
//! Producers never block: every subscriber owns a bounded queue, and a
//! subscriber that falls behind is dropped with a warning rather than
//! applying backpressure to the store or the engine. Delivery is
//! ordered per subscriber; across topics no global order is promised.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use mh_core::{DomainEvent, EventSink};

/// Queue depth per subscriber before it is considered too slow.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 256;

struct Subscriber {
    id: u64,
    /// `None` subscribes to every topic.
    topics: Option<HashSet<String>>,
    tx: mpsc::Sender<DomainEvent>,
}

#[derive(Default)]
struct Inner {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

/// Cloneable handle to the bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; `topics = None` receives everything.
    pub fn subscribe(&self, topics: Option<Vec<String>>) -> (u64, mpsc::Receiver<DomainEvent>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.lock().push(Subscriber {
            id,
            topics: topics.map(|t| t.into_iter().collect()),
            tx,
        });
        debug!(subscriber = id, "event subscriber registered");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: u64) {
        self.inner.subscribers.lock().retain(|s| s.id != id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Fan an event out to every interested subscriber.
    pub fn publish(&self, event: DomainEvent) {
        let topic = event.topic();
        let mut dropped: Vec<u64> = Vec::new();
        {
            let mut subscribers = self.inner.subscribers.lock();
            subscribers.retain(|s| {
                if let Some(topics) = &s.topics {
                    if !topics.contains(topic) {
                        return true;
                    }
                }
                match s.tx.try_send(event.clone()) {
                    Ok(()) => true,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        dropped.push(s.id);
                        false
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => false,
                }
            });
        }
        for id in dropped {
            warn!(subscriber = id, topic, "dropping slow event subscriber");
        }
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: DomainEvent) {
        EventBus::publish(self, event);
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
