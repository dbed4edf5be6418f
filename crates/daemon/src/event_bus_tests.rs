// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use mh_core::{DomainEvent, Task, TaskId};

use super::{EventBus, SUBSCRIBER_QUEUE_DEPTH};

fn event() -> DomainEvent {
    DomainEvent::TaskUpdated { task: Task::new("t", 1) }
}

#[tokio::test]
async fn subscribers_receive_published_events() {
    let bus = EventBus::new();
    let (_, mut rx) = bus.subscribe(None);
    bus.publish(event());
    let received = rx.recv().await.unwrap();
    assert_eq!(received.topic(), "task.updated");
}

#[tokio::test]
async fn topic_filter_applies() {
    let bus = EventBus::new();
    let (_, mut rx) = bus.subscribe(Some(vec!["task.completed".into()]));
    bus.publish(event());
    bus.publish(DomainEvent::TaskCompleted { task: Task::new("t", 1) });
    let received = rx.recv().await.unwrap();
    assert_eq!(received.topic(), "task.completed");
    assert!(rx.try_recv().is_err(), "filtered topic must not arrive");
}

#[tokio::test]
async fn delivery_is_ordered_per_subscriber() {
    let bus = EventBus::new();
    let (_, mut rx) = bus.subscribe(None);
    bus.publish(DomainEvent::TaskAutoCloseCompleted { task_id: TaskId::from_string("tsk-1") });
    bus.publish(DomainEvent::TaskAutoCloseCompleted { task_id: TaskId::from_string("tsk-2") });
    let first = rx.recv().await.unwrap();
    let second = rx.recv().await.unwrap();
    match (first, second) {
        (
            DomainEvent::TaskAutoCloseCompleted { task_id: a },
            DomainEvent::TaskAutoCloseCompleted { task_id: b },
        ) => {
            assert_eq!(a, "tsk-1");
            assert_eq!(b, "tsk-2");
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn slow_subscribers_are_dropped_without_blocking() {
    let bus = EventBus::new();
    let (_, rx) = bus.subscribe(None);
    // Never drain rx; overflow the queue
    for _ in 0..=SUBSCRIBER_QUEUE_DEPTH {
        bus.publish(event());
    }
    assert_eq!(bus.subscriber_count(), 0, "slow subscriber must be dropped");
    drop(rx);
}

#[tokio::test]
async fn closed_receivers_are_pruned() {
    let bus = EventBus::new();
    let (_, rx) = bus.subscribe(None);
    drop(rx);
    bus.publish(event());
    assert_eq!(bus.subscriber_count(), 0);
}

#[tokio::test]
async fn unsubscribe_removes_by_id() {
    let bus = EventBus::new();
    let (id, _rx) = bus.subscribe(None);
    assert_eq!(bus.subscriber_count(), 1);
    bus.unsubscribe(id);
    assert_eq!(bus.subscriber_count(), 0);
}
