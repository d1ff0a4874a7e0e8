#![forbid(unsafe_code)]
//! In-process publish/subscribe with per-subscriber bounded mailboxes.
//! Publishers never block: a full or hung-up mailbox drops the subscriber.

use gm_core::time::now_ms;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

pub const DEFAULT_MAILBOX_BOUND: usize = 256;

pub type SubscriberId = u64;

#[derive(Clone, Debug)]
pub struct BusEvent {
    pub name: String,
    pub payload: Value,
    pub ts_ms: i64,
}

#[derive(Debug)]
struct Subscriber {
    id: SubscriberId,
    /// None subscribes to every event name.
    names: Option<HashSet<String>>,
    sender: SyncSender<BusEvent>,
}

#[derive(Debug, Default)]
struct BusInner {
    subscribers: Vec<Subscriber>,
    next_id: SubscriberId,
}

#[derive(Debug)]
pub struct EventBus {
    inner: Mutex<BusInner>,
    mailbox_bound: usize,
}

fn lock(mutex: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_MAILBOX_BOUND)
    }
}

impl EventBus {
    pub fn new(mailbox_bound: usize) -> Self {
        Self {
            inner: Mutex::new(BusInner::default()),
            mailbox_bound: mailbox_bound.max(1),
        }
    }

    /// Register a subscriber. `names: None` receives everything; otherwise
    /// only the listed event names are delivered.
    pub fn subscribe(&self, names: Option<Vec<String>>) -> (SubscriberId, Receiver<BusEvent>) {
        let (sender, receiver) = sync_channel(self.mailbox_bound);
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.subscribers.push(Subscriber {
            id,
            names: names.map(|list| list.into_iter().collect()),
            sender,
        });
        (id, receiver)
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut inner = lock(&self.inner);
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }

    /// Fan an event out to every interested subscriber. Delivery is
    /// `try_send`: a subscriber whose mailbox is full or whose receiver is
    /// gone is removed on the spot.
    pub fn publish(&self, name: &str, payload: Value) {
        let event = BusEvent {
            name: name.to_string(),
            payload,
            ts_ms: now_ms(),
        };
        let mut inner = lock(&self.inner);
        let mut dropped: Vec<SubscriberId> = Vec::new();
        for subscriber in &inner.subscribers {
            let interested = subscriber
                .names
                .as_ref()
                .is_none_or(|names| names.contains(name));
            if !interested {
                continue;
            }
            match subscriber.sender.try_send(event.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(
                        subscriber = subscriber.id,
                        event = name,
                        "subscriber mailbox overflow, dropping subscriber"
                    );
                    dropped.push(subscriber.id);
                }
                Err(TrySendError::Disconnected(_)) => {
                    dropped.push(subscriber.id);
                }
            }
        }
        if !dropped.is_empty() {
            inner.subscribers.retain(|s| !dropped.contains(&s.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn subscribers_receive_matching_events_only() {
        let bus = EventBus::default();
        let (_, all) = bus.subscribe(None);
        let (_, components_only) =
            bus.subscribe(Some(vec!["component-created".to_string()]));

        bus.publish("component-created", json!({ "id": "c1" }));
        bus.publish("task-created", json!({ "id": "t1" }));

        let names: Vec<String> = all.try_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["component-created", "task-created"]);

        let filtered: Vec<String> = components_only.try_iter().map(|e| e.name).collect();
        assert_eq!(filtered, vec!["component-created"]);
    }

    #[test]
    fn overflowing_subscriber_is_dropped_without_blocking_the_publisher() {
        let bus = EventBus::new(2);
        let (_, receiver) = bus.subscribe(None);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish("e", json!(1));
        bus.publish("e", json!(2));
        // Mailbox full: the third publish drops the subscriber instead of
        // blocking.
        bus.publish("e", json!(3));
        assert_eq!(bus.subscriber_count(), 0);

        // What fit in the mailbox is still readable.
        assert_eq!(receiver.try_iter().count(), 2);
    }

    #[test]
    fn disconnected_receivers_are_pruned_on_publish() {
        let bus = EventBus::default();
        let (id, receiver) = bus.subscribe(None);
        drop(receiver);
        bus.publish("e", json!({}));
        assert_eq!(bus.subscriber_count(), 0);
        assert!(!bus.unsubscribe(id));
    }

    #[test]
    fn unsubscribe_removes_the_mailbox() {
        let bus = EventBus::default();
        let (id, receiver) = bus.subscribe(None);
        assert!(bus.unsubscribe(id));
        bus.publish("e", json!({}));
        assert_eq!(receiver.try_iter().count(), 0);
    }
}
