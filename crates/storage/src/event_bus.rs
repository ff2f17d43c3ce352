// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded-fanout event bus.
//!
//! Every subscriber (typically one per open WebSocket connection) gets its
//! own bounded queue. A slow subscriber never backpressures the publisher
//! or other subscribers — once its queue is full, the oldest buffered
//! event is dropped to make room, and the subscriber's next poll sees a
//! `Lagged` marker so it knows to ask for a fresh `Snapshot`.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// Default per-subscriber queue depth before drop-oldest kicks in.
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    Snapshot { at: DateTime<Utc> },
    StateChanged { reason: String, at: DateTime<Utc> },
    AuthChanged { provider: String, at: DateTime<Utc> },
    OpenaiAccountSession { status: String, at: DateTime<Utc> },
    ProjectBuildLog { project_id: String, line: String },
    AutoConfigLog { chat_id: String, line: String },
    AgentCapabilitiesChanged { agent_type: String, at: DateTime<Utc> },
}

struct Subscriber {
    queue: VecDeque<HubEvent>,
    capacity: usize,
    lagged: bool,
}

impl Subscriber {
    fn push(&mut self, event: HubEvent) {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            self.lagged = true;
        }
        self.queue.push_back(event);
    }
}

/// A per-subscriber handle for draining queued events.
pub struct Subscription {
    id: u64,
    bus: EventBus,
}

impl Subscription {
    /// Drain everything currently queued, in order. Returns whether events
    /// were dropped since the last drain (the caller should re-fetch a full
    /// snapshot via the REST surface when this is `true`).
    pub fn drain(&self) -> (Vec<HubEvent>, bool) {
        let mut subs = self.bus.subscribers.lock();
        let Some(sub) = subs.get_mut(&self.id) else {
            return (Vec::new(), false);
        };
        let lagged = std::mem::take(&mut sub.lagged);
        (sub.queue.drain(..).collect(), lagged)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.subscribers.lock().remove(&self.id);
    }
}

/// Shared handle; clone freely, all clones see the same subscriber table.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
    next_id: Arc<Mutex<u64>>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_DEPTH)
    }
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { subscribers: Arc::new(Mutex::new(HashMap::new())), next_id: Arc::new(Mutex::new(0)), capacity }
    }

    pub fn subscribe(&self) -> Subscription {
        let mut next_id = self.next_id.lock();
        let id = *next_id;
        *next_id += 1;
        self.subscribers
            .lock()
            .insert(id, Subscriber { queue: VecDeque::new(), capacity: self.capacity, lagged: false });
        Subscription { id, bus: self.clone() }
    }

    pub fn publish(&self, event: HubEvent) {
        for sub in self.subscribers.lock().values_mut() {
            sub.push(event.clone());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "event_bus_tests.rs"]
mod tests;
