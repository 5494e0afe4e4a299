// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-thread event delivery.
//!
//! Producer threads hold an [`EventSender`] and enqueue events without
//! waiting for delivery. The thread that owns the [`CrossThreadEventChannel`]
//! calls [`CrossThreadEventChannel::drain`] (typically once per frame), which
//! dispatches everything queued so far, in FIFO order, through the wrapped
//! [`EventChannel`]. Listeners therefore always run on the owning thread.
//!
//! The queue is unbounded unless a capacity limit is set, in which case the
//! oldest pending event is dropped to make room and a warning is logged.
//! Producers never block on and never fail because of the queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::event::{Event, EventChannel, EventDispatcher, EventKind, Listener, ListenerId};

/// A queued event, type-erased until it is dispatched on the owning thread.
struct Pending {
    kind: EventKind,
    deliver: Box<dyn FnOnce(&EventChannel) -> usize + Send>,
}

#[derive(Default)]
struct Queue {
    events: VecDeque<Pending>,
    limit: Option<usize>,
    dropped: u64,
}

impl Queue {
    /// Push one event, evicting from the front when over the limit.
    /// Returns the kinds that were evicted.
    fn push(&mut self, pending: Pending) -> Vec<EventKind> {
        let mut evicted = Vec::new();
        if let Some(limit) = self.limit {
            while self.events.len() >= limit {
                match self.events.pop_front() {
                    Some(old) => {
                        self.dropped += 1;
                        evicted.push(old.kind);
                    }
                    None => break,
                }
            }
        }
        self.events.push_back(pending);
        evicted
    }
}

/// Thread-safe producer handle for a [`CrossThreadEventChannel`].
///
/// Cheap to clone; each clone feeds the same queue. Events from one sender
/// keep their order. There is no ordering guarantee between senders on
/// different threads.
#[derive(Clone)]
pub struct EventSender {
    queue: Arc<Mutex<Queue>>,
}

impl EventSender {
    /// Enqueue `event` for delivery on the next `drain`. Never blocks on delivery.
    pub fn publish<P: Send + 'static>(&self, event: Event<P>) {
        let kind = event.kind().clone();
        let pending = Pending {
            kind: kind.clone(),
            deliver: Box::new(move |channel: &EventChannel| channel.publish(&event)),
        };

        let (evicted, dropped_total) = {
            let mut queue = self.queue.lock();
            let evicted = queue.push(pending);
            (evicted, queue.dropped)
        };

        for old in evicted {
            tracing::warn!(
                dropped = %old,
                incoming = %kind,
                dropped_total,
                "cross-thread event queue full, dropped oldest event"
            );
        }
    }

    /// Number of events waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.queue.lock().events.len()
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Event channel whose events may be produced on any thread but are
/// dispatched on the thread that owns it.
#[derive(Default)]
pub struct CrossThreadEventChannel {
    channel: EventChannel,
    queue: Arc<Mutex<Queue>>,
}

impl CrossThreadEventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the queue to `limit` pending events (minimum 1). When full, the
    /// oldest pending event is dropped.
    pub fn with_capacity_limit(limit: usize) -> Self {
        let channel = Self::new();
        channel.queue.lock().limit = Some(limit.max(1));
        channel
    }

    /// Producer handle that may be moved to other threads.
    pub fn sender(&self) -> EventSender {
        EventSender {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Enqueue an event from the owning thread. Delivery still waits for `drain`.
    pub fn publish_from_any_thread<P: Send + 'static>(&self, event: Event<P>) {
        self.sender().publish(event);
    }

    /// Dispatch every event queued before this call, in FIFO order.
    ///
    /// The queue is swapped out under the lock first, so producers are never
    /// blocked by listener work, and events enqueued by listeners (or by other
    /// threads) during the drain are delivered on the next one. Returns the
    /// number of events dispatched.
    pub fn drain(&self) -> usize {
        let batch = std::mem::take(&mut self.queue.lock().events);
        let count = batch.len();
        for pending in batch {
            let delivered = (pending.deliver)(&self.channel);
            tracing::trace!(kind = %pending.kind, delivered, "drained event");
        }
        count
    }

    /// Number of events waiting for the next drain.
    pub fn pending(&self) -> usize {
        self.queue.lock().events.len()
    }

    /// Total events dropped because the queue was at its capacity limit.
    pub fn dropped(&self) -> u64 {
        self.queue.lock().dropped
    }

    pub fn subscribe<P: 'static>(
        &self,
        kind: impl Into<EventKind>,
        listener: &Listener<P>,
    ) -> ListenerId {
        self.channel.subscribe(kind, listener)
    }

    pub fn unsubscribe<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.channel.unsubscribe(kind, listener)
    }

    pub fn has_subscriber<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.channel.has_subscriber(kind, listener)
    }

    pub fn channel(&self) -> &EventChannel {
        &self.channel
    }
}

impl EventDispatcher for CrossThreadEventChannel {
    fn event_channel(&self) -> &EventChannel {
        &self.channel
    }
}

impl fmt::Debug for CrossThreadEventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossThreadEventChannel")
            .field("channel", &self.channel)
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
#[path = "cross_thread_tests.rs"]
mod tests;
