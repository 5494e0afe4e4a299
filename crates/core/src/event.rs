// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed publish/subscribe channel.
//!
//! Listeners register for an `(EventKind, payload type)` pair. Two payload
//! types may share a kind string without seeing each other's events.
//!
//! All methods take `&self`. Interior state is never borrowed while a listener
//! runs, so listeners may subscribe, unsubscribe, or publish during dispatch.
//! Each `publish` works from a snapshot of the registrations taken when it
//! starts: a listener added during dispatch first hears the next publish, and
//! a listener removed during dispatch still hears the current one.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

/// Name of a category of events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKind(Cow<'static, str>);

impl EventKind {
    /// A timer completed one interval.
    pub const TIMER: EventKind = EventKind::from_static("timer");
    /// A timer reached its repeat count.
    pub const TIMER_COMPLETE: EventKind = EventKind::from_static("timerComplete");
    pub const GROUP_START: EventKind = EventKind::from_static("groupStart");
    pub const GROUP_PAUSE: EventKind = EventKind::from_static("groupPause");
    pub const GROUP_RESUME: EventKind = EventKind::from_static("groupResume");
    pub const GROUP_STOP: EventKind = EventKind::from_static("groupStop");
    pub const GROUP_RESET: EventKind = EventKind::from_static("groupReset");
    pub const SERIAL_OPEN: EventKind = EventKind::from_static("serialOpen");
    pub const SERIAL_CLOSE: EventKind = EventKind::from_static("serialClose");
    pub const SERIAL_DATA: EventKind = EventKind::from_static("serialData");

    pub fn new(kind: impl Into<String>) -> Self {
        Self(Cow::Owned(kind.into()))
    }

    pub const fn from_static(kind: &'static str) -> Self {
        Self(Cow::Borrowed(kind))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for EventKind {
    fn from(s: &'static str) -> Self {
        Self::from_static(s)
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for EventKind {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EventKind {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for EventKind {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// An immutable event: a kind plus a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<P> {
    kind: EventKind,
    payload: P,
}

impl<P> Event<P> {
    pub fn new(kind: impl Into<EventKind>, payload: P) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

/// A registered callback.
///
/// Cloning a listener yields the same listener: registration identity is the
/// identity of the underlying closure, so subscribing a clone again for the
/// same kind is a no-op.
pub struct Listener<P>(Rc<dyn Fn(&Event<P>)>);

impl<P: 'static> Listener<P> {
    pub fn new(f: impl Fn(&Event<P>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// True when both handles wrap the same closure.
    pub fn same_as(&self, other: &Listener<P>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<P> Clone for Listener<P> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<P> fmt::Debug for Listener<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Token returned by `subscribe`, accepted by `unsubscribe_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    /// Always a `Listener<P>` for the `TypeId` this registration is filed under.
    listener: Box<dyn Any>,
}

impl Registration {
    fn listener<P: 'static>(&self) -> Option<&Listener<P>> {
        self.listener.downcast_ref::<Listener<P>>()
    }
}

type Registry = HashMap<TypeId, HashMap<EventKind, Vec<Registration>>>;

/// Single-threaded typed event channel.
#[derive(Default)]
pub struct EventChannel {
    registry: RefCell<Registry>,
    next_id: Cell<u64>,
}

impl EventChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind` carrying payload `P`.
    ///
    /// Registering the same listener twice for the same key keeps a single
    /// registration and returns its original id.
    pub fn subscribe<P: 'static>(
        &self,
        kind: impl Into<EventKind>,
        listener: &Listener<P>,
    ) -> ListenerId {
        let kind = kind.into();
        let mut registry = self.registry.borrow_mut();
        let registrations = registry
            .entry(TypeId::of::<P>())
            .or_default()
            .entry(kind)
            .or_default();

        if let Some(existing) = registrations
            .iter()
            .find(|r| r.listener::<P>().is_some_and(|l| l.same_as(listener)))
        {
            return existing.id;
        }

        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        registrations.push(Registration {
            id,
            listener: Box::new(listener.clone()),
        });
        id
    }

    /// Remove `listener` from `kind`. Returns false if it was not registered.
    pub fn unsubscribe<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.remove_where::<P>(kind, |r| r.listener::<P>().is_some_and(|l| l.same_as(listener)))
    }

    /// Remove the registration identified by `id`, whatever its kind or payload type.
    pub fn unsubscribe_id(&self, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        for by_kind in registry.values_mut() {
            for registrations in by_kind.values_mut() {
                if let Some(pos) = registrations.iter().position(|r| r.id == id) {
                    registrations.remove(pos);
                    return true;
                }
            }
        }
        false
    }

    pub fn has_subscriber<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.registry
            .borrow()
            .get(&TypeId::of::<P>())
            .and_then(|by_kind| by_kind.get(kind))
            .is_some_and(|registrations| {
                registrations
                    .iter()
                    .any(|r| r.listener::<P>().is_some_and(|l| l.same_as(listener)))
            })
    }

    /// Number of listeners registered for `kind` with payload `P`.
    pub fn listener_count<P: 'static>(&self, kind: &str) -> usize {
        self.registry
            .borrow()
            .get(&TypeId::of::<P>())
            .and_then(|by_kind| by_kind.get(kind))
            .map_or(0, Vec::len)
    }

    /// True when no listener of any kind is registered.
    pub fn is_empty(&self) -> bool {
        self.registry
            .borrow()
            .values()
            .all(|by_kind| by_kind.values().all(Vec::is_empty))
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.registry.borrow_mut().clear();
    }

    /// Deliver `event` to every listener registered for its kind and payload
    /// type, in registration order.
    ///
    /// A panicking listener is logged and skipped; the remaining listeners
    /// still run and the panic does not reach the caller. Returns the number
    /// of listeners that completed without panicking.
    pub fn publish<P: 'static>(&self, event: &Event<P>) -> usize {
        let snapshot: Vec<Listener<P>> = {
            let registry = self.registry.borrow();
            match registry
                .get(&TypeId::of::<P>())
                .and_then(|by_kind| by_kind.get(event.kind.as_str()))
            {
                Some(registrations) => registrations
                    .iter()
                    .filter_map(|r| r.listener::<P>().cloned())
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for listener in snapshot {
            match panic::catch_unwind(AssertUnwindSafe(|| (listener.0)(event))) {
                Ok(()) => delivered += 1,
                Err(cause) => {
                    tracing::error!(
                        kind = %event.kind,
                        listener = ?listener,
                        cause = panic_message(cause.as_ref()),
                        "event listener panicked"
                    );
                }
            }
        }
        delivered
    }

    fn remove_where<P: 'static>(&self, kind: &str, pred: impl Fn(&Registration) -> bool) -> bool {
        let mut registry = self.registry.borrow_mut();
        let Some(registrations) = registry
            .get_mut(&TypeId::of::<P>())
            .and_then(|by_kind| by_kind.get_mut(kind))
        else {
            return false;
        };
        match registrations.iter().position(pred) {
            Some(pos) => {
                registrations.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry.borrow();
        let listeners: usize = registry
            .values()
            .flat_map(|by_kind| by_kind.values())
            .map(Vec::len)
            .sum();
        f.debug_struct("EventChannel")
            .field("listeners", &listeners)
            .finish()
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    if let Some(s) = cause.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = cause.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Types that own an [`EventChannel`] and let callers listen on it.
///
/// Timers, timer groups and cross-thread channels all implement this, so
/// listener management reads the same everywhere.
pub trait EventDispatcher {
    fn event_channel(&self) -> &EventChannel;

    fn add_event_listener<P: 'static>(
        &self,
        kind: impl Into<EventKind>,
        listener: &Listener<P>,
    ) -> ListenerId {
        self.event_channel().subscribe(kind, listener)
    }

    fn remove_event_listener<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.event_channel().unsubscribe(kind, listener)
    }

    fn has_event_listener<P: 'static>(&self, kind: &str, listener: &Listener<P>) -> bool {
        self.event_channel().has_subscriber(kind, listener)
    }

    fn dispatch_event<P: 'static>(&self, event: &Event<P>) -> usize {
        self.event_channel().publish(event)
    }
}

impl EventDispatcher for EventChannel {
    fn event_channel(&self) -> &EventChannel {
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
