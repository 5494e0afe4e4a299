// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named groups of timers controlled as a unit.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::TimerError;
use crate::event::{Event, EventChannel, EventDispatcher, EventKind};
use crate::id::{GroupId, TimerId};
use crate::manager::{TimerManager, WeakTimerManager};
use crate::timer::Timer;

/// Payload of the group lifecycle events (`groupStart`, `groupStop`, ...).
#[derive(Debug, Clone)]
pub struct TimerGroupEvent {
    pub group: TimerGroup,
}

struct GroupInner {
    id: GroupId,
    name: String,
    timers: RefCell<IndexMap<TimerId, Timer>>,
    destroyed: Cell<bool>,
    events: EventChannel,
    manager: WeakTimerManager,
}

/// Handle to a named, duplicate-free set of timers.
///
/// Group commands apply the matching timer transition to every member and
/// then raise exactly one group event, however many members there are.
/// After [`TimerGroup::destroy`] the group holds no timers and every
/// membership or command call is a no-op.
#[derive(Clone)]
pub struct TimerGroup {
    inner: Rc<GroupInner>,
}

impl TimerGroup {
    /// Create a group and register it with `manager`.
    ///
    /// Fails with [`TimerError::EmptyGroupName`] if `name` is empty or only
    /// whitespace; nothing is registered in that case.
    pub fn new(
        manager: &TimerManager,
        name: impl Into<String>,
        auto_start: bool,
        timers: impl IntoIterator<Item = Timer>,
    ) -> Result<Self, TimerError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(TimerError::EmptyGroupName);
        }

        let group = Self {
            inner: Rc::new(GroupInner {
                id: GroupId::generate(),
                name,
                timers: RefCell::new(IndexMap::new()),
                destroyed: Cell::new(false),
                events: EventChannel::new(),
                manager: manager.downgrade(),
            }),
        };
        group.add_timers(timers);
        manager.add_timer_group(&group);
        tracing::debug!(group = %group.inner.name, timers = group.len(), "timer group created");

        if auto_start {
            group.start();
        }
        Ok(group)
    }

    pub fn id(&self) -> &GroupId {
        &self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    pub fn len(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.timers.borrow().is_empty()
    }

    /// Members in insertion order.
    pub fn timers(&self) -> Vec<Timer> {
        self.inner.timers.borrow().values().cloned().collect()
    }

    pub fn contains_timer(&self, timer: &Timer) -> bool {
        self.inner.timers.borrow().contains_key(timer.id())
    }

    /// Add `timer` unless it is already a member. With `auto_start`, a newly
    /// added timer is started; existing members are left alone.
    /// Returns whether the timer was added.
    pub fn add_timer(&self, timer: Timer, auto_start: bool) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let added = self.insert(timer.clone());
        if added && auto_start {
            timer.start();
        }
        added
    }

    /// Add every timer not already a member.
    pub fn add_timers(&self, timers: impl IntoIterator<Item = Timer>) {
        if self.is_destroyed() {
            return;
        }
        for timer in timers {
            self.insert(timer);
        }
    }

    /// Remove `timer`, stopping it when `auto_stop` is set.
    /// Returns whether it was a member.
    pub fn remove_timer(&self, timer: &Timer, auto_stop: bool) -> bool {
        let removed = self
            .inner
            .timers
            .borrow_mut()
            .shift_remove(timer.id())
            .is_some();
        if removed && auto_stop {
            timer.stop();
        }
        removed
    }

    /// Remove every member. With `auto_stop`, the group is stopped first
    /// (raising `groupStop`).
    pub fn remove_all_timers(&self, auto_stop: bool) {
        if self.is_destroyed() {
            return;
        }
        if auto_stop {
            self.stop();
        }
        self.inner.timers.borrow_mut().clear();
    }

    pub fn start(&self) {
        self.command(EventKind::GROUP_START, Timer::start);
    }

    pub fn pause(&self) {
        self.command(EventKind::GROUP_PAUSE, Timer::pause);
    }

    pub fn resume(&self) {
        self.command(EventKind::GROUP_RESUME, Timer::resume);
    }

    pub fn stop(&self) {
        self.command(EventKind::GROUP_STOP, Timer::stop);
    }

    pub fn reset(&self) {
        self.command(EventKind::GROUP_RESET, Timer::reset);
    }

    /// Stop all members, drop them, and deregister from the manager.
    pub fn destroy(&self) {
        if self.is_destroyed() {
            return;
        }
        self.stop();
        self.remove_all_timers(false);
        self.inner.destroyed.set(true);
        if let Some(manager) = self.inner.manager.upgrade() {
            manager.remove_timer_group(self);
        }
        tracing::debug!(group = %self.inner.name, "timer group destroyed");
    }

    /// Advance every member.
    pub(crate) fn tick(&self, delta: f64, time_scale: f64) {
        for timer in self.timers() {
            timer.tick_scaled(delta, time_scale);
        }
    }

    fn insert(&self, timer: Timer) -> bool {
        let mut timers = self.inner.timers.borrow_mut();
        if timers.contains_key(timer.id()) {
            return false;
        }
        timers.insert(timer.id().clone(), timer);
        true
    }

    fn command(&self, kind: EventKind, apply: fn(&Timer)) {
        if self.is_destroyed() {
            return;
        }
        // Members are copied out so listeners may change membership.
        for timer in self.timers() {
            apply(&timer);
        }
        tracing::trace!(group = %self.inner.name, %kind, members = self.len(), "group command");
        let event = Event::new(kind, TimerGroupEvent { group: self.clone() });
        self.inner.events.publish(&event);
    }
}

impl EventDispatcher for TimerGroup {
    fn event_channel(&self) -> &EventChannel {
        &self.inner.events
    }
}

impl PartialEq for TimerGroup {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for TimerGroup {}

impl fmt::Debug for TimerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerGroup")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("timers", &self.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
