// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry that fans one frame tick out to every live timer.
//!
//! The manager is an explicit context object: the frame loop owns one and
//! hands clones of the handle to whatever creates timers and groups. Nothing
//! about it is global, so tests build as many independent managers as they
//! like.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::group::TimerGroup;
use crate::id::{GroupId, TimerId};
use crate::timer::Timer;

struct ManagerInner {
    enabled: Cell<bool>,
    time_scale: Cell<f64>,
    timers: RefCell<IndexMap<TimerId, Timer>>,
    groups: RefCell<IndexMap<GroupId, TimerGroup>>,
}

impl Default for ManagerInner {
    fn default() -> Self {
        Self {
            enabled: Cell::new(true),
            time_scale: Cell::new(1.0),
            timers: RefCell::new(IndexMap::new()),
            groups: RefCell::new(IndexMap::new()),
        }
    }
}

/// Handle to a timer registry. Clones share the same registry.
#[derive(Clone, Default)]
pub struct TimerManager {
    inner: Rc<ManagerInner>,
}

/// Non-owning manager handle held by groups, so the manager → group
/// ownership does not form a cycle.
#[derive(Clone)]
pub(crate) struct WeakTimerManager {
    inner: Weak<ManagerInner>,
}

impl WeakTimerManager {
    pub(crate) fn upgrade(&self) -> Option<TimerManager> {
        self.inner.upgrade().map(|inner| TimerManager { inner })
    }
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn downgrade(&self) -> WeakTimerManager {
        WeakTimerManager {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.get()
    }

    /// Globally pause (false) or resume (true) scheduling. Timer states are
    /// untouched; a disabled manager simply stops feeding them time.
    pub fn set_enabled(&self, enabled: bool) {
        if self.inner.enabled.replace(enabled) != enabled {
            tracing::debug!(enabled, "timer manager toggled");
        }
    }

    pub fn time_scale(&self) -> f64 {
        self.inner.time_scale.get()
    }

    /// Multiplier applied to each tick's delta for timers that do not ignore
    /// time scale. Negative or non-finite values are stored as 0.
    pub fn set_time_scale(&self, scale: f64) {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            0.0
        };
        self.inner.time_scale.set(scale);
    }

    /// Register a standalone timer. Returns false if already registered.
    pub fn add(&self, timer: &Timer) -> bool {
        let mut timers = self.inner.timers.borrow_mut();
        if timers.contains_key(timer.id()) {
            return false;
        }
        timers.insert(timer.id().clone(), timer.clone());
        true
    }

    /// Deregister a standalone timer. Its state is left as is.
    pub fn remove(&self, timer: &Timer) -> bool {
        self.inner
            .timers
            .borrow_mut()
            .shift_remove(timer.id())
            .is_some()
    }

    pub fn contains(&self, timer: &Timer) -> bool {
        self.inner.timers.borrow().contains_key(timer.id())
    }

    /// Register a group. Destroyed groups are refused.
    pub fn add_timer_group(&self, group: &TimerGroup) -> bool {
        if group.is_destroyed() {
            return false;
        }
        let mut groups = self.inner.groups.borrow_mut();
        if groups.contains_key(group.id()) {
            return false;
        }
        groups.insert(group.id().clone(), group.clone());
        true
    }

    pub fn remove_timer_group(&self, group: &TimerGroup) -> bool {
        self.inner
            .groups
            .borrow_mut()
            .shift_remove(group.id())
            .is_some()
    }

    pub fn contains_group(&self, group: &TimerGroup) -> bool {
        self.inner.groups.borrow().contains_key(group.id())
    }

    pub fn timer_count(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    pub fn group_count(&self) -> usize {
        self.inner.groups.borrow().len()
    }

    /// Standalone timers in registration order.
    pub fn timers(&self) -> Vec<Timer> {
        self.inner.timers.borrow().values().cloned().collect()
    }

    /// Groups in registration order.
    pub fn groups(&self) -> Vec<TimerGroup> {
        self.inner.groups.borrow().values().cloned().collect()
    }

    /// Forget every timer and group without changing their states.
    pub fn clear(&self) {
        self.inner.timers.borrow_mut().clear();
        self.inner.groups.borrow_mut().clear();
    }

    /// Advance every standalone timer and every group member by `delta`
    /// seconds. Does nothing while the manager is disabled.
    ///
    /// Membership is copied before dispatch, so timer listeners may add or
    /// remove timers and groups; changes apply from the next tick.
    pub fn tick(&self, delta: f64) {
        if !self.is_enabled() {
            return;
        }
        let time_scale = self.time_scale();
        let timers = self.timers();
        let groups = self.groups();

        for timer in &timers {
            timer.tick_scaled(delta, time_scale);
        }
        for group in &groups {
            group.tick(delta, time_scale);
        }
    }
}

impl fmt::Debug for TimerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerManager")
            .field("enabled", &self.is_enabled())
            .field("time_scale", &self.time_scale())
            .field("timers", &self.timer_count())
            .field("groups", &self.group_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
