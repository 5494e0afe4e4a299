// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Countdown timers driven by externally supplied time deltas.
//!
//! A [`Timer`] has no clock of its own. Whoever owns it (a [`TimerGroup`] or
//! the [`TimerManager`]) feeds it elapsed seconds through `tick`, and every
//! completed interval raises a `timer` event on the timer's own channel. A
//! timer with a non-zero repeat count raises `timerComplete` after its last
//! interval and stops advancing.
//!
//! [`TimerGroup`]: crate::group::TimerGroup
//! [`TimerManager`]: crate::manager::TimerManager

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::TimerError;
use crate::event::{Event, EventChannel, EventDispatcher, EventKind};
use crate::id::TimerId;

/// Most intervals a single `tick` catches up on. A longer backlog keeps
/// only the newest intervals.
pub const MAX_CATCH_UP: u32 = 100_000;

/// Lifecycle state of a timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerState::Idle => "idle",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
        };
        f.write_str(s)
    }
}

/// Construction parameters for a timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Seconds per interval.
    pub interval: f64,
    /// Intervals to run before completing; 0 repeats forever.
    pub repeat_count: u32,
    /// Advance by the raw frame delta, ignoring the manager's time scale.
    pub ignore_time_scale: bool,
    /// Start immediately after construction.
    pub auto_start: bool,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            interval: 1.0,
            repeat_count: 0,
            ignore_time_scale: false,
            auto_start: false,
        }
    }
}

/// Payload of `timer` and `timerComplete` events.
#[derive(Debug, Clone)]
pub struct TimerEvent {
    /// The timer that raised the event.
    pub timer: Timer,
    /// The timer's count at the moment the event was raised.
    pub current_count: u32,
}

/// Point-in-time copy of a timer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub current_count: u32,
    pub elapsed: f64,
}

struct TimerInner {
    id: TimerId,
    interval: f64,
    repeat_count: u32,
    ignore_time_scale: bool,
    state: Cell<TimerState>,
    current_count: Cell<u32>,
    elapsed: Cell<f64>,
    events: EventChannel,
}

/// Handle to a timer.
///
/// Clones share the same timer; equality and hashing follow [`TimerId`].
/// Timers are single-threaded: all calls must come from the thread that
/// drives the frame loop.
#[derive(Clone)]
pub struct Timer {
    inner: Rc<TimerInner>,
}

impl Timer {
    /// Create an idle timer.
    ///
    /// Fails with [`TimerError::InvalidInterval`] unless `interval` is a
    /// finite number greater than zero.
    pub fn new(interval: f64, repeat_count: u32) -> Result<Self, TimerError> {
        Self::from_config(&TimerConfig {
            interval,
            repeat_count,
            ..TimerConfig::default()
        })
    }

    pub fn from_config(config: &TimerConfig) -> Result<Self, TimerError> {
        if !config.interval.is_finite() || config.interval <= 0.0 {
            return Err(TimerError::InvalidInterval(config.interval));
        }

        let timer = Self {
            inner: Rc::new(TimerInner {
                id: TimerId::generate(),
                interval: config.interval,
                repeat_count: config.repeat_count,
                ignore_time_scale: config.ignore_time_scale,
                state: Cell::new(TimerState::Idle),
                current_count: Cell::new(0),
                elapsed: Cell::new(0.0),
                events: EventChannel::new(),
            }),
        };
        if config.auto_start {
            timer.start();
        }
        Ok(timer)
    }

    pub fn id(&self) -> &TimerId {
        &self.inner.id
    }

    pub fn interval(&self) -> f64 {
        self.inner.interval
    }

    pub fn repeat_count(&self) -> u32 {
        self.inner.repeat_count
    }

    pub fn ignore_time_scale(&self) -> bool {
        self.inner.ignore_time_scale
    }

    pub fn state(&self) -> TimerState {
        self.inner.state.get()
    }

    pub fn current_count(&self) -> u32 {
        self.inner.current_count.get()
    }

    /// Seconds accumulated towards the current interval.
    pub fn elapsed(&self) -> f64 {
        self.inner.elapsed.get()
    }

    pub fn is_running(&self) -> bool {
        self.state() == TimerState::Running
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            state: self.state(),
            current_count: self.current_count(),
            elapsed: self.elapsed(),
        }
    }

    /// Idle → Running. No-op in any other state.
    pub fn start(&self) {
        self.transition(TimerState::Idle, TimerState::Running);
    }

    /// Running → Paused. No-op in any other state.
    pub fn pause(&self) {
        self.transition(TimerState::Running, TimerState::Paused);
    }

    /// Paused → Running. No-op in any other state.
    pub fn resume(&self) {
        self.transition(TimerState::Paused, TimerState::Running);
    }

    /// Running or Paused → Idle. Clears elapsed time but keeps the count, so
    /// a later `start` continues counting where this run left off.
    pub fn stop(&self) {
        match self.state() {
            TimerState::Running | TimerState::Paused => {
                self.inner.elapsed.set(0.0);
                self.set_state(TimerState::Idle);
            }
            TimerState::Idle | TimerState::Completed => {}
        }
    }

    /// Any state → Idle, clearing both elapsed time and count.
    pub fn reset(&self) {
        self.inner.elapsed.set(0.0);
        self.inner.current_count.set(0);
        self.set_state(TimerState::Idle);
    }

    /// Advance by `delta` seconds. Only a running timer advances; negative
    /// and non-finite deltas count as zero.
    ///
    /// A delta spanning several intervals raises one `timer` event per
    /// interval, in order, before returning. Listeners may stop, pause or
    /// reset the timer from inside those events; catch-up ends as soon as the
    /// timer is no longer running. A backlog longer than [`MAX_CATCH_UP`]
    /// intervals is cut to that many. Returns the number of intervals completed.
    pub fn tick(&self, delta: f64) -> u32 {
        if !self.is_running() {
            return 0;
        }
        let delta = if delta.is_finite() && delta > 0.0 {
            delta
        } else {
            0.0
        };

        let inner = &self.inner;
        inner.elapsed.set(self.bounded_elapsed(inner.elapsed.get() + delta));

        let mut fired = 0;
        while self.is_running() && inner.elapsed.get() >= inner.interval {
            inner.elapsed.set(inner.elapsed.get() - inner.interval);
            let count = inner.current_count.get().saturating_add(1);
            inner.current_count.set(count);
            fired += 1;

            self.emit(EventKind::TIMER, count);

            if self.is_running() && self.reached_repeat_count() {
                inner.elapsed.set(0.0);
                self.set_state(TimerState::Completed);
                self.emit(EventKind::TIMER_COMPLETE, self.current_count());
            }
        }
        fired
    }

    /// Cap the backlog at [`MAX_CATCH_UP`] intervals. Whole intervals beyond
    /// the cap are dropped; the fraction of the current interval is kept.
    fn bounded_elapsed(&self, elapsed: f64) -> f64 {
        let interval = self.inner.interval;
        let owed = elapsed / interval;
        if owed.is_finite() && owed <= f64::from(MAX_CATCH_UP) {
            return elapsed;
        }
        let fraction = if elapsed.is_finite() {
            elapsed.rem_euclid(interval)
        } else {
            0.0
        };
        tracing::warn!(
            timer_id = self.inner.id.short(8),
            owed,
            kept = MAX_CATCH_UP,
            "timer fell behind, dropping intervals"
        );
        (fraction + f64::from(MAX_CATCH_UP) * interval).min(f64::MAX)
    }

    /// Advance using the owner's time scale unless this timer ignores it.
    pub(crate) fn tick_scaled(&self, delta: f64, time_scale: f64) -> u32 {
        if self.inner.ignore_time_scale {
            self.tick(delta)
        } else {
            self.tick(delta * time_scale)
        }
    }

    fn reached_repeat_count(&self) -> bool {
        self.inner.repeat_count > 0 && self.current_count() >= self.inner.repeat_count
    }

    fn transition(&self, from: TimerState, to: TimerState) {
        if self.state() == from {
            self.set_state(to);
        }
    }

    fn set_state(&self, state: TimerState) {
        let previous = self.inner.state.replace(state);
        if previous != state {
            tracing::trace!(
                timer_id = self.inner.id.short(8),
                from = %previous,
                to = %state,
                count = self.current_count(),
                "timer state changed"
            );
        }
    }

    fn emit(&self, kind: EventKind, current_count: u32) {
        let event = Event::new(
            kind,
            TimerEvent {
                timer: self.clone(),
                current_count,
            },
        );
        self.inner.events.publish(&event);
    }
}

impl EventDispatcher for Timer {
    fn event_channel(&self) -> &EventChannel {
        &self.inner.events
    }
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Timer {}

impl Hash for Timer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("id", &self.inner.id)
            .field("interval", &self.inner.interval)
            .field("repeat_count", &self.inner.repeat_count)
            .field("state", &self.state())
            .field("current_count", &self.current_count())
            .field("elapsed", &self.elapsed())
            .finish()
    }
}

#[cfg(test)]
#[path = "timer_tests.rs"]
mod tests;
