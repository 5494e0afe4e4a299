// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cadence-core: frame-driven timers, timer groups and typed event channels

pub mod cross_thread;
pub mod error;
pub mod event;
pub mod group;
pub mod id;
pub mod manager;
pub mod timer;

pub use cross_thread::{CrossThreadEventChannel, EventSender};
pub use error::TimerError;
pub use event::{Event, EventChannel, EventDispatcher, EventKind, Listener, ListenerId};
pub use group::{TimerGroup, TimerGroupEvent};
pub use id::{GroupId, TimerId};
pub use manager::TimerManager;
pub use timer::{Timer, TimerConfig, TimerEvent, TimerSnapshot, TimerState, MAX_CATCH_UP};
