// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timers and groups declared in the config, wired to one manager.

use std::collections::HashSet;

use cadence_core::{
    Event, EventDispatcher, EventKind, Listener, Timer, TimerEvent, TimerGroup, TimerGroupEvent,
    TimerManager,
};
use tracing::{debug, info};

use crate::config::{Config, ConfigError};

/// Everything the frame loop drives
pub struct Scene {
    manager: TimerManager,
    timers: Vec<(String, Timer)>,
    groups: Vec<TimerGroup>,
}

impl Scene {
    /// Build every declared timer and group.
    ///
    /// Timers named by at least one group are ticked through their groups;
    /// the rest are registered with the manager directly.
    pub fn build(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let manager = TimerManager::new();
        manager.set_time_scale(config.time_scale);

        let mut timers = Vec::with_capacity(config.timers.len());
        for decl in &config.timers {
            let timer =
                Timer::from_config(&decl.config).map_err(|source| ConfigError::InvalidTimer {
                    name: decl.name.clone(),
                    source,
                })?;
            log_timer_events(&decl.name, &timer);
            timers.push((decl.name.clone(), timer));
        }

        let scene_timers = |names: &[String]| -> Vec<Timer> {
            names
                .iter()
                .filter_map(|name| lookup(&timers, name).cloned())
                .collect()
        };
        let mut groups = Vec::with_capacity(config.groups.len());
        for decl in &config.groups {
            let group = TimerGroup::new(
                &manager,
                decl.name.as_str(),
                false,
                scene_timers(&decl.timers),
            )
            .map_err(|source| ConfigError::InvalidGroup {
                group: decl.name.clone(),
                source,
            })?;
            log_group_events(&group);
            if decl.auto_start {
                group.start();
            }
            groups.push(group);
        }

        let grouped: HashSet<&str> = config
            .groups
            .iter()
            .flat_map(|g| g.timers.iter().map(String::as_str))
            .collect();
        for (name, timer) in &timers {
            if !grouped.contains(name.as_str()) {
                manager.add(timer);
            }
        }

        info!(
            timers = timers.len(),
            groups = groups.len(),
            time_scale = manager.time_scale(),
            "scene built"
        );
        Ok(Self {
            manager,
            timers,
            groups,
        })
    }

    pub fn manager(&self) -> &TimerManager {
        &self.manager
    }

    #[cfg(test)]
    pub fn timer(&self, name: &str) -> Option<&Timer> {
        lookup(&self.timers, name)
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn groups(&self) -> &[TimerGroup] {
        &self.groups
    }

    /// Destroy every group, stop standalone timers, and log final counts
    pub fn shutdown(&self) {
        for group in &self.groups {
            group.destroy();
        }
        for (name, timer) in &self.timers {
            timer.stop();
            debug!(timer = %name, count = timer.current_count(), state = %timer.state(), "final state");
        }
        self.manager.clear();
    }
}

fn lookup<'a>(timers: &'a [(String, Timer)], name: &str) -> Option<&'a Timer> {
    timers.iter().find(|(n, _)| n == name).map(|(_, t)| t)
}

fn log_timer_events(name: &str, timer: &Timer) {
    let tick_name = name.to_string();
    let on_tick = Listener::new(move |event: &Event<TimerEvent>| {
        debug!(timer = %tick_name, count = event.payload().current_count, "timer tick");
    });
    let done_name = name.to_string();
    let on_complete = Listener::new(move |event: &Event<TimerEvent>| {
        info!(timer = %done_name, count = event.payload().current_count, "timer complete");
    });
    timer.add_event_listener(EventKind::TIMER, &on_tick);
    timer.add_event_listener(EventKind::TIMER_COMPLETE, &on_complete);
}

fn log_group_events(group: &TimerGroup) {
    let on_event = Listener::new(|event: &Event<TimerGroupEvent>| {
        let group = &event.payload().group;
        info!(group = group.name(), kind = %event.kind(), timers = group.len(), "group event");
    });
    for kind in [
        EventKind::GROUP_START,
        EventKind::GROUP_PAUSE,
        EventKind::GROUP_RESUME,
        EventKind::GROUP_STOP,
        EventKind::GROUP_RESET,
    ] {
        group.add_event_listener(kind, &on_event);
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
