// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::event::{Event, EventDispatcher, EventKind, Listener};
use crate::timer::{TimerConfig, TimerEvent, TimerState};

fn running(interval: f64) -> Timer {
    Timer::from_config(&TimerConfig {
        interval,
        auto_start: true,
        ..TimerConfig::default()
    })
    .unwrap()
}

#[test]
fn new_manager_is_enabled_and_empty() {
    let manager = TimerManager::new();
    assert!(manager.is_enabled());
    assert_eq!(manager.time_scale(), 1.0);
    assert_eq!(manager.timer_count(), 0);
    assert_eq!(manager.group_count(), 0);
}

#[test]
fn add_and_remove_have_set_semantics() {
    let manager = TimerManager::new();
    let timer = running(1.0);

    assert!(manager.add(&timer));
    assert!(!manager.add(&timer.clone()));
    assert_eq!(manager.timer_count(), 1);
    assert!(manager.contains(&timer));

    assert!(manager.remove(&timer));
    assert!(!manager.remove(&timer));
    assert!(!manager.contains(&timer));
}

#[test]
fn removed_timer_keeps_its_state() {
    let manager = TimerManager::new();
    let timer = running(1.0);
    manager.add(&timer);
    manager.tick(1.0);
    manager.remove(&timer);

    manager.tick(1.0);
    assert!(timer.is_running());
    assert_eq!(timer.current_count(), 1);
}

#[test]
fn tick_reaches_standalone_timers_and_group_members() {
    let manager = TimerManager::new();
    let standalone = running(1.0);
    let member = running(0.5);
    manager.add(&standalone);
    let _group = TimerGroup::new(&manager, "G", false, [member.clone()]).unwrap();

    manager.tick(1.0);

    assert_eq!(standalone.current_count(), 1);
    assert_eq!(member.current_count(), 2);
}

#[test]
fn destroyed_group_members_stop_advancing() {
    let manager = TimerManager::new();
    let member = running(1.0);
    let group = TimerGroup::new(&manager, "G", false, [member.clone()]).unwrap();
    group.destroy();
    member.start();

    manager.tick(3.0);
    assert_eq!(member.current_count(), 0);
    assert_eq!(manager.group_count(), 0);
}

#[test]
fn disabled_manager_freezes_timers() {
    let manager = TimerManager::new();
    let timer = Timer::from_config(&TimerConfig {
        interval: 1.0,
        repeat_count: 3,
        ignore_time_scale: true,
        auto_start: false,
    })
    .unwrap();
    manager.add(&timer);
    timer.start();
    manager.tick(1.5);

    manager.set_enabled(false);
    let before = timer.snapshot();
    for _ in 0..10 {
        manager.tick(1.0);
    }
    assert_eq!(timer.snapshot(), before);
    assert_eq!(timer.state(), TimerState::Running);

    manager.set_enabled(true);
    manager.tick(0.5);
    assert_eq!(timer.current_count(), 2);
    assert_eq!(timer.elapsed(), 0.0);
}

#[yare::parameterized(
    half        = { 0.5, 1 },
    normal      = { 1.0, 2 },
    double      = { 2.0, 4 },
    frozen      = { 0.0, 0 },
    negative    = { -1.0, 0 },
    nan         = { f64::NAN, 0 },
)]
fn time_scale_multiplies_delta(scale: f64, expected: u32) {
    let manager = TimerManager::new();
    let timer = running(1.0);
    manager.add(&timer);
    manager.set_time_scale(scale);

    manager.tick(2.0);
    assert_eq!(timer.current_count(), expected);
}

#[test]
fn ignore_time_scale_uses_raw_delta() {
    let manager = TimerManager::new();
    let raw = Timer::from_config(&TimerConfig {
        interval: 1.0,
        ignore_time_scale: true,
        auto_start: true,
        ..TimerConfig::default()
    })
    .unwrap();
    manager.add(&raw);
    manager.set_time_scale(0.0);

    manager.tick(2.0);
    assert_eq!(raw.current_count(), 2);
}

#[test]
fn timer_added_by_listener_starts_next_tick() {
    let manager = TimerManager::new();
    let trigger = running(1.0);
    let spawned = running(1.0);
    manager.add(&trigger);

    let handle = manager.clone();
    let child = spawned.clone();
    let listener = Listener::new(move |_: &Event<TimerEvent>| {
        handle.add(&child);
    });
    trigger.add_event_listener(EventKind::TIMER, &listener);

    manager.tick(1.0);
    assert!(manager.contains(&spawned));
    assert_eq!(spawned.current_count(), 0);

    manager.tick(1.0);
    assert_eq!(spawned.current_count(), 1);
}

#[test]
fn listener_may_remove_its_own_timer() {
    let manager = TimerManager::new();
    let timer = running(1.0);
    manager.add(&timer);

    let handle = manager.clone();
    let listener = Listener::new(move |event: &Event<TimerEvent>| {
        handle.remove(&event.payload().timer);
    });
    timer.add_event_listener(EventKind::TIMER, &listener);

    manager.tick(1.0);
    assert!(!manager.contains(&timer));
    manager.tick(1.0);
    assert_eq!(timer.current_count(), 1);
}

#[test]
fn listener_may_destroy_group_during_tick() {
    let manager = TimerManager::new();
    let member = running(1.0);
    let group = TimerGroup::new(&manager, "G", false, [member.clone()]).unwrap();

    let target = group.clone();
    let listener = Listener::new(move |_: &Event<TimerEvent>| target.destroy());
    member.add_event_listener(EventKind::TIMER, &listener);

    manager.tick(1.0);
    assert!(group.is_destroyed());
    assert!(!manager.contains_group(&group));
    assert_eq!(member.state(), TimerState::Idle);
}

#[test]
fn clear_forgets_everything() {
    let manager = TimerManager::new();
    let timer = running(1.0);
    manager.add(&timer);
    let group = TimerGroup::new(&manager, "G", false, Vec::<Timer>::new()).unwrap();

    manager.clear();

    assert_eq!(manager.timer_count(), 0);
    assert_eq!(manager.group_count(), 0);
    assert!(timer.is_running());
    assert!(!group.is_destroyed());
}

#[test]
fn managers_are_independent() {
    let first = TimerManager::new();
    let second = TimerManager::new();
    let timer = running(1.0);
    first.add(&timer);
    second.set_enabled(false);

    first.tick(1.0);
    second.tick(1.0);

    assert!(!second.contains(&timer));
    assert_eq!(timer.current_count(), 1);
    assert!(first.is_enabled());
}

#[test]
fn timers_and_groups_listed_in_registration_order() {
    let manager = TimerManager::new();
    let (a, b) = (running(1.0), running(1.0));
    manager.add(&b);
    manager.add(&a);
    let g1 = TimerGroup::new(&manager, "one", false, Vec::<Timer>::new()).unwrap();
    let g2 = TimerGroup::new(&manager, "two", false, Vec::<Timer>::new()).unwrap();

    assert_eq!(manager.timers(), vec![b, a]);
    assert_eq!(manager.groups(), vec![g1, g2]);
}
