//! Timers and groups driven frame by frame through a manager

use std::cell::RefCell;
use std::rc::Rc;

use cadence_core::{
    Event, EventDispatcher, EventKind, Listener, Timer, TimerConfig, TimerEvent, TimerGroup,
    TimerGroupEvent, TimerManager, TimerState,
};

fn record_counts(timer: &Timer, kind: EventKind) -> Rc<RefCell<Vec<u32>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let listener = Listener::new(move |event: &Event<TimerEvent>| {
        sink.borrow_mut().push(event.payload().current_count);
    });
    timer.add_event_listener(kind, &listener);
    seen
}

#[test]
fn repeating_timer_completes_after_its_count() {
    let manager = TimerManager::new();
    let timer = Timer::from_config(&TimerConfig {
        interval: 1.0,
        repeat_count: 3,
        auto_start: true,
        ..TimerConfig::default()
    })
    .unwrap();
    manager.add(&timer);
    let ticks = record_counts(&timer, EventKind::TIMER);
    let completions = record_counts(&timer, EventKind::TIMER_COMPLETE);

    for _ in 0..3 {
        manager.tick(1.0);
    }
    assert_eq!(*ticks.borrow(), vec![1, 2, 3]);
    assert_eq!(*completions.borrow(), vec![3]);

    manager.tick(1.0);
    assert_eq!(ticks.borrow().len(), 3);
    assert_eq!(completions.borrow().len(), 1);
    assert_eq!(timer.state(), TimerState::Completed);
}

#[test]
fn long_frame_catches_up_every_interval() {
    let manager = TimerManager::new();
    let timer = Timer::new(0.25, 0).unwrap();
    manager.add(&timer);
    timer.start();
    let ticks = record_counts(&timer, EventKind::TIMER);

    manager.tick(1.1);

    assert_eq!(*ticks.borrow(), vec![1, 2, 3, 4]);
    assert!((timer.elapsed() - 0.1).abs() < 1e-9);
}

#[test]
fn group_stop_is_one_event_for_any_size() {
    let manager = TimerManager::new();
    let members: Vec<Timer> = (0..2).map(|_| Timer::new(1.0, 0).unwrap()).collect();
    let group = TimerGroup::new(&manager, "G", true, members.clone()).unwrap();

    let stops = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&stops);
    let listener = Listener::new(move |_: &Event<TimerGroupEvent>| *sink.borrow_mut() += 1);
    group.add_event_listener(EventKind::GROUP_STOP, &listener);

    manager.tick(2.0);
    group.stop();

    assert_eq!(*stops.borrow(), 1);
    for timer in &members {
        assert_eq!(timer.state(), TimerState::Idle);
        assert_eq!(timer.current_count(), 2);
    }
}

#[test]
fn scaled_and_unscaled_timers_share_a_frame() {
    let manager = TimerManager::new();
    manager.set_time_scale(0.5);
    let scaled = Timer::new(1.0, 0).unwrap();
    let raw = Timer::from_config(&TimerConfig {
        interval: 1.0,
        ignore_time_scale: true,
        auto_start: true,
        ..TimerConfig::default()
    })
    .unwrap();
    scaled.start();
    manager.add(&scaled);
    manager.add(&raw);

    for _ in 0..4 {
        manager.tick(1.0);
    }

    assert_eq!(scaled.current_count(), 2);
    assert_eq!(raw.current_count(), 4);
}

#[test]
fn paused_group_resumes_where_it_left_off() {
    let manager = TimerManager::new();
    let timer = Timer::new(1.0, 0).unwrap();
    let group = TimerGroup::new(&manager, "sensors", true, [timer.clone()]).unwrap();

    manager.tick(0.6);
    group.pause();
    manager.tick(5.0);
    assert_eq!(timer.current_count(), 0);

    group.resume();
    manager.tick(0.4);
    assert_eq!(timer.current_count(), 1);
}
