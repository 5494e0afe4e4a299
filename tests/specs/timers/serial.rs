//! Serial packets delivered between frames of a timer loop

use std::cell::RefCell;
use std::rc::Rc;

use cadence_adapters::{FakeSerialDriver, LineCodec, SerialConnection, SerialEvent, SerialSettings};
use cadence_core::{Event, EventDispatcher, EventKind, Listener, Timer, TimerManager};

use crate::prelude::wait_for;

#[test]
fn packets_and_ticks_run_on_the_frame_thread() {
    let driver = FakeSerialDriver::new();
    driver.push_read("temp=21\nhum=40\n");
    let mut conn = SerialConnection::new(
        driver.clone(),
        SerialSettings::new("/dev/fake0"),
        LineCodec::new(),
    );

    let frame_thread = std::thread::current().id();
    let log = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&log);
    let on_data = Listener::new(move |event: &Event<SerialEvent<String>>| {
        assert_eq!(std::thread::current().id(), frame_thread);
        sink.borrow_mut()
            .extend(event.payload().packets.iter().cloned());
    });
    conn.add_event_listener(EventKind::SERIAL_DATA, &on_data);

    let manager = TimerManager::new();
    let timer = Timer::new(0.5, 0).unwrap();
    timer.start();
    manager.add(&timer);
    let sink = Rc::clone(&log);
    let on_tick = Listener::new(move |_: &Event<cadence_core::TimerEvent>| {
        sink.borrow_mut().push("tick".to_string());
    });
    timer.add_event_listener(EventKind::TIMER, &on_tick);

    conn.open().unwrap();
    assert!(wait_for(|| driver.pending_reads() == 0 && conn.pending() >= 2));

    conn.drain();
    manager.tick(0.5);
    conn.close();

    assert_eq!(
        *log.borrow(),
        vec!["temp=21".to_string(), "hum=40".to_string(), "tick".to_string()]
    );
}

#[test]
fn replies_are_written_as_lines() {
    let driver = FakeSerialDriver::new();
    let mut conn = SerialConnection::new(
        driver.clone(),
        SerialSettings::new("/dev/fake1"),
        LineCodec::new(),
    );

    conn.open().unwrap();
    conn.send("ping").unwrap();
    conn.close();

    assert_eq!(driver.written(), b"ping\n".to_vec());
}

#[test]
fn lifecycle_events_bracket_the_session() {
    let driver = FakeSerialDriver::new();
    let mut conn = SerialConnection::new(
        driver,
        SerialSettings::new("/dev/fake2"),
        LineCodec::new(),
    );

    let kinds = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&kinds);
    let listener = Listener::new(move |event: &Event<SerialEvent<String>>| {
        sink.borrow_mut().push(event.kind().to_string());
    });
    conn.add_event_listener(EventKind::SERIAL_OPEN, &listener);
    conn.add_event_listener(EventKind::SERIAL_CLOSE, &listener);

    conn.open().unwrap();
    conn.close();
    conn.drain();

    assert_eq!(*kinds.borrow(), vec!["serialOpen", "serialClose"]);
}
