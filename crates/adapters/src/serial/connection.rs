// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial connection with a background reader thread

use super::{PacketCodec, SerialDriver, SerialError, SerialEvent, SerialSettings, SerialStream};
use cadence_core::{
    CrossThreadEventChannel, Event, EventChannel, EventDispatcher, EventKind, EventSender,
};
use std::fmt;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Extra time a worker thread gets to notice shutdown before it is detached
const JOIN_GRACE: Duration = Duration::from_millis(100);
const JOIN_POLL: Duration = Duration::from_millis(1);

/// One pending `send`, acknowledged by the writer thread
struct WriteRequest {
    bytes: Vec<u8>,
    done: mpsc::SyncSender<io::Result<()>>,
}

/// State that exists only while the port is open
struct Active {
    writes: mpsc::Sender<WriteRequest>,
    writer: JoinHandle<()>,
    running: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

/// A serial port whose incoming packets are delivered as events.
///
/// `open` starts one reader thread that decodes incoming bytes and queues
/// `serialData` events. Nothing is delivered until the owning thread calls
/// [`drain`](Self::drain), so listeners always run on that thread. Lifecycle
/// events (`serialOpen`, `serialClose`) go through the same queue and keep
/// their order relative to data.
///
/// All events carry a [`SerialEvent`] with the codec's packet type.
///
/// Writes run on a second thread so that `send` can give up after the
/// configured write timeout. `close` waits for both threads for about one
/// timeout; a thread stuck in a stream call that ignores timeouts is
/// detached and exits once that call returns.
pub struct SerialConnection<C: PacketCodec> {
    settings: SerialSettings,
    driver: Box<dyn SerialDriver>,
    codec: C,
    events: CrossThreadEventChannel,
    active: Option<Active>,
}

impl<C: PacketCodec> SerialConnection<C> {
    pub fn new(driver: impl SerialDriver, settings: SerialSettings, codec: C) -> Self {
        Self::with_events(driver, settings, codec, CrossThreadEventChannel::new())
    }

    /// Use a preconfigured channel, e.g. one with a capacity limit
    pub fn with_events(
        driver: impl SerialDriver,
        settings: SerialSettings,
        codec: C,
        events: CrossThreadEventChannel,
    ) -> Self {
        Self {
            settings,
            driver: Box::new(driver),
            codec,
            events,
            active: None,
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    pub fn port(&self) -> &str {
        &self.settings.port
    }

    pub fn is_open(&self) -> bool {
        self.active.is_some()
    }

    pub fn events(&self) -> &CrossThreadEventChannel {
        &self.events
    }

    /// Events queued by the reader and not yet drained
    pub fn pending(&self) -> usize {
        self.events.pending()
    }

    /// Deliver queued events to listeners on the calling thread.
    pub fn drain(&self) -> usize {
        self.events.drain()
    }

    /// Open the port and start the reader and writer. An open port is
    /// closed first.
    pub fn open(&mut self) -> Result<(), SerialError> {
        if self.is_open() {
            self.close();
        }
        let port = self.settings.port.clone();

        let stream = self.driver.open(&self.settings).map_err(|source| {
            tracing::warn!(port = %port, error = %source, "serial open failed");
            SerialError::Open {
                port: port.clone(),
                source,
            }
        })?;
        let reader_stream = stream.try_clone().map_err(|source| SerialError::Open {
            port: port.clone(),
            source,
        })?;

        let (writes, requests) = mpsc::channel::<WriteRequest>();
        let writer = thread::Builder::new()
            .name(format!("serial-writer:{port}"))
            .spawn(move || run_writer(stream, requests))
            .map_err(|source| SerialError::Spawn {
                port: port.clone(),
                source,
            })?;

        let running = Arc::new(AtomicBool::new(true));
        let (start_tx, start_rx) = mpsc::channel();
        let reader = {
            let reader = Reader {
                stream: reader_stream,
                codec: self.codec.clone(),
                sender: self.events.sender(),
                running: Arc::clone(&running),
                settings: self.settings.clone(),
            };
            thread::Builder::new()
                .name(format!("serial-reader:{port}"))
                .spawn(move || {
                    if start_rx.recv().is_ok() {
                        reader.run();
                    }
                })
                .map_err(|source| SerialError::Spawn {
                    port: port.clone(),
                    source,
                })?
        };

        // serialOpen is queued before the reader may queue any data
        self.events
            .publish_from_any_thread(Event::new(EventKind::SERIAL_OPEN, self.status_event()));
        let _ = start_tx.send(());

        self.active = Some(Active {
            writes,
            writer,
            running,
            reader,
        });
        tracing::info!(port = %port, baud_rate = self.settings.baud_rate, "serial port opened");
        Ok(())
    }

    /// Pack `message` and write it, waiting at most the write timeout (no
    /// limit when it is zero). An empty packing writes nothing.
    pub fn send(&mut self, message: &C::Message) -> Result<(), SerialError> {
        let Some(active) = self.active.as_ref() else {
            return Err(SerialError::NotOpen(self.settings.port.clone()));
        };
        let bytes = self.codec.pack(message);
        if bytes.is_empty() {
            return Ok(());
        }
        let len = bytes.len();
        if let Err(source) = write_within(&active.writes, bytes, self.settings.write_timeout) {
            tracing::warn!(port = %self.settings.port, error = %source, "serial write failed");
            return Err(SerialError::Write {
                port: self.settings.port.clone(),
                source,
            });
        }
        tracing::trace!(port = %self.settings.port, bytes = len, "serial write");
        Ok(())
    }

    /// Stop the reader and writer, release the port, and queue `serialClose`.
    /// No-op when not open.
    pub fn close(&mut self) {
        let Some(Active {
            writes,
            writer,
            running,
            reader,
        }) = self.active.take()
        else {
            return;
        };
        let port = self.settings.port.as_str();
        running.store(false, Ordering::Release);
        drop(writes);
        let settings = &self.settings;
        join_within(writer, settings.write_timeout.saturating_add(JOIN_GRACE), port, "writer");
        let read_limit = settings
            .read_timeout
            .saturating_add(settings.error_backoff)
            .saturating_add(JOIN_GRACE);
        join_within(reader, read_limit, port, "reader");

        self.events
            .publish_from_any_thread(Event::new(EventKind::SERIAL_CLOSE, self.status_event()));
        tracing::info!(port = %port, "serial port closed");
    }

    fn status_event(&self) -> SerialEvent<C::Packet> {
        SerialEvent {
            port: self.settings.port.clone(),
            packets: Vec::new(),
        }
    }
}

impl<C: PacketCodec> EventDispatcher for SerialConnection<C> {
    fn event_channel(&self) -> &EventChannel {
        self.events.channel()
    }
}

impl<C: PacketCodec> Drop for SerialConnection<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: PacketCodec> fmt::Debug for SerialConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialConnection")
            .field("port", &self.settings.port)
            .field("open", &self.is_open())
            .field("pending", &self.pending())
            .finish()
    }
}

/// Everything the reader thread owns
struct Reader<C> {
    stream: Box<dyn SerialStream>,
    codec: C,
    sender: EventSender,
    running: Arc<AtomicBool>,
    settings: SerialSettings,
}

impl<C: PacketCodec> Reader<C> {
    fn run(mut self) {
        let port = self.settings.port.clone();
        let mut buf = vec![0u8; self.settings.read_buffer_size.max(1)];
        tracing::debug!(port = %port, "serial reader started");

        while self.running.load(Ordering::Acquire) {
            match self.stream.read(&mut buf) {
                // EOF or a terminal read timeout
                Ok(0) => thread::sleep(self.settings.error_backoff),
                Ok(n) => {
                    let packets = self.codec.unpack(&buf[..n]);
                    // A detached reader must not publish after close
                    if packets.is_empty() || !self.running.load(Ordering::Acquire) {
                        continue;
                    }
                    tracing::trace!(port = %port, bytes = n, packets = packets.len(), "serial data");
                    self.sender.publish(Event::new(
                        EventKind::SERIAL_DATA,
                        SerialEvent {
                            port: port.clone(),
                            packets,
                        },
                    ));
                }
                Err(e) if is_timeout(&e) => {
                    tracing::debug!(port = %port, "serial read timed out");
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!(port = %port, error = %e, "serial read failed");
                    thread::sleep(self.settings.error_backoff);
                }
            }
        }
        tracing::debug!(port = %port, "serial reader stopped");
    }
}

fn run_writer(mut stream: Box<dyn SerialStream>, requests: mpsc::Receiver<WriteRequest>) {
    for request in requests {
        let result = stream
            .write_all(&request.bytes)
            .and_then(|()| stream.flush());
        // The sender may have timed out and gone
        let _ = request.done.send(result);
    }
}

fn write_within(
    writes: &mpsc::Sender<WriteRequest>,
    bytes: Vec<u8>,
    timeout: Duration,
) -> io::Result<()> {
    let stopped = || io::Error::new(io::ErrorKind::BrokenPipe, "serial writer stopped");
    let (done, ack) = mpsc::sync_channel(1);
    writes
        .send(WriteRequest { bytes, done })
        .map_err(|_| stopped())?;
    let result = if timeout.is_zero() {
        ack.recv().map_err(|_| stopped())
    } else {
        ack.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => {
                io::Error::new(io::ErrorKind::TimedOut, "serial write timed out")
            }
            mpsc::RecvTimeoutError::Disconnected => stopped(),
        })
    };
    result?
}

/// Join `handle` if it finishes within `limit`, otherwise detach it
fn join_within(handle: JoinHandle<()>, limit: Duration, port: &str, role: &str) {
    let deadline = Instant::now().checked_add(limit);
    while !handle.is_finished() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!(port = %port, thread = role, "serial thread still blocked, detaching");
            return;
        }
        thread::sleep(JOIN_POLL);
    }
    if handle.join().is_err() {
        tracing::error!(port = %port, thread = role, "serial thread panicked");
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
