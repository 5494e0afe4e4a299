// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake serial driver for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SerialDriver, SerialSettings, SerialStream};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Longest a fake read waits before reporting a timeout
const MAX_IDLE_WAIT: Duration = Duration::from_millis(5);
/// Poll period while the device is stalled
const STALL_POLL: Duration = Duration::from_millis(1);

enum Scripted {
    Data(Vec<u8>),
    Error(io::ErrorKind),
}

#[derive(Default)]
struct FakeSerialState {
    reads: VecDeque<Scripted>,
    written: Vec<u8>,
    opened: Vec<SerialSettings>,
    open_error: Option<io::ErrorKind>,
    write_error: Option<io::ErrorKind>,
    stalled: bool,
}

/// Fake serial driver for testing.
///
/// Every stream it opens shares one scripted device: queued reads are
/// returned in order, writes are recorded. With nothing queued, reads
/// time out quickly the way a real port does.
#[derive(Clone, Default)]
pub struct FakeSerialDriver {
    inner: Arc<Mutex<FakeSerialState>>,
}

impl FakeSerialDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the reader to receive
    pub fn push_read(&self, bytes: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .reads
            .push_back(Scripted::Data(bytes.into()));
    }

    /// Queue a read failure
    pub fn push_read_error(&self, kind: io::ErrorKind) {
        self.inner.lock().reads.push_back(Scripted::Error(kind));
    }

    /// Scripted reads not yet consumed
    pub fn pending_reads(&self) -> usize {
        self.inner.lock().reads.len()
    }

    /// Make every following `open` fail
    pub fn fail_open(&self, kind: Option<io::ErrorKind>) {
        self.inner.lock().open_error = kind;
    }

    /// Make every following write fail
    pub fn fail_writes(&self, kind: Option<io::ErrorKind>) {
        self.inner.lock().write_error = kind;
    }

    /// While stalled, reads and writes block and ignore every timeout
    pub fn stall(&self, stalled: bool) {
        self.inner.lock().stalled = stalled;
    }

    /// All bytes written so far
    pub fn written(&self) -> Vec<u8> {
        self.inner.lock().written.clone()
    }

    /// Settings passed to each successful `open`
    pub fn opened(&self) -> Vec<SerialSettings> {
        self.inner.lock().opened.clone()
    }
}

impl SerialDriver for FakeSerialDriver {
    fn open(&self, settings: &SerialSettings) -> io::Result<Box<dyn SerialStream>> {
        let mut state = self.inner.lock();
        if let Some(kind) = state.open_error {
            return Err(io::Error::new(kind, "fake open failure"));
        }
        state.opened.push(settings.clone());
        Ok(Box::new(FakeStream {
            inner: Arc::clone(&self.inner),
            idle_wait: settings.read_timeout.min(MAX_IDLE_WAIT),
        }))
    }
}

struct FakeStream {
    inner: Arc<Mutex<FakeSerialState>>,
    idle_wait: Duration,
}

impl FakeStream {
    fn wait_while_stalled(&self) {
        while self.inner.lock().stalled {
            thread::sleep(STALL_POLL);
        }
    }
}

impl Read for FakeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.wait_while_stalled();
        let next = self.inner.lock().reads.pop_front();
        match next {
            Some(Scripted::Data(mut bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    let rest = bytes.split_off(n);
                    self.inner.lock().reads.push_front(Scripted::Data(rest));
                }
                Ok(n)
            }
            Some(Scripted::Error(kind)) => Err(io::Error::new(kind, "fake read failure")),
            None => {
                thread::sleep(self.idle_wait);
                Err(io::Error::new(io::ErrorKind::TimedOut, "fake read timeout"))
            }
        }
    }
}

impl Write for FakeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.wait_while_stalled();
        let mut state = self.inner.lock();
        if let Some(kind) = state.write_error {
            return Err(io::Error::new(kind, "fake write failure"));
        }
        state.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SerialStream for FakeStream {
    fn try_clone(&self) -> io::Result<Box<dyn SerialStream>> {
        Ok(Box::new(FakeStream {
            inner: Arc::clone(&self.inner),
            idle_wait: self.idle_wait,
        }))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
