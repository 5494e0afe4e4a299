// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial port adapters
//!
//! A [`SerialConnection`] reads from a [`SerialStream`] on a background
//! thread, decodes bytes with a [`PacketCodec`], and queues the packets as
//! `serialData` events. The owning thread drains them once per frame.

mod codec;
mod connection;
mod file;

pub use codec::{LineCodec, PacketCodec};
pub use connection::SerialConnection;
pub use file::FileSerialDriver;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSerialDriver;

use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::time::Duration;
use thiserror::Error;

/// Errors from serial operations on the owning thread
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {source}")]
    Open { port: String, source: io::Error },
    #[error("serial port {0} is not open")]
    NotOpen(String),
    #[error("write to serial port {port} failed: {source}")]
    Write { port: String, source: io::Error },
    #[error("failed to start reader thread for {port}: {source}")]
    Spawn { port: String, source: io::Error },
}

/// Connection parameters for a serial port
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyUSB0`
    pub port: String,
    pub baud_rate: u32,
    #[serde(rename = "read_timeout_ms", with = "millis")]
    pub read_timeout: Duration,
    #[serde(rename = "write_timeout_ms", with = "millis")]
    pub write_timeout: Duration,
    /// Bytes requested per read
    pub read_buffer_size: usize,
    /// Pause after a read error before retrying
    #[serde(rename = "error_backoff_ms", with = "millis")]
    pub error_backoff: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: 9600,
            read_timeout: Duration::from_millis(500),
            write_timeout: Duration::from_millis(500),
            read_buffer_size: 256,
            error_backoff: Duration::from_millis(50),
        }
    }
}

impl SerialSettings {
    pub fn new(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            ..Self::default()
        }
    }
}

/// Payload of `serialOpen`, `serialClose` and `serialData` events.
///
/// `packets` is empty for open and close.
#[derive(Debug, Clone, PartialEq)]
pub struct SerialEvent<P> {
    pub port: String,
    pub packets: Vec<P>,
}

/// A byte stream to a serial device.
///
/// Reads are expected to return within the configured read timeout, either
/// with data, `Ok(0)`, or an error of kind `TimedOut`/`WouldBlock`.
pub trait SerialStream: Read + Write + Send {
    /// A second handle to the same device, used by the reader thread.
    fn try_clone(&self) -> io::Result<Box<dyn SerialStream>>;
}

/// Opens serial streams
pub trait SerialDriver: Send + Sync + 'static {
    fn open(&self, settings: &SerialSettings) -> io::Result<Box<dyn SerialStream>>;
}

/// Durations as integer milliseconds in config files
mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
