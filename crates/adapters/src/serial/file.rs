// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serial driver backed by a device file

use super::{SerialDriver, SerialSettings, SerialStream};
use std::fs::{File, OpenOptions};
use std::io::{self, IsTerminal};
use std::process::{Command, Stdio};
use std::time::Duration;

#[cfg(target_os = "macos")]
const STTY_DEVICE_FLAG: &str = "-f";
#[cfg(not(target_os = "macos"))]
const STTY_DEVICE_FLAG: &str = "-F";

/// Opens the port path read+write as a plain file.
///
/// When the path is a terminal device, `stty` is used to put it in raw mode
/// at the configured baud rate with a bounded read timeout. Anything else
/// (fifo, pty pair, regular file) is used as is.
#[derive(Debug, Clone, Default)]
pub struct FileSerialDriver {
    configure_tty: bool,
}

impl FileSerialDriver {
    pub fn new() -> Self {
        Self {
            configure_tty: true,
        }
    }

    /// Open the path without touching terminal settings
    pub fn raw() -> Self {
        Self {
            configure_tty: false,
        }
    }
}

impl SerialDriver for FileSerialDriver {
    fn open(&self, settings: &SerialSettings) -> io::Result<Box<dyn SerialStream>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&settings.port)?;
        if self.configure_tty {
            if file.is_terminal() {
                configure_tty(settings);
            } else {
                tracing::debug!(port = %settings.port, "not a terminal, using port as is");
            }
        }
        Ok(Box::new(file))
    }
}

impl SerialStream for File {
    fn try_clone(&self) -> io::Result<Box<dyn SerialStream>> {
        Ok(Box::new(File::try_clone(self)?))
    }
}

/// `stty` arguments for raw mode, baud rate and read timeout.
///
/// The terminal read timeout is counted in tenths of a second, 1 to 255.
fn stty_args(settings: &SerialSettings) -> Vec<String> {
    vec![
        STTY_DEVICE_FLAG.to_string(),
        settings.port.clone(),
        settings.baud_rate.to_string(),
        "raw".to_string(),
        "-echo".to_string(),
        "min".to_string(),
        "0".to_string(),
        "time".to_string(),
        deciseconds(settings.read_timeout).to_string(),
    ]
}

fn deciseconds(timeout: Duration) -> u8 {
    let tenths = timeout.as_millis().div_ceil(100);
    u8::try_from(tenths.clamp(1, 255)).unwrap_or(u8::MAX)
}

fn configure_tty(settings: &SerialSettings) {
    let result = Command::new("stty")
        .args(stty_args(settings))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match result {
        Ok(status) if status.success() => {
            tracing::debug!(port = %settings.port, baud_rate = settings.baud_rate, "tty configured");
        }
        Ok(status) => {
            tracing::warn!(port = %settings.port, ?status, "stty failed, read timeout not applied");
        }
        Err(e) => {
            tracing::warn!(port = %settings.port, error = %e, "stty unavailable");
        }
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
