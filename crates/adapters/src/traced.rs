// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::serial::{SerialDriver, SerialSettings, SerialStream};
use std::io;

/// Wrapper that adds tracing to any SerialDriver
#[derive(Debug, Clone)]
pub struct TracedDriver<D> {
    inner: D,
}

impl<D> TracedDriver<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: SerialDriver> SerialDriver for TracedDriver<D> {
    fn open(&self, settings: &SerialSettings) -> io::Result<Box<dyn SerialStream>> {
        let span = tracing::info_span!("serial.open", port = %settings.port);
        let _guard = span.enter();
        tracing::info!(
            baud_rate = settings.baud_rate,
            read_timeout_ms = settings.read_timeout.as_millis() as u64,
            "opening"
        );
        let start = std::time::Instant::now();
        let result = self.inner.open(settings);
        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::info!(elapsed_ms, "port opened"),
            Err(e) => tracing::error!(elapsed_ms, error = %e, "open failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
