// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Frame loop: measure the real delta, deliver queued serial events, tick.

use std::future::Future;
use std::time::{Duration, Instant};

use cadence_adapters::{PacketCodec, SerialConnection};
use tokio::time::MissedTickBehavior;

use crate::scene::Scene;

/// Measures wall-clock time between frames
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self { last: start }
    }

    /// Seconds since the previous call (or since `start`)
    pub fn advance(&mut self, now: Instant) -> f64 {
        let delta = now.saturating_duration_since(self.last);
        self.last = self.last.max(now);
        delta.as_secs_f64()
    }
}

/// One frame: serial events first, so their listeners see timers as they
/// were at the end of the previous frame, then the timer tick.
pub fn step<C: PacketCodec>(scene: &Scene, serial: Option<&SerialConnection<C>>, delta: f64) {
    if let Some(serial) = serial {
        let delivered = serial.drain();
        if delivered > 0 {
            tracing::trace!(delivered, "serial events delivered");
        }
    }
    scene.manager().tick(delta);
}

/// Run frames every `period` until `shutdown` resolves or `max_frames`
/// frames have run. Returns the number of frames run.
pub async fn run_until<C, F>(
    scene: &Scene,
    serial: Option<&SerialConnection<C>>,
    period: Duration,
    max_frames: Option<u64>,
    shutdown: F,
) -> u64
where
    C: PacketCodec,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    // Created once outside the loop so select! does not reset it
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut clock = FrameClock::new(Instant::now());
    let mut frames = 0u64;

    loop {
        if max_frames.is_some_and(|max| frames >= max) {
            tracing::info!(frames, "frame limit reached");
            break;
        }
        tokio::select! {
            biased;
            () = &mut shutdown => break,
            _ = interval.tick() => {
                let delta = clock.advance(Instant::now());
                step(scene, serial, delta);
                frames += 1;
            }
        }
    }
    frames
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
