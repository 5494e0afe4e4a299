// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cadence Daemon (cadenced)
//!
//! Runs the timers and groups declared in its config file on a fixed frame
//! loop, and optionally reads newline-delimited packets from a serial port.
//!
//! Architecture:
//! - Reader thread: blocking serial reads, queues packets as events
//! - Frame loop: current-thread runtime that drains serial events and ticks
//!   the timer manager once per frame

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod frame;
mod scene;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use cadence_adapters::{FileSerialDriver, LineCodec, SerialConnection, SerialEvent, TracedDriver};
use cadence_core::{Event, EventDispatcher, EventKind, Listener};
use clap::Parser;
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use crate::config::{Config, ConfigError};
use crate::scene::Scene;

#[derive(Debug, Parser)]
#[command(
    name = "cadenced",
    version,
    about = "Cadence daemon - frame-driven timers with serial event delivery"
)]
struct Cli {
    /// Config file [default: $CADENCE_CONFIG, then <config dir>/cadence/cadenced.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between frames
    #[arg(long)]
    frame_ms: Option<u64>,

    /// Serial port to open, overriding the config file
    #[arg(long)]
    port: Option<String>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Validate the config and exit
    #[arg(long)]
    check: bool,
}

#[derive(Debug, Error)]
enum DaemonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("log path has no file name: {}", .0.display())]
    InvalidLogPath(PathBuf),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("cadenced: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        return match Scene::build(&config) {
            Ok(scene) => {
                println!(
                    "config ok: {} timers, {} groups",
                    scene.timer_count(),
                    scene.groups().len()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("cadenced: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let _log_guard = match setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("cadenced: failed to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, cli.frames).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("daemon failed: {}", e);
            eprintln!("cadenced: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Config file, then env, then command-line overrides
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(ms) = cli.frame_ms {
        config.frame_ms = ms;
    }
    if let Some(port) = &cli.port {
        config.set_serial_port(port.as_str());
    }
    config.validate()?;
    Ok(config)
}

async fn run(config: &Config, max_frames: Option<u64>) -> Result<(), DaemonError> {
    let scene = Scene::build(config)?;

    let mut serial = config.serial.clone().map(|settings| {
        SerialConnection::new(
            TracedDriver::new(FileSerialDriver::new()),
            settings,
            LineCodec::new(),
        )
    });
    if let Some(conn) = serial.as_mut() {
        log_serial_events(conn);
        // Timers keep running without the port
        if let Err(e) = conn.open() {
            error!(error = %e, "serial port unavailable");
        }
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
            _ = sigint.recv() => info!("received SIGINT, shutting down"),
        }
    };

    info!(frame_ms = config.frame_ms, "cadenced ready");
    let frames = frame::run_until(
        &scene,
        serial.as_ref(),
        Duration::from_millis(config.frame_ms),
        max_frames,
        shutdown,
    )
    .await;

    if let Some(mut conn) = serial {
        conn.close();
        conn.drain();
    }
    scene.shutdown();
    info!(frames, "cadenced stopped");
    Ok(())
}

fn log_serial_events(conn: &SerialConnection<LineCodec>) {
    let on_status = Listener::new(|event: &Event<SerialEvent<String>>| {
        info!(port = %event.payload().port, kind = %event.kind(), "serial status");
    });
    let on_data = Listener::new(|event: &Event<SerialEvent<String>>| {
        for packet in &event.payload().packets {
            info!(port = %event.payload().port, packet = %packet, "serial packet");
        }
    });
    conn.add_event_listener(EventKind::SERIAL_OPEN, &on_status);
    conn.add_event_listener(EventKind::SERIAL_CLOSE, &on_status);
    conn.add_event_listener(EventKind::SERIAL_DATA, &on_data);
}

/// Split a log path into directory and file name for the appender
fn log_file_parts(path: &Path) -> Result<(PathBuf, OsString), DaemonError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| DaemonError::InvalidLogPath(path.to_path_buf()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name.to_os_string()))
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, DaemonError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = match &config.log_path {
        Some(path) => {
            let (dir, file_name) = log_file_parts(path)?;
            std::fs::create_dir_all(&dir)?;
            let file_appender = tracing_appender::rolling::never(dir, file_name);
            tracing_appender::non_blocking(file_appender)
        }
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    // Set up subscriber with env filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
