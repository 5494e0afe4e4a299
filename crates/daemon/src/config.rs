// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration file.
//!
//! ```toml
//! frame_ms = 16
//! time_scale = 1.0
//!
//! [[timers]]
//! name = "heartbeat"
//! interval = 1.0
//! auto_start = true
//!
//! [[groups]]
//! name = "sensors"
//! auto_start = true
//! timers = ["heartbeat"]
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use cadence_adapters::SerialSettings;
use cadence_core::TimerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::env;

/// Default frame period, roughly 60 frames per second
pub const DEFAULT_FRAME_MS: u64 = 16;

/// Errors loading or validating the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("frame_ms must be greater than zero")]
    ZeroFrame,
    #[error("time_scale must be a finite number >= 0, got {0}")]
    InvalidTimeScale(f64),
    #[error("timer name must not be empty")]
    EmptyTimerName,
    #[error("timer {0:?} is declared more than once")]
    DuplicateTimer(String),
    #[error("timer {name:?}: {source}")]
    InvalidTimer {
        name: String,
        source: cadence_core::TimerError,
    },
    #[error("group {group:?}: {source}")]
    InvalidGroup {
        group: String,
        source: cadence_core::TimerError,
    },
    #[error("group {group:?} refers to unknown timer {timer:?}")]
    UnknownTimer { group: String, timer: String },
    #[error("serial port path must not be empty")]
    EmptySerialPort,
}

/// A named timer declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TimerTable", into = "TimerTable")]
pub struct TimerDecl {
    pub name: String,
    pub config: TimerConfig,
}

/// `[[timers]]` table as written in the file. The timer fields are spelled
/// out so that misspelled keys are rejected.
#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimerTable {
    name: String,
    interval: f64,
    repeat_count: u32,
    ignore_time_scale: bool,
    auto_start: bool,
}

impl Default for TimerTable {
    fn default() -> Self {
        TimerDecl {
            name: String::new(),
            config: TimerConfig::default(),
        }
        .into()
    }
}

impl From<TimerTable> for TimerDecl {
    fn from(table: TimerTable) -> Self {
        Self {
            name: table.name,
            config: TimerConfig {
                interval: table.interval,
                repeat_count: table.repeat_count,
                ignore_time_scale: table.ignore_time_scale,
                auto_start: table.auto_start,
            },
        }
    }
}

impl From<TimerDecl> for TimerTable {
    fn from(decl: TimerDecl) -> Self {
        Self {
            name: decl.name,
            interval: decl.config.interval,
            repeat_count: decl.config.repeat_count,
            ignore_time_scale: decl.config.ignore_time_scale,
            auto_start: decl.config.auto_start,
        }
    }
}

/// A named group of declared timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDecl {
    pub name: String,
    #[serde(default)]
    pub auto_start: bool,
    #[serde(default)]
    pub timers: Vec<String>,
}

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Milliseconds between frames
    pub frame_ms: u64,
    /// Multiplier for frame deltas; timers may opt out
    pub time_scale: f64,
    /// Log file; stderr when unset
    pub log_path: Option<PathBuf>,
    pub timers: Vec<TimerDecl>,
    pub groups: Vec<GroupDecl>,
    pub serial: Option<SerialSettings>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_ms: DEFAULT_FRAME_MS,
            time_scale: 1.0,
            log_path: None,
            timers: Vec::new(),
            groups: Vec::new(),
            serial: None,
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// Resolution: `explicit` > `$CADENCE_CONFIG` > `<config dir>/cadence/cadenced.toml`.
    /// An explicit or env-named file must exist; a missing default file
    /// yields the defaults. `CADENCE_FRAME_MS` overrides `frame_ms`.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(env::config_path) {
            Some(path) => Self::from_file(&path)?,
            None => match env::default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        if let Some(ms) = env::frame_ms() {
            config.frame_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check everything that does not need a live timer manager
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_ms == 0 {
            return Err(ConfigError::ZeroFrame);
        }
        if !self.time_scale.is_finite() || self.time_scale < 0.0 {
            return Err(ConfigError::InvalidTimeScale(self.time_scale));
        }

        let mut names = HashSet::new();
        for decl in &self.timers {
            if decl.name.trim().is_empty() {
                return Err(ConfigError::EmptyTimerName);
            }
            if !names.insert(decl.name.as_str()) {
                return Err(ConfigError::DuplicateTimer(decl.name.clone()));
            }
        }
        for group in &self.groups {
            if let Some(timer) = group.timers.iter().find(|t| !names.contains(t.as_str())) {
                return Err(ConfigError::UnknownTimer {
                    group: group.name.clone(),
                    timer: timer.clone(),
                });
            }
        }

        if let Some(serial) = &self.serial {
            if serial.port.trim().is_empty() {
                return Err(ConfigError::EmptySerialPort);
            }
        }
        Ok(())
    }

    /// Override the serial port, enabling serial if the file had none
    pub fn set_serial_port(&mut self, port: impl Into<String>) {
        self.serial.get_or_insert_with(SerialSettings::default).port = port.into();
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
