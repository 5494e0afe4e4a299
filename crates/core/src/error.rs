// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for timer construction

use thiserror::Error;

/// Errors returned when a timer or group cannot be constructed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimerError {
    #[error("timer interval must be a finite number of seconds greater than zero, got {0}")]
    InvalidInterval(f64),
    #[error("timer group name must not be empty")]
    EmptyGroupName,
}
