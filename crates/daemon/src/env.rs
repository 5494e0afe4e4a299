// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Explicit config file from `CADENCE_CONFIG`
pub fn config_path() -> Option<PathBuf> {
    std::env::var_os("CADENCE_CONFIG")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Default config file: `<config dir>/cadence/cadenced.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cadence").join("cadenced.toml"))
}

/// Frame period override from `CADENCE_FRAME_MS`
pub fn frame_ms() -> Option<u64> {
    std::env::var("CADENCE_FRAME_MS")
        .ok()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
}
