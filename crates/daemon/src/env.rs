// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Config file path, used when `--config` is not given.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("WSP_CONFIG").ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

/// Tracing filter directives (default `info`).
pub fn log_filter() -> String {
    std::env::var("WSP_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Emit JSON log lines when `WSP_LOG_FORMAT=json`.
pub fn log_json() -> bool {
    std::env::var("WSP_LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false)
}

/// Shutdown drain timeout (default 5s, configurable via `WSP_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    std::env::var("WSP_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
