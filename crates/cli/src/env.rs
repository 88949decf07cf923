// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the dl binary.

/// Tracing filter directives (`DL_LOG`), e.g. `dl_engine=debug`.
pub fn log_filter() -> Option<String> {
    std::env::var("DL_LOG").ok().filter(|s| !s.trim().is_empty())
}

/// `NO_COLOR=1` disables color.
pub fn no_color() -> bool {
    std::env::var("NO_COLOR").is_ok_and(|v| v == "1")
}

/// `COLOR=1` forces color even without a TTY.
pub fn force_color() -> bool {
    std::env::var("COLOR").is_ok_and(|v| v == "1")
}
