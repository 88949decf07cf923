// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup
//!
//! Sessions log to `<root>/.devloop/dl.log`; read-only commands log
//! warnings to stderr. Terminal progress never goes through tracing.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "dl.log";

fn filter(default: &str) -> EnvFilter {
    let directives = crate::env::log_filter().unwrap_or_else(|| default.to_string());
    EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log to `<dir>/dl.log`. Keep the guard alive until exit so buffered
/// lines are flushed.
pub fn init_file(dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("warning: cannot create log directory {}: {e}", dir.display());
        init_stderr();
        return None;
    }
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, LOG_FILE));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter("info"))
        .try_init();
    Some(guard)
}

pub fn init_stderr() {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter("warn"))
        .try_init();
}
