// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::color;
use crate::exit_error::{ExitError, EXIT_FAILURE, EXIT_USAGE};
use clap::ValueEnum;
use dl_core::ForwardedPort;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Machine-readable error printed to stderr under `-o json`.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub message: String,
    pub kind: &'static str,
}

impl ErrorEnvelope {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self { message: format!("{err:#}"), kind: error_kind(err) }
    }
}

/// Stable error name: the first error in the chain that has one.
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<dl_engine::SessionError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<dl_devfile::DevfileError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<dl_storage::StorageError>() {
            return e.kind();
        }
        if let Some(e) = cause.downcast_ref::<dl_engine::ForwardError>() {
            return e.kind();
        }
        if cause.downcast_ref::<dl_engine::ConfigError>().is_some() {
            return "ConfigError";
        }
        if cause.downcast_ref::<dl_adapters::AdapterError>().is_some() {
            return "PlatformError";
        }
        if let Some(e) = cause.downcast_ref::<ExitError>() {
            return if e.code == EXIT_USAGE { "UsageError" } else { "Error" };
        }
    }
    "Error"
}

pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<ExitError>().map(|e| e.code).unwrap_or(EXIT_FAILURE)
}

/// Print a failed command's error to stderr in the requested format.
pub fn print_error(err: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("{} {err:#}", color::error("Error:")),
        OutputFormat::Json => {
            let envelope = ErrorEnvelope::from_error(err);
            match serde_json::to_string(&envelope) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err:#}"),
            }
        }
    }
}

/// One line per forwarded port.
pub fn port_lines(ports: &[ForwardedPort]) -> Vec<String> {
    ports
        .iter()
        .map(|p| {
            let debug = if p.is_debug { " (debug)" } else { "" };
            format!(
                "[{}] {} -> {}:{}{}",
                p.container_name,
                color::header(&p.local_url()),
                p.port_name,
                p.container_port,
                debug
            )
        })
        .collect()
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
