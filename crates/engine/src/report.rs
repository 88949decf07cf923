// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing progress lines
//!
//! Kept apart from `tracing`: reporter output is what the user reads in the
//! terminal, tracing goes to the log file.

use dl_adapters::OutputLine;

pub trait Reporter: Send + Sync + 'static {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    /// A line printed by a running command.
    fn output(&self, _command: &str, _line: &OutputLine) {}
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

/// A state file that could not be written never stops the session.
pub fn persistence_warning(reporter: &dyn Reporter, error: &dl_storage::StorageError) {
    tracing::warn!(error = %error, kind = error.kind(), "state file not updated");
    reporter.warn(&format!("Could not update the dev state file: {error}"));
}

pub fn building_message(command: &str) -> String {
    format!("Building your application in container (command: {command})")
}

pub fn running_message(command: &str) -> String {
    format!("Executing the application (command: {command})")
}

pub fn executing_message(command: &str, container: &str) -> String {
    format!("Executing {command} command on container {container:?}")
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod recording {
    use super::Reporter;
    use dl_adapters::OutputLine;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Report {
        Info(String),
        Warn(String),
        Output { command: String, line: String },
    }

    /// Reporter that records every line for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingReporter {
        reports: Arc<Mutex<Vec<Report>>>,
    }

    impl RecordingReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reports(&self) -> Vec<Report> {
            self.reports.lock().clone()
        }

        /// Info and warning text, in order.
        pub fn messages(&self) -> Vec<String> {
            self.reports
                .lock()
                .iter()
                .filter_map(|r| match r {
                    Report::Info(m) | Report::Warn(m) => Some(m.clone()),
                    Report::Output { .. } => None,
                })
                .collect()
        }

        pub fn contains(&self, needle: &str) -> bool {
            self.messages().iter().any(|m| m.contains(needle))
        }
    }

    impl Reporter for RecordingReporter {
        fn info(&self, message: &str) {
            self.reports.lock().push(Report::Info(message.to_string()));
        }

        fn warn(&self, message: &str) {
            self.reports.lock().push(Report::Warn(message.to_string()));
        }

        fn output(&self, command: &str, line: &OutputLine) {
            self.reports.lock().push(Report::Output { command: command.to_string(), line: line.text.clone() });
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use recording::{RecordingReporter, Report};
