// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::ConfigError;
use crate::forward::ForwardError;
use crate::output::format_tail;
use dl_adapters::AdapterError;
use dl_core::InvalidTransition;
use dl_devfile::DevfileError;
use dl_storage::StorageError;
use dl_sync::SyncError;
use thiserror::Error;

/// Errors from running devfile commands
#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("command {command:?} failed with {}{}", exit_label(.exit_code), format_tail(.tail))]
    CommandFailed { command: String, exit_code: Option<i32>, tail: Vec<String> },

    #[error("command {composite:?} failed: child {child:?}: {source}")]
    ChildFailed {
        composite: String,
        child: String,
        #[source]
        source: Box<ExecuteError>,
    },

    #[error("command {command:?} was cancelled")]
    Cancelled { command: String },

    #[error("failed to build the application with command {command:?}{}", format_tail(.tail))]
    BuildFailure { command: String, tail: Vec<String> },

    #[error("run command {command:?} exited with an error status{}", format_tail(.tail))]
    RunFailure { command: String, tail: Vec<String> },

    #[error("apply command {command:?} failed: {source}")]
    Apply {
        command: String,
        #[source]
        source: AdapterError,
    },

    #[error("command {command:?}: {source}")]
    Platform {
        command: String,
        #[source]
        source: AdapterError,
    },

    #[error(transparent)]
    Devfile(#[from] DevfileError),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    }
}

impl ExecuteError {
    pub fn kind(&self) -> &'static str {
        match self {
            ExecuteError::BuildFailure { .. } => "BuildFailureError",
            ExecuteError::RunFailure { .. } => "RunFailureError",
            ExecuteError::ChildFailed { source, .. } => source.kind(),
            ExecuteError::Devfile(e) => e.kind(),
            ExecuteError::CommandFailed { .. }
            | ExecuteError::Cancelled { .. }
            | ExecuteError::Apply { .. }
            | ExecuteError::Platform { .. } => "CommandExecutionError",
        }
    }

    /// Innermost leaf command responsible for the failure.
    pub fn failed_command(&self) -> &str {
        match self {
            ExecuteError::ChildFailed { source, .. } => source.failed_command(),
            ExecuteError::CommandFailed { command, .. }
            | ExecuteError::Cancelled { command }
            | ExecuteError::BuildFailure { command, .. }
            | ExecuteError::RunFailure { command, .. }
            | ExecuteError::Apply { command, .. }
            | ExecuteError::Platform { command, .. } => command,
            ExecuteError::Devfile(_) => "",
        }
    }

    /// Output tail of the failing leaf, if it produced any.
    pub fn tail(&self) -> &[String] {
        match self {
            ExecuteError::ChildFailed { source, .. } => source.tail(),
            ExecuteError::CommandFailed { tail, .. }
            | ExecuteError::BuildFailure { tail, .. }
            | ExecuteError::RunFailure { tail, .. } => tail,
            _ => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        match self {
            ExecuteError::Cancelled { .. } => true,
            ExecuteError::ChildFailed { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// A failed sync/build/run cycle, kept on the session status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CycleFailure {
    pub kind: &'static str,
    pub message: String,
}

impl From<&SessionError> for CycleFailure {
    fn from(e: &SessionError) -> Self {
        CycleFailure { kind: e.kind(), message: e.to_string() }
    }
}

/// Errors from the session controller
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Devfile(#[from] DevfileError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Execute(#[from] ExecuteError),

    #[error(transparent)]
    Forward(#[from] ForwardError),

    #[error("platform error: {0}")]
    Platform(#[from] AdapterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Cycle(CycleFailure),

    #[error("session has ended")]
    Closed,
}

impl SessionError {
    /// Stable error name for the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Devfile(e) => e.kind(),
            SessionError::Sync(e) => e.kind(),
            SessionError::Storage(e) => e.kind(),
            SessionError::Execute(e) => e.kind(),
            SessionError::Forward(e) => e.kind(),
            SessionError::Platform(_) => "PlatformError",
            SessionError::Config(_) => "ConfigError",
            SessionError::Transition(_) => "InvalidTransitionError",
            SessionError::Cycle(failure) => failure.kind,
            SessionError::Closed => "SessionClosedError",
        }
    }
}
