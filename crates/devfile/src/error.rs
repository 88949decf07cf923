// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors raised while loading and querying a devfile

use crate::command::CommandGroupKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DevfileError {
    #[error("no devfile found in {}; run `dl dev` from a component directory", dir.display())]
    NoComponent { dir: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse devfile: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid devfile variables: {} referenced but not defined", keys.join(", "))]
    InvalidVariables { keys: Vec<String> },

    #[error("invalid variable {0:?}: expected KEY=VALUE")]
    InvalidVarFlag(String),

    #[error("invalid command {name:?}: {reason}")]
    InvalidCommand { name: String, reason: String },

    #[error("duplicate command id {0:?}")]
    DuplicateCommand(String),

    #[error("command {command:?} references unknown component {component:?}")]
    UnknownComponent { command: String, component: String },

    #[error("composite command {composite:?} references unknown command {child:?}")]
    UnknownChild { composite: String, child: String },

    #[error("{event} event references unknown command {command:?}")]
    UnknownEventCommand { event: &'static str, command: String },

    #[error("component {0:?} has no kubernetes or openshift manifest")]
    NoManifest(String),

    #[error("composite command cycle detected: {}", path.join(" -> "))]
    CompositeCycle { path: Vec<String> },

    #[error("no {group} command with name {name:?} found in the devfile")]
    CommandNotFound { name: String, group: CommandGroupKind },

    #[error("command {name:?} is not a {expected} command (group: {actual})")]
    WrongCommandKind {
        name: String,
        expected: CommandGroupKind,
        actual: String,
    },

    #[error("more than one default {0} command found in the devfile")]
    MoreThanOneDefault(CommandGroupKind),

    #[error("no default {0} command found in the devfile")]
    NoDefaultCommand(CommandGroupKind),

    #[error("project {project:?} has invalid clonePath {path:?}: must be relative and stay inside /projects")]
    InvalidClonePath { project: String, path: String },
}

impl DevfileError {
    /// Stable machine-readable name used in JSON error envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            DevfileError::NoComponent { .. } => "NoComponentError",
            DevfileError::Io { .. } | DevfileError::Parse(_) => "DevfileParseError",
            DevfileError::InvalidVariables { .. } | DevfileError::InvalidVarFlag(_) => {
                "InvalidVariablesError"
            }
            DevfileError::InvalidCommand { .. }
            | DevfileError::DuplicateCommand(_)
            | DevfileError::UnknownComponent { .. }
            | DevfileError::UnknownChild { .. }
            | DevfileError::UnknownEventCommand { .. }
            | DevfileError::NoManifest(_)
            | DevfileError::InvalidClonePath { .. } => "DevfileValidationError",
            DevfileError::CompositeCycle { .. } => "CompositeCycleError",
            DevfileError::CommandNotFound { .. } => "CommandNotFoundError",
            DevfileError::WrongCommandKind { .. } => "WrongCommandKindError",
            DevfileError::MoreThanOneDefault(_) => "MoreThanOneDefaultError",
            DevfileError::NoDefaultCommand(_) => "NoDefaultCommandError",
        }
    }
}
