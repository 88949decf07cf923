// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed devfile commands

use crate::error::DevfileError;
use crate::model::{RawCommand, RawGroup};
use serde::{Deserialize, Serialize};

/// Attribute marking a command whose failure does not fail its composite.
pub const BEST_EFFORT_ATTRIBUTE: &str = "devloop.dev/best-effort";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandGroupKind {
    Build,
    Run,
    Test,
    Debug,
    Deploy,
}

dl_core::simple_display! {
    CommandGroupKind {
        Build => "build",
        Run => "run",
        Test => "test",
        Debug => "debug",
        Deploy => "deploy",
    }
}

/// An exec command body after variable substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    pub component: String,
    pub command_line: String,
    pub working_dir: Option<String>,
    pub env: Vec<(String, String)>,
    pub hot_reload_capable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    Exec(ExecSpec),
    Apply { component: String },
    Composite { children: Vec<String>, parallel: bool },
}

impl CommandKind {
    pub fn label(&self) -> &'static str {
        match self {
            CommandKind::Exec(_) => "exec",
            CommandKind::Apply { .. } => "apply",
            CommandKind::Composite { .. } => "composite",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevfileCommand {
    /// Command id, lowercased.
    pub name: String,
    pub kind: CommandKind,
    pub group: Option<CommandGroupKind>,
    pub is_default: bool,
    pub best_effort: bool,
}

impl DevfileCommand {
    pub fn in_group(&self, group: CommandGroupKind) -> bool {
        self.group == Some(group)
    }

    pub fn group_label(&self) -> String {
        match self.group {
            Some(group) => group.to_string(),
            None => "none".to_string(),
        }
    }
}

impl TryFrom<RawCommand> for DevfileCommand {
    type Error = DevfileError;

    fn try_from(raw: RawCommand) -> Result<Self, Self::Error> {
        let name = raw.id.to_lowercase();
        let best_effort = raw
            .attributes
            .get(BEST_EFFORT_ATTRIBUTE)
            .map(is_truthy)
            .unwrap_or(false);

        let (kind, group) = match (raw.exec, raw.apply, raw.composite) {
            (Some(exec), None, None) => (
                CommandKind::Exec(ExecSpec {
                    component: exec.component,
                    command_line: exec.command_line,
                    working_dir: exec.working_dir,
                    env: exec.env.into_iter().map(|e| (e.name, e.value)).collect(),
                    hot_reload_capable: exec.hot_reload_capable.unwrap_or(false),
                }),
                exec.group,
            ),
            (None, Some(apply), None) => {
                (CommandKind::Apply { component: apply.component }, apply.group)
            }
            (None, None, Some(composite)) => (
                CommandKind::Composite {
                    children: composite.commands.iter().map(|c| c.to_lowercase()).collect(),
                    parallel: composite.parallel.unwrap_or(false),
                },
                composite.group,
            ),
            (None, None, None) => {
                return Err(DevfileError::InvalidCommand {
                    name,
                    reason: "expected one of exec, apply or composite".to_string(),
                })
            }
            _ => {
                return Err(DevfileError::InvalidCommand {
                    name,
                    reason: "only one of exec, apply or composite may be set".to_string(),
                })
            }
        };

        let (group, is_default) = match group {
            Some(RawGroup { kind, is_default }) => (Some(kind), is_default.unwrap_or(false)),
            None => (None, false),
        };

        Ok(DevfileCommand { name, kind, group, is_default, best_effort })
    }
}

fn is_truthy(value: &serde_yaml::Value) -> bool {
    match value {
        serde_yaml::Value::Bool(b) => *b,
        serde_yaml::Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
