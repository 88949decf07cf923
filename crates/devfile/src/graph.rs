// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composite command graph: cycle detection and resolution into trees

use crate::command::{CommandGroupKind, CommandKind, DevfileCommand, ExecSpec};
use crate::error::DevfileError;
use indexmap::IndexMap;
use std::collections::HashMap;

/// A command with composite children expanded in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCommand {
    Exec {
        name: String,
        group: Option<CommandGroupKind>,
        spec: ExecSpec,
        best_effort: bool,
    },
    Apply {
        name: String,
        component: String,
        best_effort: bool,
    },
    Composite {
        name: String,
        parallel: bool,
        children: Vec<ResolvedCommand>,
        best_effort: bool,
    },
}

impl ResolvedCommand {
    pub fn name(&self) -> &str {
        match self {
            ResolvedCommand::Exec { name, .. }
            | ResolvedCommand::Apply { name, .. }
            | ResolvedCommand::Composite { name, .. } => name,
        }
    }

    pub fn best_effort(&self) -> bool {
        match self {
            ResolvedCommand::Exec { best_effort, .. }
            | ResolvedCommand::Apply { best_effort, .. }
            | ResolvedCommand::Composite { best_effort, .. } => *best_effort,
        }
    }

    /// Leaf command names in declaration order.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ResolvedCommand::Composite { children, .. } => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
            leaf => out.push(leaf.name()),
        }
    }

    /// Containers targeted by exec leaves, deduplicated in first-use order.
    pub fn exec_components(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        self.collect_components(&mut out);
        out
    }

    fn collect_components<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ResolvedCommand::Exec { spec, .. } => {
                if !out.contains(&spec.component.as_str()) {
                    out.push(&spec.component);
                }
            }
            ResolvedCommand::Apply { .. } => {}
            ResolvedCommand::Composite { children, .. } => {
                for child in children {
                    child.collect_components(out);
                }
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Fail if any composite references a missing command or participates in a cycle.
pub fn check_acyclic(commands: &IndexMap<String, DevfileCommand>) -> Result<(), DevfileError> {
    let mut marks: HashMap<&str, Mark> = HashMap::new();
    for name in commands.keys() {
        let mut path = Vec::new();
        visit(commands, name, &mut marks, &mut path)?;
    }
    Ok(())
}

fn visit<'a>(
    commands: &'a IndexMap<String, DevfileCommand>,
    name: &'a str,
    marks: &mut HashMap<&'a str, Mark>,
    path: &mut Vec<&'a str>,
) -> Result<(), DevfileError> {
    match marks.get(name) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::Visiting) => {
            let start = path.iter().position(|n| *n == name).unwrap_or(0);
            let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(name.to_string());
            return Err(DevfileError::CompositeCycle { path: cycle });
        }
        None => {}
    }

    let Some(command) = commands.get(name) else {
        return Ok(());
    };

    marks.insert(name, Mark::Visiting);
    path.push(name);
    if let CommandKind::Composite { children, .. } = &command.kind {
        for child in children {
            let Some((key, _)) = commands.get_key_value(child.as_str()) else {
                return Err(DevfileError::UnknownChild {
                    composite: name.to_string(),
                    child: child.clone(),
                });
            };
            visit(commands, key, marks, path)?;
        }
    }
    path.pop();
    marks.insert(name, Mark::Done);
    Ok(())
}

/// Expand `name` into a tree. Call after [`check_acyclic`] has passed.
pub fn resolve(
    commands: &IndexMap<String, DevfileCommand>,
    name: &str,
) -> Result<ResolvedCommand, DevfileError> {
    let mut path = Vec::new();
    resolve_inner(commands, name, &mut path)
}

fn resolve_inner(
    commands: &IndexMap<String, DevfileCommand>,
    name: &str,
    path: &mut Vec<String>,
) -> Result<ResolvedCommand, DevfileError> {
    if path.iter().any(|n| n == name) {
        let mut cycle = path.clone();
        cycle.push(name.to_string());
        return Err(DevfileError::CompositeCycle { path: cycle });
    }
    let command = commands.get(name).ok_or_else(|| DevfileError::UnknownChild {
        composite: path.last().cloned().unwrap_or_default(),
        child: name.to_string(),
    })?;

    let resolved = match &command.kind {
        CommandKind::Exec(spec) => ResolvedCommand::Exec {
            name: command.name.clone(),
            group: command.group,
            spec: spec.clone(),
            best_effort: command.best_effort,
        },
        CommandKind::Apply { component } => ResolvedCommand::Apply {
            name: command.name.clone(),
            component: component.clone(),
            best_effort: command.best_effort,
        },
        CommandKind::Composite { children, parallel } => {
            path.push(command.name.clone());
            let children = children
                .iter()
                .map(|child| resolve_inner(commands, child, path))
                .collect::<Result<Vec<_>, _>>()?;
            path.pop();
            ResolvedCommand::Composite {
                name: command.name.clone(),
                parallel: *parallel,
                children,
                best_effort: command.best_effort,
            }
        }
    };
    Ok(resolved)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
