// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dl describe`: the component and its running sessions.

use crate::color;
use crate::output::{port_lines, OutputFormat};
use anyhow::Result;
use dl_core::{ForwardedPort, Platform};
use dl_devfile::{load_devfile, VarOverrides};
use dl_storage::{read_pid_states, ProcessProbe, SystemProbe};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommandSummary {
    pub name: String,
    pub kind: &'static str,
    pub group: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Description {
    pub name: String,
    pub commands: Vec<CommandSummary>,
    /// Platforms with a live session in this directory.
    pub running_in: Vec<Platform>,
    pub forwarded_ports: Vec<ForwardedPort>,
}

/// Read-only view of the devfile and the state files of live sessions.
pub fn describe(root: &Path, probe: &dyn ProcessProbe) -> Result<Description> {
    let devfile = load_devfile(root, &VarOverrides::new())?;
    let commands = devfile
        .commands
        .values()
        .map(|c| CommandSummary { name: c.name.clone(), kind: c.kind.label(), group: c.group_label() })
        .collect();

    let mut running_in = Vec::new();
    let mut forwarded_ports = Vec::new();
    for (path, state) in read_pid_states(root)? {
        if state.pid == 0 || !probe.is_alive(state.pid) {
            tracing::debug!(path = %path.display(), pid = state.pid, "skipping state of dead session");
            continue;
        }
        if let Some(platform) = state.platform {
            if !running_in.contains(&platform) {
                running_in.push(platform);
            }
        }
        forwarded_ports.extend(state.forwarded_ports);
    }

    Ok(Description { name: devfile.name, commands, running_in, forwarded_ports })
}

pub fn handle(root: &Path, format: OutputFormat) -> Result<()> {
    let description = describe(root, &SystemProbe)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&description)?),
        OutputFormat::Text => print_text(&description),
    }
    Ok(())
}

fn print_text(description: &Description) {
    println!("{} {}", color::header("Name:"), description.name);
    let running = match description.running_in.as_slice() {
        [] => "None".to_string(),
        platforms => platforms.iter().map(Platform::to_string).collect::<Vec<_>>().join(", "),
    };
    println!("{} {running}", color::header("Running in:"));

    println!("{}", color::header("Commands:"));
    for command in &description.commands {
        println!(" •  {} {}", command.name, color::context(&format!("({}, {})", command.kind, command.group)));
    }

    if description.forwarded_ports.is_empty() {
        return;
    }
    println!("{}", color::header("Forwarded ports:"));
    for line in port_lines(&description.forwarded_ports) {
        println!(" •  {line}");
    }
}

#[cfg(test)]
#[path = "describe_tests.rs"]
mod tests;
