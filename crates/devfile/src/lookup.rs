// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build/run/debug command selection

use crate::command::{CommandGroupKind, DevfileCommand};
use crate::devfile::Devfile;
use crate::error::DevfileError;
use crate::graph::ResolvedCommand;

/// Find the command to use for `group`.
///
/// With a name, the command must exist and belong to `group`. Without one,
/// the group's default is used: a sole command in a group is its default,
/// otherwise exactly one command must carry `isDefault: true`. `Ok(None)`
/// means the group has no usable command.
pub fn select_command<'a>(
    devfile: &'a Devfile,
    group: CommandGroupKind,
    name: Option<&str>,
) -> Result<Option<&'a DevfileCommand>, DevfileError> {
    if let Some(name) = name {
        let cmd = devfile.command(name).ok_or_else(|| DevfileError::CommandNotFound {
            name: name.to_string(),
            group,
        })?;
        if !cmd.in_group(group) {
            return Err(DevfileError::WrongCommandKind {
                name: cmd.name.clone(),
                expected: group,
                actual: cmd.group_label(),
            });
        }
        return Ok(Some(cmd));
    }

    let candidates = devfile.commands_in_group(group);
    if let [only] = candidates.as_slice() {
        return Ok(Some(*only));
    }
    let defaults: Vec<&DevfileCommand> = candidates.into_iter().filter(|c| c.is_default).collect();
    match defaults.as_slice() {
        [] => Ok(None),
        [default] => Ok(Some(*default)),
        _ => Err(DevfileError::MoreThanOneDefault(group)),
    }
}

/// Requested command names for a dev session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSelection {
    pub build: Option<String>,
    pub run: Option<String>,
    pub debug: Option<String>,
    pub debug_mode: bool,
}

/// The commands a push cycle executes, resolved into trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushCommands {
    pub build: Option<ResolvedCommand>,
    /// The run command, or the debug command in debug mode.
    pub run: ResolvedCommand,
    pub run_group: CommandGroupKind,
    pub post_start: Vec<ResolvedCommand>,
    pub pre_stop: Vec<ResolvedCommand>,
}

impl PushCommands {
    /// Validate the selection against the devfile before anything runs.
    ///
    /// The build command is optional unless explicitly named.
    pub fn select(devfile: &Devfile, selection: &CommandSelection) -> Result<Self, DevfileError> {
        let build = select_command(devfile, CommandGroupKind::Build, selection.build.as_deref())?
            .map(|cmd| devfile.resolve(&cmd.name))
            .transpose()?;

        let (run_group, run_name) = if selection.debug_mode {
            (CommandGroupKind::Debug, selection.debug.as_deref())
        } else {
            (CommandGroupKind::Run, selection.run.as_deref())
        };
        let run_cmd = select_command(devfile, run_group, run_name)?
            .ok_or(DevfileError::NoDefaultCommand(run_group))?;
        let run = devfile.resolve(&run_cmd.name)?;

        tracing::debug!(
            build = build.as_ref().map(ResolvedCommand::name).unwrap_or("-"),
            run = run.name(),
            group = %run_group,
            "selected push commands"
        );

        Ok(PushCommands {
            build,
            run,
            run_group,
            post_start: devfile.resolve_events(&devfile.events.post_start)?,
            pre_stop: devfile.resolve_events(&devfile.events.pre_stop)?,
        })
    }
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod tests;
