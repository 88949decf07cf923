// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures;
use crate::VarOverrides;

fn devfile_with(commands: &str) -> Devfile {
    let yaml = format!(
        "schemaVersion: 2.2.0\ncomponents:\n  - name: c\n    container: {{ image: alpine }}\ncommands:\n{commands}"
    );
    Devfile::parse(&yaml, &VarOverrides::new()).unwrap()
}

fn exec(id: &str, group: &str, default: bool) -> String {
    format!(
        "  - id: {id}\n    exec: {{ component: c, commandLine: echo {id}, group: {{ kind: {group}, isDefault: {default} }} }}\n"
    )
}

#[test]
fn default_build_is_selected() {
    let devfile = test_fixtures::node();
    let cmd = select_command(&devfile, CommandGroupKind::Build, None).unwrap().unwrap();
    assert_eq!(cmd.name, "devbuild");
}

#[test]
fn named_build_overrides_default() {
    let devfile = test_fixtures::node();
    let cmd = select_command(&devfile, CommandGroupKind::Build, Some("my-custom-build"))
        .unwrap()
        .unwrap();
    assert_eq!(cmd.name, "my-custom-build");
}

#[test]
fn named_lookup_is_case_insensitive() {
    let devfile = test_fixtures::node();
    let cmd = select_command(&devfile, CommandGroupKind::Run, Some("DevRun")).unwrap().unwrap();
    assert_eq!(cmd.name, "devrun");
}

#[test]
fn missing_named_command() {
    let devfile = test_fixtures::node();
    let err = select_command(&devfile, CommandGroupKind::Build, Some("nope")).unwrap_err();
    assert_eq!(err.kind(), "CommandNotFoundError");
    assert_eq!(err.to_string(), "no build command with name \"nope\" found in the devfile");
}

#[test]
fn named_command_in_other_group() {
    let devfile = test_fixtures::node();
    let err = select_command(&devfile, CommandGroupKind::Build, Some("devrun")).unwrap_err();
    assert!(matches!(
        err,
        DevfileError::WrongCommandKind { ref actual, expected: CommandGroupKind::Build, .. } if actual == "run"
    ));
}

#[test]
fn sole_command_is_default_without_flag() {
    let devfile = devfile_with(&exec("only", "run", false));
    let cmd = select_command(&devfile, CommandGroupKind::Run, None).unwrap().unwrap();
    assert_eq!(cmd.name, "only");
}

#[test]
fn two_defaults_is_an_error() {
    let devfile = devfile_with(&format!("{}{}", exec("a", "run", true), exec("b", "run", true)));
    let err = select_command(&devfile, CommandGroupKind::Run, None).unwrap_err();
    assert!(matches!(err, DevfileError::MoreThanOneDefault(CommandGroupKind::Run)));
}

#[test]
fn several_without_default_is_none() {
    let devfile = devfile_with(&format!("{}{}", exec("a", "run", false), exec("b", "run", false)));
    assert!(select_command(&devfile, CommandGroupKind::Run, None).unwrap().is_none());
}

#[test]
fn push_commands_default_selection() {
    let devfile = test_fixtures::node();
    let push = PushCommands::select(&devfile, &CommandSelection::default()).unwrap();
    assert_eq!(push.build.as_ref().map(ResolvedCommand::name), Some("devbuild"));
    assert_eq!(push.run.name(), "devrun");
    assert_eq!(push.run_group, CommandGroupKind::Run);
    assert_eq!(push.post_start.len(), 1);
    assert_eq!(push.post_start[0].leaf_names(), vec!["apply-config", "lint"]);
}

#[test]
fn push_commands_debug_mode_uses_debug_group() {
    let devfile = test_fixtures::node();
    let selection = CommandSelection { debug_mode: true, ..Default::default() };
    let push = PushCommands::select(&devfile, &selection).unwrap();
    assert_eq!(push.run.name(), "devdebug");
    assert_eq!(push.run_group, CommandGroupKind::Debug);
}

#[test]
fn build_is_optional() {
    let devfile = devfile_with(&exec("start", "run", false));
    let push = PushCommands::select(&devfile, &CommandSelection::default()).unwrap();
    assert!(push.build.is_none());
}

#[test]
fn named_build_is_required() {
    let devfile = devfile_with(&exec("start", "run", false));
    let selection = CommandSelection { build: Some("compile".into()), ..Default::default() };
    let err = PushCommands::select(&devfile, &selection).unwrap_err();
    assert_eq!(err.kind(), "CommandNotFoundError");
}

#[test]
fn missing_run_group_is_no_default() {
    let devfile = devfile_with(&exec("compile", "build", false));
    let err = PushCommands::select(&devfile, &CommandSelection::default()).unwrap_err();
    assert!(matches!(err, DevfileError::NoDefaultCommand(CommandGroupKind::Run)));
}
