//! Help and version output

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_with_usage_code() {
    cli().code(2).stderr_has("Usage:");
}

#[test]
fn help_lists_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("dev")
        .stdout_has("describe")
        .stdout_has("delete");
}

#[test]
fn dev_help_shows_flags() {
    cli()
        .args(&["dev", "--help"])
        .passes()
        .stdout_has("--no-watch")
        .stdout_has("--random-ports")
        .stdout_has("--port-forward")
        .stdout_has("--platform");
}

#[test]
fn version_shows_package_version() {
    cli().args(&["--version"]).passes().stdout_has("0.2");
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    cli().args(&["deploy"]).code(2).stderr_has("deploy");
}
