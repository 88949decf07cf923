// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell scripts executed inside containers
//!
//! Long-lived run/debug commands record their PID under [`PID_DIR`] so a
//! later exec can check or stop them without holding the original stream.

use dl_adapters::shell::shell_quote;
use dl_devfile::ExecSpec;

/// Remote directory holding one PID file per running command.
pub const PID_DIR: &str = "/tmp/.devloop";

pub fn pid_file(command: &str) -> String {
    format!("{PID_DIR}/{command}.pid")
}

/// `export K='v'; cd '<dir>' && ` prefix shared by every exec.
fn prelude(spec: &ExecSpec, default_dir: Option<&str>) -> String {
    let mut script = String::new();
    for (key, value) in &spec.env {
        script.push_str(&format!("export {key}={}; ", shell_quote(value)));
    }
    if let Some(dir) = spec.working_dir.as_deref().or(default_dir) {
        script.push_str(&format!("cd {} && ", shell_quote(dir)));
    }
    script
}

/// Script for a command that runs to completion.
pub fn exec_script(spec: &ExecSpec, default_dir: Option<&str>) -> String {
    format!("{}{}", prelude(spec, default_dir), spec.command_line)
}

/// Script for a long-lived command: record the shell PID, then replace the
/// shell with the command so the PID stays valid.
pub fn run_script(command: &str, spec: &ExecSpec, default_dir: Option<&str>) -> String {
    format!(
        "mkdir -p {PID_DIR} && echo $$ > {pid}; {prelude}exec sh -c {cmd}",
        pid = pid_file(command),
        prelude = prelude(spec, default_dir),
        cmd = shell_quote(&spec.command_line),
    )
}

/// Exits zero when the recorded process is still alive.
pub fn alive_script(command: &str) -> String {
    let pid = pid_file(command);
    format!("test -f {pid} && kill -0 $(cat {pid}) 2>/dev/null")
}

/// Stop the recorded process and its children, then drop the PID file.
pub fn stop_script(command: &str) -> String {
    let pid = pid_file(command);
    format!(
        "if [ -f {pid} ]; then p=$(cat {pid}); pkill -P $p 2>/dev/null; kill $p 2>/dev/null; rm -f {pid}; fi; true"
    )
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
