// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn spec(command_line: &str) -> ExecSpec {
    ExecSpec {
        component: "runtime".to_string(),
        command_line: command_line.to_string(),
        working_dir: None,
        env: Vec::new(),
        hot_reload_capable: false,
    }
}

#[test]
fn exec_script_defaults_to_source_dir() {
    assert_eq!(exec_script(&spec("npm install"), Some("/projects")), "cd '/projects' && npm install");
}

#[test]
fn exec_script_prefers_working_dir_and_exports_env() {
    let mut spec = spec("make");
    spec.working_dir = Some("/src/app".to_string());
    spec.env = vec![("MODE".to_string(), "dev mode".to_string())];
    assert_eq!(
        exec_script(&spec, Some("/projects")),
        "export MODE='dev mode'; cd '/src/app' && make"
    );
}

#[test]
fn exec_script_without_any_dir() {
    assert_eq!(exec_script(&spec("ls"), None), "ls");
}

#[test]
fn run_script_records_pid_and_execs() {
    let script = run_script("devrun", &spec("npm start"), Some("/projects"));
    assert_eq!(
        script,
        "mkdir -p /tmp/.devloop && echo $$ > /tmp/.devloop/devrun.pid; cd '/projects' && exec sh -c 'npm start'"
    );
}

#[test]
fn liveness_and_stop_share_pid_file() {
    assert!(alive_script("devrun").contains("/tmp/.devloop/devrun.pid"));
    assert!(stop_script("devrun").contains("rm -f /tmp/.devloop/devrun.pid"));
}
