//! `dl describe`

use crate::prelude::*;

#[test]
fn describes_component_without_sessions() {
    let project = Project::with_devfile();
    project
        .dl()
        .args(&["describe"])
        .passes()
        .stdout_has("Name: web")
        .stdout_has("Running in: None")
        .stdout_has("install")
        .stdout_lacks("Forwarded ports:");
}

#[test]
fn json_output_lists_commands() {
    let project = Project::with_devfile();
    let run = project.dl().args(&["describe", "-o", "json"]).passes();
    let json = run.stdout_json();
    assert_eq!(json["name"], "web");
    assert_eq!(json["runningIn"], serde_json::json!([]));
    similar_asserts::assert_eq!(
        json["commands"],
        serde_json::json!([
            {"name": "install", "kind": "exec", "group": "build"},
            {"name": "start", "kind": "exec", "group": "run"},
        ])
    );
}

#[test]
fn dead_sessions_are_not_running() {
    let project = Project::with_devfile();
    // Far above any PID the test runner spawns
    project.file(
        ".devloop/devstate.999999.json",
        r#"{"pid": 999999, "platform": "cluster", "forwardedPorts": []}"#,
    );
    project.dl().args(&["describe"]).passes().stdout_has("Running in: None");
}

#[test]
fn missing_devfile_fails() {
    let project = Project::empty();
    let run = project.dl().args(&["describe", "-o", "json"]).fails();
    assert_eq!(run.stderr_json()["kind"], "NoComponentError");
}
