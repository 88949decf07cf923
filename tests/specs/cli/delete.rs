//! `dl delete`

use crate::prelude::*;

#[test]
fn nothing_to_clean_up() {
    let project = Project::with_devfile();
    project.dl().args(&["delete"]).passes().stdout_has("Nothing to clean up");
}

#[test]
fn outside_a_project_creates_no_state_directory() {
    let project = Project::empty();
    project.dl().args(&["delete"]).passes().stdout_has("Nothing to clean up");
    assert!(!project.exists(".devloop"));
}

#[test]
fn removes_state_of_dead_podman_session() {
    let project = Project::with_devfile();
    project.file(
        ".devloop/devstate.999999.json",
        r#"{"pid": 999999, "platform": "podman", "forwardedPorts": []}"#,
    );

    project.dl().args(&["delete"]).passes().stdout_has("Removed 1 state file(s)");

    assert!(!project.exists(".devloop/devstate.999999.json"));
}

#[test]
fn json_summary() {
    let project = Project::with_devfile();
    let run = project.dl().args(&["delete", "-o", "json"]).passes();
    let json = run.stdout_json();
    assert_eq!(json["removedStateFiles"], serde_json::json!([]));
    assert_eq!(json["liveSessions"], serde_json::json!([]));
}
