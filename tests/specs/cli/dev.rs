//! `dl dev` failures that happen before any platform call

use crate::prelude::*;

#[test]
fn missing_devfile_is_reported_as_json() {
    let project = Project::empty();
    let run = project.dl().args(&["dev", "-o", "json"]).fails();
    let envelope = run.stderr_json();
    assert_eq!(envelope["kind"], "NoComponentError");
    assert!(envelope["message"].as_str().unwrap_or_default().contains("devfile"));
}

#[test]
fn missing_devfile_in_text_mode() {
    let project = Project::empty();
    project.dl().args(&["dev"]).fails().stderr_has("Error:");
}

#[test]
fn missing_devfile_leaves_no_state_directory() {
    let project = Project::empty();
    project.dl().args(&["dev"]).fails();
    assert!(!project.exists(".devloop"));
}

#[test]
fn random_ports_conflict_with_pins() {
    let project = Project::with_devfile();
    project
        .dl()
        .args(&["dev", "--random-ports", "--port-forward", "8080:3000"])
        .code(2)
        .stderr_has("--random-ports");
}

#[test]
fn malformed_port_pin_is_a_usage_error() {
    let project = Project::with_devfile();
    project.dl().args(&["dev", "--port-forward", "eighty"]).code(2);
}

#[test]
fn unknown_platform_is_a_usage_error() {
    let project = Project::with_devfile();
    project.dl().args(&["dev", "--platform", "docker"]).code(2).stderr_has("docker");
}

#[test]
fn undefined_variable_override_fails() {
    let project = Project::empty();
    project.file(
        "devfile.yaml",
        r#"
schemaVersion: 2.2.0
metadata:
  name: web
components:
  - name: runtime
    container:
      image: "{{IMAGE}}"
"#,
    );
    let run = project.dl().args(&["dev", "-o", "json"]).fails();
    assert_eq!(run.stderr_json()["kind"], "InvalidVariablesError");
}
