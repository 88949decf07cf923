// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dl_core::Platform;

#[tokio::test]
async fn missing_devfile_is_no_component() {
    let h = Harness::new();
    std::fs::remove_file(h.root().join("devfile.yaml")).unwrap();

    let err = start(h.options(), h.deps()).await.err().unwrap();

    assert_eq!(err.kind(), "NoComponentError");
    assert!(h.mirror.calls().is_empty());
    assert!(!h.root().join(".devloop").join("session.lock").exists());
}

#[tokio::test]
async fn unknown_build_command_fails_before_pushing() {
    let h = Harness::new();
    let mut options = h.options();
    options.selection.build = Some("nope".to_string());

    let err = start(options, h.deps()).await.err().unwrap();

    assert_eq!(err.kind(), "CommandNotFoundError");
    assert!(h.mirror.calls().is_empty());
    assert!(h.exec.calls().is_empty());
}

#[tokio::test]
async fn second_session_in_same_directory_is_rejected() {
    let h = Harness::new();
    let mut first = h.start().await;
    first.wait_for_sync().await.unwrap();

    let mut options = h.options();
    options.pid = PID + 1;
    let err = start(options, h.deps()).await.err().unwrap();
    assert_eq!(err.kind(), "SessionAlreadyRunning");
    assert!(err.to_string().contains(&format!("(pid {PID})")), "{err}");

    first.stop().await.unwrap();
}

#[tokio::test]
async fn live_session_on_same_platform_is_rejected() {
    let h = Harness::new();
    let other = DevState { pid: 777, platform: Some(Platform::Cluster), ..Default::default() };
    dl_storage::json::write_json_atomic(&pid_state_path(h.root(), 777), &other).unwrap();
    h.probe.set_alive(777);

    let err = start(h.options(), h.deps()).await.err().unwrap();

    assert_eq!(err.kind(), "AlreadyRunningOnPlatform");
    assert!(h.mirror.calls().is_empty());
}

#[tokio::test]
async fn pin_for_unknown_endpoint_is_rejected() {
    let h = Harness::new();
    let mut options = h.options();
    options.port_forwards = vec![PortPin::parse("8080:9999").unwrap()];

    let err = start(options, h.deps()).await.err().unwrap();

    assert!(err.to_string().contains("9999"), "{err}");
    assert!(h.exec.calls().is_empty());
}

#[tokio::test]
async fn initial_sync_pushes_builds_runs_and_forwards() {
    let h = Harness::new();
    h.write("server.js", "console.log('hi')");
    let mut session = h.start().await;

    let ports = session.wait_for_sync().await.unwrap();

    assert!(h.remote_exists("server.js"));
    assert!(!h.remote_exists("devfile.yaml"));
    assert_eq!(h.exec.labels(), vec!["devbuild", "devrun"]);
    assert_eq!(h.applier.live().len(), 1);
    assert_eq!(session.state(), SessionState::Running);

    assert_eq!(ports.len(), 1, "debug endpoint is only forwarded in debug mode");
    assert_eq!(ports[0].port_name, "http-3000");
    assert!((20001..30001).contains(&ports[0].local_port));
    let state = h.state_file(PID).unwrap();
    assert_eq!(state.forwarded_ports, ports);
    assert_eq!(state.applied_resources.len(), 1);
    assert!(h.reporter.contains(&format!("Forwarding from 127.0.0.1:{} -> 3000", ports[0].local_port)));

    session.stop().await.unwrap();
}

#[tokio::test]
async fn debug_session_forwards_debug_endpoint() {
    let h = Harness::new();
    let mut options = h.options();
    options.selection.debug_mode = true;
    h.write(
        "devfile.yaml",
        &DEVFILE.replace(
            "  - id: apply-config",
            "  - id: devdebug\n    exec: { component: runtime, commandLine: npm start -- --inspect, group: { kind: debug, isDefault: true } }\n  - id: apply-config",
        ),
    );
    let mut session = h.start_with(options).await;

    let ports = session.wait_for_sync().await.unwrap();

    let names: Vec<&str> = ports.iter().map(|p| p.port_name.as_str()).collect();
    assert_eq!(names, vec!["http-3000", "debug"]);
    assert!(ports[1].is_debug);
    assert_eq!(h.exec.labels(), vec!["devbuild", "devdebug"]);

    session.stop().await.unwrap();
}

#[tokio::test]
async fn custom_build_runs_instead_of_default() {
    let h = Harness::new();
    let marker = h.mirror.path("runtime", "/projects/custom-build-marker");
    h.exec.respond(
        "custom-build-marker",
        ExecResponse::ok().effect(move |_| {
            std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
            std::fs::write(&marker, "").unwrap();
        }),
    );
    let mut options = h.options();
    options.selection.build = Some("my-custom-build".to_string());
    let mut session = h.start_with(options).await;

    session.wait_for_sync().await.unwrap();

    assert!(h.remote_exists("custom-build-marker"));
    assert!(h.reporter.contains("Building your application in container (command: my-custom-build)"));
    assert!(!h.reporter.contains("(command: devbuild)"));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn failing_build_fails_the_cycle() {
    let h = Harness::new();
    h.exec.respond("npm install", ExecResponse::fail(1, "npm ERR! missing script: install"));
    let mut session = h.start().await;

    let err = session.wait_for_sync().await.unwrap_err();

    assert_eq!(err.kind(), "BuildFailureError");
    let message = err.to_string();
    assert!(message.contains("devbuild"), "{message}");
    assert!(message.contains("npm ERR! missing script"), "{message}");
    assert_eq!(session.state(), SessionState::Failed);
    assert!(!h.exec.labels().contains(&"devrun".to_string()));
    assert!(h.tunnels.attempts().is_empty());
    session.stop().await.unwrap();
}

#[tokio::test]
async fn failing_run_reports_error_status_and_stderr() {
    let h = Harness::new();
    h.exec.respond("npm start", ExecResponse::fail(1, "Error: Cannot find module 'express'"));
    let mut session = h.start().await;

    let err = session.wait_for_sync().await.unwrap_err();

    assert_eq!(err.kind(), "RunFailureError");
    let message = err.to_string();
    assert!(message.contains("exited with an error status"), "{message}");
    assert!(message.contains("Cannot find module 'express'"), "{message}");
    assert!(h.reporter.contains("exited with an error status"));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn unwritable_state_file_is_reported_and_session_runs() {
    let h = Harness::new();
    std::fs::create_dir_all(h.root().join(".devloop").join("devstate.json.tmp")).unwrap();
    let mut session = h.start().await;

    let ports = session.wait_for_sync().await.unwrap();

    assert!(!ports.is_empty());
    assert_eq!(session.state(), SessionState::Running);
    assert!(h.reporter.contains("Could not update the dev state file"), "{:?}", h.reporter.messages());
    assert!(h.state_file(PID).is_none());
    session.stop().await.unwrap();
}
