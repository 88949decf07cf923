// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dl_storage::COMMON_STATE_FILE;

#[tokio::test]
async fn stop_clears_ports_and_deletes_applied_resources() {
    let h = Harness::new();
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    assert_eq!(h.tunnels.active().len(), 1);

    session.stop().await.unwrap();

    assert!(h.tunnels.active().is_empty());
    assert!(h.state_file(PID).is_none());
    let common: DevState =
        read_json(&h.root().join(".devloop").join(COMMON_STATE_FILE)).unwrap().unwrap_or_default();
    assert!(common.forwarded_ports.is_empty());
    assert_eq!(h.applier.deleted().len(), 1);
    assert!(h.applier.live().is_empty());
    assert!(h.reporter.contains("Deleted ConfigMap/web-config"));
}

#[tokio::test]
async fn stop_releases_the_directory() {
    let h = Harness::new();
    let mut first = h.start().await;
    first.wait_for_sync().await.unwrap();
    first.stop().await.unwrap();

    let mut second = h.start().await;
    second.wait_for_sync().await.unwrap();
    assert_eq!(second.state(), SessionState::Running);
    second.stop().await.unwrap();
}

#[tokio::test]
async fn stop_runs_pre_stop_and_kills_run_command() {
    let h = Harness::new();
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();

    session.stop().await.unwrap();

    let labels = h.exec.labels();
    assert!(labels.contains(&"farewell".to_string()), "{labels:?}");
    assert_eq!(h.exec.scripts_containing("kill $p").len(), 1);
    let run = h.exec.calls().into_iter().find(|c| c.label == "devrun").unwrap();
    assert_eq!(run.status, Some(dl_adapters::ExecStatus::Cancelled));
}

#[tokio::test]
async fn keep_resources_leaves_applied_resources() {
    let h = Harness::new();
    let mut options = h.options();
    options.keep_resources = true;
    let mut session = h.start_with(options).await;
    session.wait_for_sync().await.unwrap();

    session.stop().await.unwrap();

    assert!(h.applier.deleted().is_empty());
    assert_eq!(h.applier.live().len(), 1);
    assert!(h.state_file(PID).is_none());
}

#[tokio::test]
async fn failing_pre_stop_does_not_block_teardown() {
    let h = Harness::new();
    h.exec.respond("./farewell.sh", ExecResponse::fail(3, "bye failed"));
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();

    session.stop().await.unwrap();

    assert!(h.reporter.contains("preStop command \"farewell\" failed"));
    assert_eq!(h.applier.deleted().len(), 1);
    assert!(h.state_file(PID).is_none());
}

#[tokio::test]
async fn kill_leaves_state_for_delete() {
    let h = Harness::new();
    let mut session = h.start().await;
    let ports = session.wait_for_sync().await.unwrap();

    session.kill().await;

    let state = h.state_file(PID).unwrap();
    assert_eq!(state.forwarded_ports, ports);
    assert_eq!(state.applied_resources.len(), 1);
    assert!(h.applier.deleted().is_empty());
    assert!(!h.exec.labels().contains(&"farewell".to_string()));
    assert!(h.tunnels.active().is_empty());
}

#[tokio::test]
async fn kill_during_build_waits_for_build_command_and_skips_run() {
    let h = Harness::new();
    h.exec.respond("npm install", ExecResponse::ok().after(Duration::from_millis(100)));
    let session = h.start().await;
    while !h.exec.labels().contains(&"devbuild".to_string()) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    session.kill().await;

    let build = h.exec.calls().into_iter().find(|c| c.label == "devbuild").unwrap();
    assert_eq!(build.status, Some(dl_adapters::ExecStatus::Exited(0)));
    assert!(!h.exec.labels().contains(&"devrun".to_string()));
}

#[tokio::test]
async fn restart_after_kill_reuses_ports() {
    let h = Harness::new();
    let mut killed = h.start().await;
    let before = killed.wait_for_sync().await.unwrap();
    killed.kill().await;

    let mut options = h.options();
    options.pid = PID + 1;
    let mut session = h.start_with(options).await;
    let after = session.wait_for_sync().await.unwrap();

    assert_eq!(after[0].local_port, before[0].local_port);
    session.stop().await.unwrap();
}

#[tokio::test]
async fn random_ports_skips_killed_session_ports() {
    let h = Harness::new();
    let mut killed = h.start().await;
    let before = killed.wait_for_sync().await.unwrap();
    killed.kill().await;
    let attempts_before = h.tunnels.attempts().len();

    let mut options = h.options();
    options.pid = PID + 1;
    options.random_ports = true;
    options.settings.port_range = before[0].local_port..before[0].local_port + 1;
    h.tunnels.set_busy(before[0].local_port);
    let mut session = h.start_with(options).await;
    let err = session.wait_for_sync().await.unwrap_err();

    // The recorded port was not tried ahead of the single random pick
    assert_eq!(err.kind(), "PortAllocationError");
    assert_eq!(h.tunnels.attempts().len() - attempts_before, 1);
    session.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_key_is_ignored() {
    let h = Harness::new();
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    let cycles = session.status().cycles;

    let action = session.press_key('x').await.unwrap();

    assert_eq!(action, KeyAction::Ignored('x'));
    assert_eq!(session.status().cycles, cycles);
    assert!(h.reporter.contains("Unknown key 'x' ignored"));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn stopped_session_rejects_keys() {
    let h = Harness::new();
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    let status = session.status.clone();
    let events = session.events.clone();
    session.stop().await.unwrap();

    assert_eq!(status.borrow().state, SessionState::Stopped);
    let (reply, _rx) = tokio::sync::oneshot::channel();
    assert!(events.send(coordinator::SessionEvent::Sync { reply }).await.is_err());
}
