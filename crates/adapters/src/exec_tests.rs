// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

fn req(label: &str, script: &str) -> ExecRequest {
    ExecRequest { label: label.to_string(), container: "runtime".to_string(), script: script.to_string() }
}

#[tokio::test]
async fn forward_lines_splits_output() {
    let (tx, mut rx) = mpsc::channel(8);
    forward_lines(&b"one\ntwo\n"[..], Stream::Stderr, tx).await;

    let first = rx.recv().await.unwrap();
    assert_eq!(first, OutputLine { stream: Stream::Stderr, text: "one".to_string() });
    assert_eq!(rx.recv().await.unwrap().text, "two");
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn fake_unmatched_succeeds() {
    let fake = FakeExecAdapter::new();
    let (tx, _rx) = mpsc::channel(8);
    let status = fake.exec(req("build", "make"), tx, CancellationToken::new()).await.unwrap();
    assert!(status.success());
    assert_eq!(fake.labels(), vec!["build"]);
}

#[tokio::test]
async fn fake_failure_emits_stderr() {
    let fake = FakeExecAdapter::new();
    fake.respond("make", ExecResponse::fail(2, "make: *** missing target"));
    let (tx, mut rx) = mpsc::channel(8);

    let status = fake.exec(req("build", "cd /projects && make"), tx, CancellationToken::new()).await.unwrap();

    assert_eq!(status, ExecStatus::Exited(2));
    assert_eq!(rx.recv().await.unwrap().text, "make: *** missing target");
    assert_eq!(fake.calls()[0].status, Some(ExecStatus::Exited(2)));
}

#[tokio::test]
async fn fake_hang_until_cancelled() {
    let fake = FakeExecAdapter::new();
    fake.respond("npm start", ExecResponse::hang());
    let cancel = CancellationToken::new();
    let (tx, _rx) = mpsc::channel(8);

    let task = {
        let fake = fake.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { fake.exec(req("run", "npm start"), tx, cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    assert_eq!(task.await.unwrap().unwrap(), ExecStatus::Cancelled);
}

#[test]
fn only_zero_exit_is_success() {
    assert!(ExecStatus::Exited(0).success());
    assert!(!ExecStatus::Exited(1).success());
    assert!(!ExecStatus::Killed.success());
    assert!(!ExecStatus::Cancelled.success());
}
