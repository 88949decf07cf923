// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dl_adapters::PushCall;

#[tokio::test]
async fn deleted_file_is_removed_remotely_and_restored_on_recreate() {
    let h = Harness::new();
    h.write("src/app.js", "v1");
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    assert!(h.remote_exists("src/app.js"));

    std::fs::remove_file(h.root().join("src/app.js")).unwrap();
    let action = session.press_key('p').await.unwrap();
    assert!(matches!(action, KeyAction::Synced(_)));
    assert!(!h.remote_exists("src/app.js"));
    assert!(h.remote_exists("src"));

    h.write("src/app.js", "v2");
    session.press_key('p').await.unwrap();
    assert_eq!(
        std::fs::read_to_string(h.mirror.path("runtime", "/projects/src/app.js")).unwrap(),
        "v2"
    );
    session.stop().await.unwrap();
}

#[tokio::test]
async fn gitignored_files_are_never_pushed() {
    let h = Harness::new();
    h.write(".gitignore", "node_modules/\n*.log\n");
    h.write("index.js", "1");
    h.write("debug.log", "noise");
    h.write("node_modules/left-pad/index.js", "pad");
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();

    h.write("trace.log", "more noise");
    h.write("node_modules/left-pad/README.md", "docs");
    session.press_key('p').await.unwrap();

    let uploaded = h.mirror.uploaded();
    assert!(uploaded.contains(&"index.js".to_string()));
    assert!(uploaded.iter().all(|p| !p.ends_with(".log")), "{uploaded:?}");
    assert!(uploaded.iter().all(|p| !p.starts_with("node_modules")), "{uploaded:?}");
    assert!(uploaded.iter().all(|p| !p.starts_with(".devloop")), "{uploaded:?}");
    session.stop().await.unwrap();
}

#[tokio::test]
async fn manual_sync_without_changes_keeps_run_command() {
    let h = Harness::new();
    h.write("index.js", "1");
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    let pushes = h.mirror.calls().len();

    session.press_key('p').await.unwrap();

    assert_eq!(h.mirror.calls().len(), pushes);
    let labels = h.exec.labels();
    assert_eq!(labels.iter().filter(|l| *l == "devbuild").count(), 1, "{labels:?}");
    assert!(h.exec.scripts_containing("kill $p").is_empty());
    assert_eq!(session.status().cycles, 2);
    session.stop().await.unwrap();
}

#[tokio::test]
async fn change_rebuilds_and_restarts_run_command() {
    let h = Harness::new();
    h.write("index.js", "1");
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();

    h.write("index.js", "2");
    let action = session.press_key('p').await.unwrap();

    let labels = h.exec.labels();
    assert_eq!(labels.iter().filter(|l| *l == "devbuild").count(), 2, "{labels:?}");
    assert_eq!(h.exec.scripts_containing("echo $$ >").len(), 2, "{labels:?}");
    assert_eq!(h.exec.scripts_containing("kill $p").len(), 1);
    // Forwards survive the restart
    let KeyAction::Synced(ports) = action else { panic!("expected a sync") };
    assert_eq!(ports, session.status().ports);
    assert_eq!(h.tunnels.attempts().len(), 1);
    session.stop().await.unwrap();
}

#[tokio::test]
async fn failed_session_recovers_on_next_sync() {
    let h = Harness::new();
    h.exec.respond("npm install", ExecResponse::fail(1, "npm ERR!"));
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap_err();
    assert_eq!(session.state(), SessionState::Failed);

    h.exec.respond("npm install", ExecResponse::ok());
    h.write("package.json", "{}");
    session.press_key('p').await.unwrap();

    assert_eq!(session.state(), SessionState::Running);
    assert!(session.status().last_error.is_none());
    session.stop().await.unwrap();
}

#[tokio::test]
async fn upload_failure_fails_the_cycle() {
    let h = Harness::new();
    h.write("index.js", "1");
    h.mirror.set_fail_uploads(true);
    let mut session = h.start().await;

    let err = session.wait_for_sync().await.unwrap_err();

    assert!(err.to_string().contains("upload rejected"), "{err}");
    assert!(h.exec.calls().is_empty());
    session.stop().await.unwrap();
}

#[tokio::test]
async fn restart_deletes_paths_removed_while_stopped() {
    let h = Harness::new();
    h.write("old.js", "1");
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();
    session.stop().await.unwrap();

    std::fs::remove_file(h.root().join("old.js")).unwrap();
    let mut session = h.start().await;
    session.wait_for_sync().await.unwrap();

    assert!(h.mirror.calls().iter().any(|c| matches!(
        c,
        PushCall::Remove { remote_paths, .. } if remote_paths == &vec!["/projects/old.js".to_string()]
    )));
    assert!(!h.remote_exists("old.js"));
    session.stop().await.unwrap();
}

#[tokio::test]
async fn watcher_pushes_changes_without_key_press() {
    let h = Harness::new();
    h.write("index.js", "1");
    let mut options = h.options();
    options.watch = true;
    options.settings.sync_debounce = Duration::from_millis(50);
    let mut session = h.start_with(options).await;
    session.wait_for_sync().await.unwrap();

    h.write("added.js", "new");

    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !h.remote_exists("added.js") && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    assert!(h.remote_exists("added.js"));
    assert!(h.reporter.contains("Watching for changes"));
    session.stop().await.unwrap();
}
