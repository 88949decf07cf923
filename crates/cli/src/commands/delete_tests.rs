// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dl_adapters::FakeApplier;
use dl_storage::json::write_json_atomic;
use dl_storage::{pid_state_path, DevState, FakeProbe};
use tempfile::TempDir;

const OWN_PID: u32 = 1;

fn config_map(name: &str) -> AppliedResource {
    AppliedResource {
        api_version: "v1".to_string(),
        kind: "ConfigMap".to_string(),
        name: name.to_string(),
        namespace: Some("default".to_string()),
    }
}

fn write_state(root: &Path, pid: u32, resources: Vec<AppliedResource>) -> PathBuf {
    let path = pid_state_path(root, pid);
    let state = DevState {
        pid,
        platform: Some(Platform::Cluster),
        applied_resources: resources,
        ..Default::default()
    };
    write_json_atomic(&path, &state).unwrap();
    path
}

#[tokio::test]
async fn removes_dead_session_state_and_resources() {
    let dir = TempDir::new().unwrap();
    let path = write_state(dir.path(), 500, vec![config_map("web-config")]);
    let applier = FakeApplier::new();
    applier.insert(config_map("web-config"));

    let summary = reconcile(dir.path(), OWN_PID, &FakeProbe::default(), &applier).await.unwrap();

    assert_eq!(summary.deleted_resources, vec![config_map("web-config")]);
    assert_eq!(summary.removed_state_files, vec![path.clone()]);
    assert!(!path.exists());
    assert!(applier.live().is_empty());
}

#[tokio::test]
async fn live_sessions_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = write_state(dir.path(), 600, vec![config_map("web-config")]);
    let applier = FakeApplier::new();

    let summary = reconcile(dir.path(), OWN_PID, &FakeProbe::with_alive(&[600]), &applier).await.unwrap();

    assert_eq!(summary.live_sessions, vec![600]);
    assert!(summary.removed_state_files.is_empty());
    assert!(applier.deleted().is_empty());
    assert!(path.exists());
}

#[tokio::test]
async fn shared_resources_are_deleted_once() {
    let dir = TempDir::new().unwrap();
    write_state(dir.path(), 700, vec![config_map("shared")]);
    write_state(dir.path(), 701, vec![config_map("shared")]);
    let applier = FakeApplier::new();

    let summary = reconcile(dir.path(), OWN_PID, &FakeProbe::default(), &applier).await.unwrap();

    assert_eq!(applier.deleted(), vec![config_map("shared")]);
    assert_eq!(summary.removed_state_files.len(), 2);
}

#[tokio::test]
async fn empty_directory_has_nothing_to_do() {
    let dir = TempDir::new().unwrap();
    let summary = reconcile(dir.path(), OWN_PID, &FakeProbe::default(), &FakeApplier::new()).await.unwrap();
    assert_eq!(summary, DeleteSummary::default());
}

#[test]
fn podman_orphans_do_not_need_a_cluster() {
    let podman = OrphanState {
        path: PathBuf::from("devstate.9.json"),
        state: DevState { pid: 9, platform: Some(Platform::Podman), ..Default::default() },
    };
    assert!(!needs_cluster(&[podman]));

    let cluster = OrphanState {
        path: PathBuf::from("devstate.10.json"),
        state: DevState {
            pid: 10,
            platform: Some(Platform::Cluster),
            applied_resources: vec![config_map("web-config")],
            ..Default::default()
        },
    };
    assert!(needs_cluster(&[cluster]));
}
