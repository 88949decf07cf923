// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn extract_script_creates_target_dir() {
    assert_eq!(
        extract_script("/projects/web"),
        "mkdir -p '/projects/web' && tar -xf - -C '/projects/web'"
    );
}

#[test]
fn remove_script_quotes_each_path() {
    let paths = vec!["/projects/a b.txt".to_string(), "/projects/it's".to_string()];
    assert_eq!(remove_script(&paths), "rm -rf -- '/projects/a b.txt' '/projects/it'\\''s'");
}

#[tokio::test]
async fn mirror_upload_then_remove() {
    let local = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    std::fs::create_dir_all(local.path().join("src")).unwrap();
    std::fs::write(local.path().join("src/app.js"), "console.log(1)").unwrap();

    let mirror = LocalMirror::new(remote.path());
    let paths = vec!["src/".to_string(), "src/app.js".to_string()];
    mirror.upload("runtime", "/projects", local.path(), &paths).await.unwrap();

    let copied = mirror.path("runtime", "/projects/src/app.js");
    assert_eq!(std::fs::read_to_string(&copied).unwrap(), "console.log(1)");
    assert_eq!(mirror.uploaded(), paths);

    mirror.remove("runtime", &["/projects/src".to_string()]).await.unwrap();
    assert!(!copied.exists());
}

#[tokio::test]
async fn mirror_remove_missing_is_ok() {
    let remote = TempDir::new().unwrap();
    let mirror = LocalMirror::new(remote.path());
    mirror.remove("runtime", &["/projects/gone.txt".to_string()]).await.unwrap();
    assert_eq!(mirror.calls().len(), 1);
}

#[tokio::test]
async fn mirror_can_reject_uploads() {
    let local = TempDir::new().unwrap();
    let remote = TempDir::new().unwrap();
    let mirror = LocalMirror::new(remote.path());
    mirror.set_fail_uploads(true);

    let err = mirror.upload("runtime", "/projects", local.path(), &["a".to_string()]).await;
    assert!(err.is_err());
}
