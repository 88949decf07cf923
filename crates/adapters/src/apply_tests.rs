// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const CONFIG: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: web-config
data:
  PORT: "3000"
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web-worker
  namespace: jobs
---
"#;

#[test]
fn parse_skips_empty_documents() {
    let objects = parse_manifest(CONFIG).unwrap();
    assert_eq!(objects.len(), 2);
}

#[test]
fn identity_defaults_namespace() {
    let objects = parse_manifest(CONFIG).unwrap();
    let config = identity(&objects[0], "dev").unwrap();
    assert_eq!(config.to_string(), "ConfigMap/web-config");
    assert_eq!(config.namespace.as_deref(), Some("dev"));

    let worker = identity(&objects[1], "dev").unwrap();
    assert_eq!(worker.api_version, "apps/v1");
    assert_eq!(worker.namespace.as_deref(), Some("jobs"));
}

#[yare::parameterized(
    no_kind = { "metadata:\n  name: x\n" },
    no_name = { "apiVersion: v1\nkind: ConfigMap\nmetadata: {}\n" },
    not_map = { "- a\n- b\n" },
)]
fn parse_rejects_incomplete(manifest: &str) {
    assert!(matches!(parse_manifest(manifest), Err(AdapterError::Manifest(_))));
}

#[yare::parameterized(
    core  = { "v1", "ConfigMap", "", "v1" },
    group = { "apps/v1", "Deployment", "apps", "v1" },
)]
fn splits_api_version(api_version: &str, kind: &str, group: &str, version: &str) {
    let parsed = gvk(api_version, kind);
    assert_eq!(parsed.group, group);
    assert_eq!(parsed.version, version);
    assert_eq!(parsed.kind, kind);
}

#[tokio::test]
async fn fake_reapply_does_not_duplicate() {
    let applier = FakeApplier::new();
    applier.apply(CONFIG).await.unwrap();
    applier.apply(CONFIG).await.unwrap();

    assert_eq!(applier.live().len(), 2);
    assert_eq!(applier.apply_count(), 2);
}

#[tokio::test]
async fn fake_delete_removes_resource() {
    let applier = FakeApplier::new();
    let applied = applier.apply(CONFIG).await.unwrap();
    applier.delete(&applied[0]).await.unwrap();

    assert_eq!(applier.live(), vec![applied[1].clone()]);
    assert_eq!(applier.deleted(), vec![applied[0].clone()]);
}

#[tokio::test]
async fn podman_applier_skips_apply() {
    let applied = PlatformApplier::Podman.apply(CONFIG).await.unwrap();
    assert!(applied.is_empty());
}
