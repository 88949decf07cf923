// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_fixtures;
use crate::VarOverrides;

fn devfile(projects: &str, container_extra: &str) -> Devfile {
    let yaml = format!(
        "schemaVersion: 2.2.0\n{projects}components:\n  - name: app\n    container:\n      image: alpine\n{container_extra}"
    );
    Devfile::parse(&yaml, &VarOverrides::new()).unwrap()
}

#[test]
fn no_projects_maps_to_projects_root() {
    let targets = source_targets(&devfile("", "")).unwrap();
    assert_eq!(
        targets,
        vec![SourceTarget { container: "app".into(), remote_dir: "/projects".into() }]
    );
}

#[test]
fn first_project_name_is_subdirectory() {
    let targets = source_targets(&test_fixtures::node()).unwrap();
    assert_eq!(targets.len(), 1, "tools does not mount sources");
    assert_eq!(targets[0].container, "runtime");
    assert_eq!(targets[0].remote_dir, "/projects/web");
}

#[test]
fn clone_path_wins_over_project_name() {
    let projects = "projects:\n  - name: web\n    clonePath: src/web/\n";
    let targets = source_targets(&devfile(projects, "")).unwrap();
    assert_eq!(targets[0].remote_dir, "/projects/src/web");
}

#[test]
fn source_mapping_wins_over_projects() {
    let projects = "projects:\n  - name: web\n";
    let targets = source_targets(&devfile(projects, "      sourceMapping: /opt/app/\n")).unwrap();
    assert_eq!(targets[0].remote_dir, "/opt/app");
}

#[yare::parameterized(
    absolute = { "/etc" },
    parent   = { "../outside" },
    nested   = { "a/../../b" },
)]
fn clone_path_must_stay_inside(path: &str) {
    let projects = format!("projects:\n  - name: web\n    clonePath: {path}\n");
    let err = source_targets(&devfile(&projects, "")).unwrap_err();
    assert!(matches!(err, DevfileError::InvalidClonePath { .. }));
}
