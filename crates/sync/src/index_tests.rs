// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use std::fs;

fn setup() -> (tempfile::TempDir, IgnoreRules) {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/main.js"), "console.log(1)").unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    (dir, IgnoreRules::fixed(Some("devfile.yaml")))
}

#[test]
fn scan_records_files_and_dirs() {
    let (dir, ignore) = setup();
    let index = FileIndex::scan(dir.path(), &ignore).unwrap();
    let keys: Vec<&str> = index.files.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["package.json", "src/", "src/main.js"]);
    assert_eq!(index.files["package.json"].size, 2);
    assert_eq!(index.files["package.json"].signature.len(), 64);
}

#[test]
fn scan_skips_ignored_and_metadata() {
    let (dir, mut ignore) = setup();
    fs::create_dir_all(dir.path().join(".devloop")).unwrap();
    fs::write(dir.path().join(".devloop/devstate.json"), "{}").unwrap();
    fs::write(dir.path().join("devfile.yaml"), "schemaVersion: 2.2.0").unwrap();
    fs::create_dir_all(dir.path().join("node_modules/x")).unwrap();
    fs::write(dir.path().join("node_modules/x/index.js"), "").unwrap();
    ignore.add_lines("node_modules/\n");

    let index = FileIndex::scan(dir.path(), &ignore).unwrap();
    assert!(index.files.keys().all(|k| !k.starts_with(".devloop")
        && !k.starts_with("node_modules")
        && k != "devfile.yaml"));
}

#[test]
fn same_size_edit_is_modified() {
    let (dir, ignore) = setup();
    let before = FileIndex::scan(dir.path(), &ignore).unwrap();
    fs::write(dir.path().join("src/main.js"), "console.log(2)").unwrap();

    let (after, changes) = poll(dir.path(), &before, &ignore).unwrap();
    assert_eq!(changes.modified, vec!["src/main.js"]);
    assert!(changes.added.is_empty() && changes.deleted.is_empty());
    assert_eq!(after.files["src/main.js"].size, before.files["src/main.js"].size);
}

#[test]
fn touch_without_content_change_is_not_modified() {
    let (dir, ignore) = setup();
    let before = FileIndex::scan(dir.path(), &ignore).unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    let (_, changes) = poll(dir.path(), &before, &ignore).unwrap();
    assert!(changes.is_empty());
}

#[test]
fn added_and_deleted_are_distinct() {
    let (dir, ignore) = setup();
    let before = FileIndex::scan(dir.path(), &ignore).unwrap();
    fs::remove_file(dir.path().join("package.json")).unwrap();
    fs::create_dir_all(dir.path().join("lib")).unwrap();
    fs::write(dir.path().join("lib/util.js"), "x").unwrap();

    let (_, changes) = poll(dir.path(), &before, &ignore).unwrap();
    assert_eq!(changes.added, vec!["lib/", "lib/util.js"]);
    assert_eq!(changes.deleted, vec!["package.json"]);
    assert_eq!(changes.len(), 3);
    assert_eq!(changes.to_push().collect::<Vec<_>>(), vec!["lib/", "lib/util.js"]);
}

#[test]
fn deleted_dir_collapses_children() {
    let (dir, ignore) = setup();
    let before = FileIndex::scan(dir.path(), &ignore).unwrap();
    fs::remove_dir_all(dir.path().join("src")).unwrap();

    let (_, changes) = poll(dir.path(), &before, &ignore).unwrap();
    assert_eq!(changes.deleted, vec!["src/", "src/main.js"]);
    assert_eq!(changes.deletions(), vec!["src/"]);
}

#[test]
fn save_and_load_round_trip() {
    let (dir, ignore) = setup();
    let index = FileIndex::scan(dir.path(), &ignore).unwrap();
    index.save(dir.path()).unwrap();

    assert!(dir.path().join(".devloop/file-index.json").exists());
    assert_eq!(FileIndex::load(dir.path()), index);
}

#[test]
fn index_json_layout() {
    let (dir, ignore) = setup();
    FileIndex::scan(dir.path(), &ignore).unwrap().save(dir.path()).unwrap();
    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(FileIndex::path_for(dir.path())).unwrap()).unwrap();
    assert_eq!(raw["files"]["package.json"]["size"], 2);
    assert!(raw["files"]["package.json"]["signature"].is_string());
}

#[test]
fn corrupt_index_loads_empty() {
    let (dir, _) = setup();
    fs::create_dir_all(dir.path().join(".devloop")).unwrap();
    fs::write(FileIndex::path_for(dir.path()), "garbage").unwrap();
    assert!(FileIndex::load(dir.path()).is_empty());
}

fn entry(sig: &str) -> FileEntry {
    FileEntry { size: sig.len() as u64, signature: sig.to_string() }
}

proptest! {
    #[test]
    fn diff_partitions_paths(
        old in proptest::collection::btree_map("[a-e]{1,2}", "[xy]", 0..8),
        new in proptest::collection::btree_map("[a-e]{1,2}", "[xy]", 0..8),
    ) {
        let before = FileIndex { files: old.iter().map(|(k, v)| (k.clone(), entry(v))).collect() };
        let after = FileIndex { files: new.iter().map(|(k, v)| (k.clone(), entry(v))).collect() };
        let changes = before.diff(&after);

        for path in &changes.added {
            prop_assert!(!old.contains_key(path) && new.contains_key(path));
        }
        for path in &changes.deleted {
            prop_assert!(old.contains_key(path) && !new.contains_key(path));
        }
        for path in &changes.modified {
            prop_assert!(old[path] != new[path]);
        }
        let unchanged = new.iter().filter(|(k, v)| old.get(*k) == Some(*v)).count();
        prop_assert_eq!(changes.added.len() + changes.modified.len() + unchanged, new.len());
        prop_assert!(before.diff(&before).is_empty());
    }
}
