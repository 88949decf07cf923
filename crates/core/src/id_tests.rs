// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_session_id_has_prefix_and_suffix() {
    let id = SessionId::new();
    assert!(id.as_str().starts_with("ses-"));
    assert_eq!(id.suffix().len(), 12);
}

#[test]
fn session_ids_are_unique() {
    assert_ne!(SessionId::new(), SessionId::new());
}

#[test]
fn foreign_ids_keep_their_text() {
    let id = SessionId::from("legacy");
    assert_eq!(id.suffix(), "legacy");
    assert_eq!(id.to_string(), "legacy");
}

#[test]
fn id_serializes_transparently() {
    let id = SessionId::from("ses-xyz");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"ses-xyz\"");
}
