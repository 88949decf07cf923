// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Platform resources created by apply commands.

use serde::{Deserialize, Serialize};

/// A resource created (or reconciled) by an apply command during a session.
///
/// Recorded in the dev state file so that `dl delete` can clean up after a
/// session that was killed without graceful teardown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResource {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl AppliedResource {
    /// Resources are matched by kind + name; re-applying the same pair is an update.
    pub fn same_identity(&self, other: &AppliedResource) -> bool {
        self.kind == other.kind && self.name == other.name && self.namespace == other.namespace
    }
}

impl std::fmt::Display for AppliedResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}
