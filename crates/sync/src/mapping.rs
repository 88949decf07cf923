// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local to remote path mapping, computed once per session

use crate::error::SyncError;
use dl_devfile::{source_targets, Devfile, SourceTarget};

/// Every container that receives sources, with its destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    targets: Vec<SourceTarget>,
}

impl SyncPlan {
    pub fn from_devfile(devfile: &Devfile) -> Result<Self, SyncError> {
        let targets = source_targets(devfile)?;
        for target in &targets {
            tracing::debug!(container = %target.container, remote_dir = %target.remote_dir, "sync target");
        }
        Ok(Self { targets })
    }

    pub fn new(targets: Vec<SourceTarget>) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &[SourceTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Remote path for a relative index key. Directory keys keep no trailing slash.
pub fn remote_path(remote_dir: &str, rel: &str) -> String {
    let rel = rel.trim_end_matches('/');
    let dir = remote_dir.trim_end_matches('/');
    if rel.is_empty() {
        dir.to_string()
    } else {
        format!("{dir}/{rel}")
    }
}
