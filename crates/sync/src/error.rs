// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dl_devfile::DevfileError;
use dl_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Mapping(#[from] DevfileError),

    /// A change touched an ignored path. Never fatal; the path is skipped.
    #[error("{path} is ignored and will not be synced")]
    IgnoredConflict { path: String },
}

impl SyncError {
    /// Stable error name for the JSON error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Storage(e) => e.kind(),
            SyncError::Mapping(e) => e.kind(),
            SyncError::IgnoredConflict { .. } => "SyncIgnoredConflictError",
            SyncError::Io { .. } | SyncError::Walk(_) | SyncError::Watch(_) => "SyncError",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io { path: path.into(), source }
    }
}
