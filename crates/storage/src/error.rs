// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dl_core::Platform;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("a dev session is already running in this directory{}", pid.map(|p| format!(" (pid {p})")).unwrap_or_default())]
    SessionAlreadyRunning { pid: Option<u32> },

    #[error("a dev session is already running on platform {platform} (pid {pid})")]
    AlreadyRunningOnPlatform { platform: Platform, pid: u32 },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io { path: path.into(), source }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::Io { .. } | StorageError::Json { .. } => "StatePersistenceError",
            StorageError::SessionAlreadyRunning { .. } => "SessionAlreadyRunning",
            StorageError::AlreadyRunningOnPlatform { .. } => "AlreadyRunningOnPlatform",
        }
    }
}
