// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-directory session lock

use crate::error::StorageError;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

pub const LOCK_FILE: &str = "session.lock";

/// Exclusive lock on `<root>/.devloop/session.lock`, held for the whole session.
///
/// The lock is released when the guard is dropped (or the process dies).
#[derive(Debug)]
pub struct SessionLock {
    _file: File,
    path: PathBuf,
}

impl SessionLock {
    /// Lock `root` for the session whose state files are keyed by `pid`.
    pub fn acquire(root: &Path, pid: u32) -> Result<Self, StorageError> {
        let dir = root.join(dl_core::METADATA_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        let path = dir.join(LOCK_FILE);

        // Open without truncating so a running session's PID survives a failed attempt
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        if file.try_lock_exclusive().is_err() {
            return Err(StorageError::SessionAlreadyRunning { pid: Self::holder_pid(root) });
        }

        let mut file = file;
        file.set_len(0).map_err(|e| StorageError::io(&path, e))?;
        writeln!(file, "{pid}").map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!(path = %path.display(), "acquired session lock");

        Ok(SessionLock { _file: file, path })
    }

    /// PID recorded by the current (or last) lock holder.
    pub fn holder_pid(root: &Path) -> Option<u32> {
        let path = root.join(dl_core::METADATA_DIR).join(LOCK_FILE);
        std::fs::read_to_string(path).ok()?.trim().parse().ok()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SessionLock::acquire(dir.path(), 4242).unwrap();

        let err = SessionLock::acquire(dir.path(), 4343).unwrap_err();
        assert!(matches!(err, StorageError::SessionAlreadyRunning { pid: Some(4242) }));
        assert_eq!(SessionLock::holder_pid(dir.path()), Some(4242));

        drop(lock);
        SessionLock::acquire(dir.path(), 4343).unwrap();
        assert_eq!(SessionLock::holder_pid(dir.path()), Some(4343));
    }

    #[test]
    fn records_session_pid() {
        let dir = tempfile::tempdir().unwrap();
        let lock = SessionLock::acquire(dir.path(), 41_000).unwrap();
        assert!(lock.path().ends_with(".devloop/session.lock"));
        assert_eq!(SessionLock::holder_pid(dir.path()), Some(41_000));
    }
}
