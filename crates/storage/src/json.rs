// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON files

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Write `value` as pretty JSON, replacing `path` atomically.
///
/// The content goes to a sibling `.tmp` file first and is renamed over the
/// target, so readers never observe a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }
    let json = serde_json::to_vec_pretty(value)
        .map_err(|source| StorageError::Json { path: path.to_path_buf(), source })?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(|e| StorageError::io(&tmp_path, e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| StorageError::io(path, e))
}

/// Read JSON from `path`. A missing file is `Ok(None)`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StorageError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StorageError::Json { path: path.to_path_buf(), source })
}

/// Remove `path`, treating a missing file as success.
pub fn remove_if_exists(path: &Path) -> Result<(), StorageError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data.json");
        let value: BTreeMap<String, u32> = [("a".to_string(), 1)].into();

        write_json_atomic(&path, &value).unwrap();

        assert_eq!(read_json::<BTreeMap<String, u32>>(&path).unwrap(), Some(value));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_json::<u32>(&dir.path().join("nope.json")).unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = read_json::<u32>(&path).unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
        assert_eq!(err.kind(), "StatePersistenceError");
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_if_exists(&dir.path().join("gone.json")).unwrap();
    }
}
