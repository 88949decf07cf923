// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File index and change detection
//!
//! The index maps slash-separated relative paths to their size and a
//! SHA-256 content signature. Directories are recorded with a trailing `/`
//! so that removed directories can be deleted remotely as a whole.

use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const INDEX_FILE: &str = "file-index.json";

const DIR_SIGNATURE: &str = "directory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub size: u64,
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIndex {
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
}

/// Paths that differ between two indexes. Each list is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.modified.len() + self.deleted.len()
    }

    /// Paths whose content must be copied to the remote side.
    pub fn to_push(&self) -> impl Iterator<Item = &str> {
        self.added.iter().chain(self.modified.iter()).map(String::as_str)
    }

    /// Deleted paths, dropping any already covered by a deleted parent directory.
    pub fn deletions(&self) -> Vec<&str> {
        let dirs: Vec<&str> =
            self.deleted.iter().filter(|p| is_dir_key(p)).map(String::as_str).collect();
        self.deleted
            .iter()
            .map(String::as_str)
            .filter(|p| !dirs.iter().any(|d| *p != *d && p.starts_with(*d)))
            .collect()
    }
}

pub fn is_dir_key(key: &str) -> bool {
    key.ends_with('/')
}

impl FileIndex {
    /// Walk `root`, skipping ignored paths, and sign every file.
    pub fn scan(root: &Path, ignore: &IgnoreRules) -> Result<Self, SyncError> {
        let mut files = BTreeMap::new();
        let walker = WalkDir::new(root).follow_links(false).sort_by_file_name().into_iter();
        let walker = walker.filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            match relative_key(root, entry.path()) {
                Some(rel) => !ignore.is_ignored(&rel, entry.file_type().is_dir()),
                None => false,
            }
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if is_vanished(&e) => continue,
                Err(e) => return Err(SyncError::Walk(e)),
            };
            if entry.depth() == 0 {
                continue;
            }
            let Some(rel) = relative_key(root, entry.path()) else {
                continue;
            };
            let file_type = entry.file_type();
            if file_type.is_dir() {
                let entry = FileEntry { size: 0, signature: DIR_SIGNATURE.to_string() };
                files.insert(format!("{rel}/"), entry);
            } else if file_type.is_file() {
                if let Some(file) = sign_file(entry.path())? {
                    files.insert(rel, file);
                }
            } else {
                tracing::debug!(path = %rel, "skipping non-regular file");
            }
        }
        Ok(FileIndex { files })
    }

    /// Compare against a newer index of the same root.
    pub fn diff(&self, current: &FileIndex) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (path, entry) in &current.files {
            match self.files.get(path) {
                None => changes.added.push(path.clone()),
                Some(previous) if previous != entry => changes.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        for path in self.files.keys() {
            if !current.files.contains_key(path) {
                changes.deleted.push(path.clone());
            }
        }
        changes
    }

    pub fn path_for(root: &Path) -> PathBuf {
        root.join(dl_core::METADATA_DIR).join(INDEX_FILE)
    }

    /// Load the persisted index. A missing or corrupt index is treated as
    /// empty, which makes the next sync push everything.
    pub fn load(root: &Path) -> FileIndex {
        let path = Self::path_for(root);
        match dl_storage::json::read_json(&path) {
            Ok(index) => index.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable file index");
                FileIndex::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> Result<(), SyncError> {
        dl_storage::json::write_json_atomic(&Self::path_for(root), self)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Scan `root` and diff against `previous`.
pub fn poll(
    root: &Path,
    previous: &FileIndex,
    ignore: &IgnoreRules,
) -> Result<(FileIndex, ChangeSet), SyncError> {
    let current = FileIndex::scan(root, ignore)?;
    let changes = previous.diff(&current);
    Ok((current, changes))
}

/// Slash-separated path of `path` relative to `root`.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn sign_file(path: &Path) -> Result<Option<FileEntry>, SyncError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        // Removed between listing and reading; the next poll reports it
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SyncError::io(path, e)),
    };
    Ok(Some(FileEntry {
        size: bytes.len() as u64,
        signature: format!("{:x}", Sha256::digest(&bytes)),
    }))
}

fn is_vanished(e: &walkdir::Error) -> bool {
    e.io_error().is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound)
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
