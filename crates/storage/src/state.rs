// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dev state files
//!
//! Each session writes `<root>/.devloop/devstate.<pid>.json`. The shared
//! `devstate.json` mirrors the session that owns it: a writer claims it when
//! it is free, already its own, or left behind by a dead process.

use crate::error::StorageError;
use crate::json::{read_json, remove_if_exists, write_json_atomic};
use crate::probe::ProcessProbe;
use dl_core::{AppliedResource, ForwardedPort, Platform};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

pub const COMMON_STATE_FILE: &str = "devstate.json";

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static PID_STATE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^devstate\.[0-9]+\.json$").expect("constant regex pattern is valid")
});

/// Content of a dev state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevState {
    #[serde(default)]
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub forwarded_ports: Vec<ForwardedPort>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_resources: Vec<AppliedResource>,
}

/// A state file whose writer is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanState {
    pub path: PathBuf,
    pub state: DevState,
}

pub fn state_dir(root: &Path) -> PathBuf {
    root.join(dl_core::METADATA_DIR)
}

pub fn pid_state_path(root: &Path, pid: u32) -> PathBuf {
    state_dir(root).join(format!("devstate.{pid}.json"))
}

/// Single writer of one session's state file.
pub struct StateStore {
    root: PathBuf,
    pid: u32,
    platform: Platform,
    probe: Arc<dyn ProcessProbe>,
    content: DevState,
}

impl StateStore {
    pub fn new(root: &Path, pid: u32, platform: Platform, probe: Arc<dyn ProcessProbe>) -> Self {
        Self {
            root: root.to_path_buf(),
            pid,
            platform,
            probe,
            content: DevState { pid, platform: Some(platform), ..Default::default() },
        }
    }

    pub fn path(&self) -> PathBuf {
        pid_state_path(&self.root, self.pid)
    }

    pub fn content(&self) -> &DevState {
        &self.content
    }

    /// Write the initial (empty) state, failing if another live session owns this platform.
    pub fn init(&mut self) -> Result<(), StorageError> {
        self.save()
    }

    pub fn set_forwarded_ports(&mut self, ports: Vec<ForwardedPort>) -> Result<(), StorageError> {
        self.content.forwarded_ports = ports;
        self.save()
    }

    /// Record a resource created by an apply command. Re-applying the same
    /// kind + name replaces the previous entry.
    pub fn record_applied(&mut self, resource: AppliedResource) -> Result<(), StorageError> {
        self.content.applied_resources.retain(|r| !r.same_identity(&resource));
        self.content.applied_resources.push(resource);
        self.save()
    }

    pub fn forget_applied(&mut self, resource: &AppliedResource) -> Result<(), StorageError> {
        self.content.applied_resources.retain(|r| !r.same_identity(resource));
        self.save()
    }

    /// Read this session's state file back from disk.
    pub fn load(&self) -> Result<DevState, StorageError> {
        Ok(read_json(&self.path())?.unwrap_or_default())
    }

    /// Clear the state on graceful exit: drop this session's file and free
    /// the shared file if this session owns it.
    pub fn save_exit(&mut self) -> Result<(), StorageError> {
        self.content = DevState::default();
        remove_if_exists(&self.path())?;
        self.save_common_if_owner()
    }

    fn save(&mut self) -> Result<(), StorageError> {
        self.content.pid = self.pid;
        self.content.platform = Some(self.platform);
        self.check_first_in_platform()?;
        self.save_common_if_owner()?;
        write_json_atomic(&self.path(), &self.content)
    }

    fn save_common_if_owner(&self) -> Result<(), StorageError> {
        let path = state_dir(&self.root).join(COMMON_STATE_FILE);
        let owner = read_lenient(&path).pid;
        let free = owner == 0 || owner == self.pid || !self.probe.is_alive(owner);
        if !free {
            tracing::debug!(owner, "shared state file owned by another session");
            return Ok(());
        }
        write_json_atomic(&path, &self.content)
    }

    fn check_first_in_platform(&self) -> Result<(), StorageError> {
        for (_, state) in read_pid_states(&self.root)? {
            if state.platform != Some(self.platform) || state.pid == self.pid || state.pid == 0 {
                continue;
            }
            if self.probe.is_alive(state.pid) {
                return Err(StorageError::AlreadyRunningOnPlatform {
                    platform: self.platform,
                    pid: state.pid,
                });
            }
        }
        Ok(())
    }
}

/// Read a state file, treating empty or corrupt content as default.
fn read_lenient(path: &Path) -> DevState {
    match read_json::<DevState>(path) {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
            DevState::default()
        }
    }
}

/// Every per-session state file under `root`, sorted by file name.
pub fn read_pid_states(root: &Path) -> Result<Vec<(PathBuf, DevState)>, StorageError> {
    let dir = state_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StorageError::io(&dir, e)),
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|entry| PID_STATE_FILE.is_match(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    Ok(paths.into_iter().map(|path| {
        let state = read_lenient(&path);
        (path, state)
    }).collect())
}

/// Forwarded ports of every session, optionally restricted to one platform.
pub fn read_forwarded_ports(
    root: &Path,
    platform: Option<Platform>,
) -> Result<Vec<ForwardedPort>, StorageError> {
    let ports = read_pid_states(root)?
        .into_iter()
        .filter(|(_, state)| state.platform.is_some())
        .filter(|(_, state)| platform.is_none() || state.platform == platform)
        .flat_map(|(_, state)| state.forwarded_ports)
        .collect();
    Ok(ports)
}

/// State files (per-session and shared) left by processes that are no longer alive.
pub fn orphan_states(
    root: &Path,
    own_pid: u32,
    probe: &dyn ProcessProbe,
) -> Result<Vec<OrphanState>, StorageError> {
    let mut candidates = read_pid_states(root)?;
    let common = state_dir(root).join(COMMON_STATE_FILE);
    if common.exists() {
        let state = read_lenient(&common);
        candidates.push((common, state));
    }

    Ok(candidates
        .into_iter()
        .filter(|(_, state)| state.pid != 0 && state.pid != own_pid)
        .filter(|(_, state)| !probe.is_alive(state.pid))
        .map(|(path, state)| OrphanState { path, state })
        .collect())
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
