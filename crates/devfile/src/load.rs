// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Devfile discovery

use crate::devfile::Devfile;
use crate::error::DevfileError;
use crate::vars::VarOverrides;
use std::path::{Path, PathBuf};

/// Candidate file names, in lookup order.
pub const DEVFILE_NAMES: [&str; 4] = ["devfile.yaml", ".devfile.yaml", "devfile.yml", ".devfile.yml"];

/// Locate the devfile in `dir`.
pub fn find_devfile(dir: &Path) -> Result<PathBuf, DevfileError> {
    DEVFILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| DevfileError::NoComponent { dir: dir.to_path_buf() })
}

/// Find, read and parse the devfile in `dir`.
pub fn load_devfile(dir: &Path, overrides: &VarOverrides) -> Result<Devfile, DevfileError> {
    let path = find_devfile(dir)?;
    let content = std::fs::read_to_string(&path)
        .map_err(|source| DevfileError::Io { path: path.clone(), source })?;
    let devfile = Devfile::parse(&content, overrides)?.with_location(&path);
    tracing::debug!(
        path = %path.display(),
        component = %devfile.name,
        commands = devfile.commands.len(),
        "loaded devfile"
    );
    Ok(devfile)
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
