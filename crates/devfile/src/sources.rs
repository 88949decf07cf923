// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where source files land inside each container

use crate::devfile::Devfile;
use crate::error::DevfileError;

/// Default mount point of the project sources.
pub const DEFAULT_SOURCE_MAPPING: &str = "/projects";

/// A container receiving synced sources, and the directory they land in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTarget {
    pub container: String,
    pub remote_dir: String,
}

/// Compute sync destinations for every container that mounts sources.
///
/// An explicit `sourceMapping` is used as-is. Otherwise sources land under
/// `/projects`, in the first project's `clonePath` (or name) when the
/// devfile declares projects.
pub fn source_targets(devfile: &Devfile) -> Result<Vec<SourceTarget>, DevfileError> {
    let project_dir = match devfile.projects.first() {
        Some(project) => {
            let sub = project.clone_path.as_deref().unwrap_or(&project.name);
            validate_clone_path(&project.name, sub)?;
            Some(sub.trim_matches('/').to_string())
        }
        None => None,
    };

    Ok(devfile
        .containers()
        .filter(|(_, container)| container.mount_sources)
        .map(|(name, container)| {
            let remote_dir = match (&container.source_mapping, &project_dir) {
                (Some(mapping), _) => mapping.trim_end_matches('/').to_string(),
                (None, Some(sub)) if !sub.is_empty() => format!("{DEFAULT_SOURCE_MAPPING}/{sub}"),
                (None, _) => DEFAULT_SOURCE_MAPPING.to_string(),
            };
            SourceTarget { container: name.to_string(), remote_dir }
        })
        .collect())
}

fn validate_clone_path(project: &str, path: &str) -> Result<(), DevfileError> {
    let escapes = path.starts_with('/') || path.split('/').any(|segment| segment == "..");
    if escapes {
        return Err(DevfileError::InvalidClonePath {
            project: project.to_string(),
            path: path.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "sources_tests.rs"]
mod tests;
