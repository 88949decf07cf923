// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dl delete`: clean up after sessions that ended without teardown.
//!
//! A killed session leaves its state file behind, along with every
//! resource its apply commands created. Live sessions are never touched.

use crate::color;
use crate::output::OutputFormat;
use anyhow::Result;
use dl_adapters::{KubeApplier, PlatformApplier, ResourceApplier};
use dl_core::{AppliedResource, Platform};
use dl_storage::json::remove_if_exists;
use dl_storage::{orphan_states, read_pid_states, OrphanState, ProcessProbe, SystemProbe};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    pub deleted_resources: Vec<AppliedResource>,
    /// Resources whose deletion failed; their state file is kept for a retry.
    pub failed_resources: Vec<AppliedResource>,
    pub removed_state_files: Vec<PathBuf>,
    /// PIDs of sessions still running in this directory.
    pub live_sessions: Vec<u32>,
}

/// Delete the resources of dead sessions, then their state files.
pub async fn reconcile<A: ResourceApplier>(
    root: &Path,
    own_pid: u32,
    probe: &dyn ProcessProbe,
    applier: &A,
) -> Result<DeleteSummary> {
    let mut summary = DeleteSummary {
        live_sessions: read_pid_states(root)?
            .into_iter()
            .map(|(_, state)| state.pid)
            .filter(|pid| *pid != 0 && *pid != own_pid && probe.is_alive(*pid))
            .collect(),
        ..Default::default()
    };

    for orphan in orphan_states(root, own_pid, probe)? {
        let mut clean = true;
        for resource in &orphan.state.applied_resources {
            if summary.deleted_resources.iter().any(|r| r.same_identity(resource)) {
                continue;
            }
            match applier.delete(resource).await {
                Ok(()) => summary.deleted_resources.push(resource.clone()),
                Err(e) => {
                    tracing::warn!(%resource, error = %e, "failed to delete resource");
                    summary.failed_resources.push(resource.clone());
                    clean = false;
                }
            }
        }
        if clean {
            remove_if_exists(&orphan.path)?;
            tracing::info!(path = %orphan.path.display(), pid = orphan.state.pid, "removed orphan state");
            summary.removed_state_files.push(orphan.path);
        }
    }
    Ok(summary)
}

pub async fn handle(root: &Path, format: OutputFormat) -> Result<()> {
    let probe = SystemProbe;
    let own_pid = std::process::id();
    let orphans = orphan_states(root, own_pid, &probe)?;
    let applier = if needs_cluster(&orphans) {
        PlatformApplier::Cluster(KubeApplier::connect(dl_adapters::env::namespace()).await?)
    } else {
        PlatformApplier::Podman
    };

    let summary = reconcile(root, own_pid, &probe, &applier).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Text => print_text(&summary),
    }
    if !summary.failed_resources.is_empty() {
        anyhow::bail!("{} resource(s) could not be deleted", summary.failed_resources.len());
    }
    Ok(())
}

/// Podman sessions never record applied resources.
fn needs_cluster(orphans: &[OrphanState]) -> bool {
    orphans
        .iter()
        .any(|o| o.state.platform != Some(Platform::Podman) && !o.state.applied_resources.is_empty())
}

fn print_text(summary: &DeleteSummary) {
    for resource in &summary.deleted_resources {
        println!(" •  Deleted {resource}");
    }
    for resource in &summary.failed_resources {
        println!(" {}  Failed to delete {resource}", color::warn("⚠"));
    }
    for pid in &summary.live_sessions {
        println!(" {}  Session {pid} is still running, stop it first", color::warn("⚠"));
    }
    if summary.removed_state_files.is_empty() && summary.deleted_resources.is_empty() {
        println!("Nothing to clean up");
    } else {
        println!("Removed {} state file(s)", summary.removed_state_files.len());
    }
}

#[cfg(test)]
#[path = "delete_tests.rs"]
mod tests;
