// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors from platform adapters
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} {action} failed: {stderr}")]
    CommandFailed { program: String, action: String, stderr: String },

    #[error("no running workload found for component {component:?}")]
    WorkloadNotFound { component: String },

    #[error("local port {0} is already in use")]
    AddrInUse(u16),

    #[error("port tunnel failed: {0}")]
    Tunnel(String),

    #[error("kubernetes API error: {0}")]
    Kube(String),

    #[error("invalid manifest: {0}")]
    Manifest(String),
}

impl From<kube::Error> for AdapterError {
    fn from(e: kube::Error) -> Self {
        AdapterError::Kube(e.to_string())
    }
}
