// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for platform adapters.

/// Podman binary (`PODMAN_CMD`, default `podman`).
pub fn podman_cmd() -> String {
    non_empty("PODMAN_CMD").unwrap_or_else(|| "podman".to_string())
}

/// kubectl binary (`KUBECTL_CMD`, default `kubectl`).
pub fn kubectl_cmd() -> String {
    non_empty("KUBECTL_CMD").unwrap_or_else(|| "kubectl".to_string())
}

/// Cluster namespace for workloads and applied resources (`DL_NAMESPACE`, default `default`).
pub fn namespace() -> String {
    non_empty("DL_NAMESPACE").unwrap_or_else(|| "default".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}
