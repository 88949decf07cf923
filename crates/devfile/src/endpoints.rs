// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Endpoints eligible for port forwarding

use crate::devfile::Devfile;
use dl_core::Exposure;

/// A container port that a session may forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerEndpoint {
    pub container: String,
    pub name: String,
    pub target_port: u16,
    pub exposure: Exposure,
    pub is_debug: bool,
}

/// Endpoints named `debug` or `debug-*` carry the debugger port.
pub fn is_debug_endpoint(name: &str) -> bool {
    name == "debug" || name.starts_with("debug-")
}

/// Endpoints to forward for a session, in devfile order.
///
/// Endpoints with exposure `none` are never forwarded. Debug endpoints are
/// only forwarded when the session runs in debug mode.
pub fn forwardable_endpoints(devfile: &Devfile, debug: bool) -> Vec<ContainerEndpoint> {
    devfile
        .containers()
        .flat_map(|(container_name, container)| {
            container.endpoints.iter().map(move |ep| ContainerEndpoint {
                container: container_name.to_string(),
                name: ep.name.clone(),
                target_port: ep.target_port,
                exposure: ep.exposure.unwrap_or_default(),
                is_debug: is_debug_endpoint(&ep.name),
            })
        })
        .filter(|ep| ep.exposure != Exposure::None)
        .filter(|ep| debug || !ep.is_debug)
        .collect()
}
