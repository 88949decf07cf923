// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Forwarded ports and the platform they run on.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Where the component's containers run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Cluster,
    Podman,
}

crate::simple_display! {
    Platform {
        Cluster => "cluster",
        Podman => "podman",
    }
}

#[derive(Debug, Error)]
#[error("unknown platform {0:?} (expected \"cluster\" or \"podman\")")]
pub struct PlatformParseError(pub String);

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cluster" => Ok(Platform::Cluster),
            "podman" => Ok(Platform::Podman),
            other => Err(PlatformParseError(other.to_string())),
        }
    }
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Cluster, Platform::Podman];
}

/// Endpoint exposure as declared in the devfile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exposure {
    #[default]
    Public,
    Internal,
    None,
}

/// One local listener tunneling to a container port.
///
/// Serialized verbatim into the dev state file; field names are part of the
/// on-disk format read by `dl describe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardedPort {
    pub container_name: String,
    pub port_name: String,
    pub local_address: String,
    pub local_port: u16,
    pub container_port: u16,
    #[serde(default)]
    pub is_debug: bool,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure: Option<Exposure>,
}

impl ForwardedPort {
    /// Identity of the remote side, independent of the chosen local port.
    pub fn endpoint_key(&self) -> (&str, &str, u16) {
        (&self.container_name, &self.port_name, self.container_port)
    }

    pub fn local_url(&self) -> String {
        format!("{}:{}", self.local_address, self.local_port)
    }
}

impl std::fmt::Display for ForwardedPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {}:{} -> {}:{}",
            self.container_name,
            self.local_address,
            self.local_port,
            self.port_name,
            self.container_port
        )
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
