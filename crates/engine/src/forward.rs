// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port-forward manager
//!
//! Opens one tunnel per forwardable endpoint and keeps the session's state
//! file in step with the set of open tunnels.

use crate::report::{persistence_warning, Reporter};
use dl_adapters::{AdapterError, PortTunneler, TunnelHandle, TunnelSpec};
use dl_core::{ForwardedPort, Platform};
use dl_devfile::ContainerEndpoint;
use dl_storage::StateStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::ops::Range;
use thiserror::Error;

pub const LOCAL_ADDRESS: &str = "127.0.0.1";

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("unable to allocate a local port for endpoint {endpoint:?} after {attempts} attempts")]
    PortAllocation { endpoint: String, attempts: u32 },

    #[error("invalid port forward {spec:?}: expected LOCAL:CONTAINER or LOCAL:CONTAINER_NAME:CONTAINER")]
    InvalidSpec { spec: String },

    #[error("port forward {spec:?} does not match any forwarded endpoint")]
    UnknownEndpoint { spec: String },

    #[error("endpoint {endpoint:?}: {source}")]
    Tunnel {
        endpoint: String,
        #[source]
        source: AdapterError,
    },
}

impl ForwardError {
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::PortAllocation { .. } => "PortAllocationError",
            ForwardError::InvalidSpec { .. } | ForwardError::UnknownEndpoint { .. } => "InvalidPortForwardError",
            ForwardError::Tunnel { .. } => "PortForwardError",
        }
    }
}

/// A `--port-forward` pin of a local port to a container port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPin {
    pub local_port: u16,
    pub container: Option<String>,
    pub container_port: u16,
    spec: String,
}

impl PortPin {
    /// Parse `LOCAL:CONTAINER_PORT` or `LOCAL:CONTAINER_NAME:CONTAINER_PORT`.
    pub fn parse(spec: &str) -> Result<Self, ForwardError> {
        let invalid = || ForwardError::InvalidSpec { spec: spec.to_string() };
        let parts: Vec<&str> = spec.split(':').collect();
        let (local, container, port) = match parts.as_slice() {
            [local, port] => (*local, None, *port),
            [local, container, port] if !container.is_empty() => (*local, Some(container.to_string()), *port),
            _ => return Err(invalid()),
        };
        let local_port: u16 = local.parse().map_err(|_| invalid())?;
        let container_port: u16 = port.parse().map_err(|_| invalid())?;
        if local_port == 0 || container_port == 0 {
            return Err(invalid());
        }
        Ok(Self { local_port, container, container_port, spec: spec.to_string() })
    }

    fn matches(&self, endpoint: &ContainerEndpoint) -> bool {
        self.container_port == endpoint.target_port
            && self.container.as_deref().is_none_or(|c| c == endpoint.container)
    }
}

/// Fail on pins that name no endpoint, or pins sharing a local port.
pub fn validate_pins(pins: &[PortPin], endpoints: &[ContainerEndpoint]) -> Result<(), ForwardError> {
    let mut locals = HashSet::new();
    for pin in pins {
        if !endpoints.iter().any(|e| pin.matches(e)) || !locals.insert(pin.local_port) {
            return Err(ForwardError::UnknownEndpoint { spec: pin.spec.clone() });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardConfig {
    pub address: String,
    pub range: Range<u16>,
    pub attempts: u32,
    pub pins: Vec<PortPin>,
    /// Ports recorded for the same endpoints by an earlier session, tried first.
    pub previous: Vec<ForwardedPort>,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            address: LOCAL_ADDRESS.to_string(),
            range: crate::config::DEFAULT_PORT_RANGE_START..crate::config::DEFAULT_PORT_RANGE_END,
            attempts: crate::config::DEFAULT_PORT_ATTEMPTS,
            pins: Vec::new(),
            previous: Vec::new(),
        }
    }
}

struct ActiveForward {
    port: ForwardedPort,
    handle: TunnelHandle,
}

pub struct PortForwardManager<T> {
    tunneler: T,
    platform: Platform,
    config: ForwardConfig,
    rng: StdRng,
    active: Vec<ActiveForward>,
}

impl<T: PortTunneler> PortForwardManager<T> {
    pub fn new(tunneler: T, platform: Platform, config: ForwardConfig) -> Self {
        Self::with_rng(tunneler, platform, config, StdRng::from_os_rng())
    }

    pub fn with_rng(tunneler: T, platform: Platform, config: ForwardConfig, rng: StdRng) -> Self {
        Self { tunneler, platform, config, rng, active: Vec::new() }
    }

    /// Currently forwarded ports, in endpoint order.
    pub fn ports(&self) -> Vec<ForwardedPort> {
        self.active.iter().map(|a| a.port.clone()).collect()
    }

    /// Forward every endpoint not already forwarded and close tunnels for
    /// endpoints no longer declared. Persists after each change.
    pub async fn forward(
        &mut self,
        endpoints: &[ContainerEndpoint],
        store: &mut StateStore,
        reporter: &dyn Reporter,
    ) -> Result<Vec<ForwardedPort>, ForwardError> {
        let (keep, stale): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active)
            .into_iter()
            .partition(|a| endpoints.iter().any(|e| endpoint_key(e) == a.port.endpoint_key()));
        self.active = keep;
        if !stale.is_empty() {
            for forward in stale {
                tracing::info!(port = %forward.port, "closing forward for removed endpoint");
                forward.handle.close().await;
            }
            self.persist(store, reporter);
        }

        for endpoint in endpoints {
            if self.active.iter().any(|a| a.port.endpoint_key() == endpoint_key(endpoint)) {
                continue;
            }
            let (local_port, handle) = self.open(endpoint).await?;
            let port = ForwardedPort {
                container_name: endpoint.container.clone(),
                port_name: endpoint.name.clone(),
                local_address: self.config.address.clone(),
                local_port,
                container_port: endpoint.target_port,
                is_debug: endpoint.is_debug,
                platform: self.platform,
                exposure: Some(endpoint.exposure),
            };
            reporter.info(&format!(
                "Forwarding from {} -> {}",
                port.local_url(),
                port.container_port
            ));
            tracing::info!(%port, "forwarding");
            self.active.push(ActiveForward { port, handle });
            self.persist(store, reporter);
        }
        Ok(self.ports())
    }

    /// Close every tunnel and persist the empty set.
    pub async fn release(&mut self, store: &mut StateStore, reporter: &dyn Reporter) {
        if self.active.is_empty() {
            return;
        }
        for forward in std::mem::take(&mut self.active) {
            forward.handle.close().await;
        }
        tracing::info!("released port forwards");
        self.persist(store, reporter);
    }

    async fn open(&mut self, endpoint: &ContainerEndpoint) -> Result<(u16, TunnelHandle), ForwardError> {
        if let Some(pin) = self.config.pins.iter().find(|p| p.matches(endpoint)) {
            let local_port = pin.local_port;
            return match self.try_port(endpoint, local_port).await? {
                Some(handle) => Ok((local_port, handle)),
                None => Err(ForwardError::PortAllocation { endpoint: endpoint.name.clone(), attempts: 1 }),
            };
        }

        let in_use: HashSet<u16> = self.used_ports();
        let previous = self
            .config
            .previous
            .iter()
            .find(|p| p.endpoint_key() == endpoint_key(endpoint))
            .map(|p| p.local_port)
            .filter(|port| !in_use.contains(port));
        if let Some(local_port) = previous {
            if let Some(handle) = self.try_port(endpoint, local_port).await? {
                return Ok((local_port, handle));
            }
        }

        let mut tried = in_use;
        let mut attempts = 0;
        while attempts < self.config.attempts {
            let Some(local_port) = self.pick_port(&tried) else {
                break;
            };
            attempts += 1;
            tried.insert(local_port);
            if let Some(handle) = self.try_port(endpoint, local_port).await? {
                return Ok((local_port, handle));
            }
        }
        Err(ForwardError::PortAllocation { endpoint: endpoint.name.clone(), attempts })
    }

    /// `Ok(None)` when the local port is taken.
    async fn try_port(
        &self,
        endpoint: &ContainerEndpoint,
        local_port: u16,
    ) -> Result<Option<TunnelHandle>, ForwardError> {
        let spec = TunnelSpec {
            container: endpoint.container.clone(),
            local_address: self.config.address.clone(),
            local_port,
            container_port: endpoint.target_port,
        };
        match self.tunneler.open(spec).await {
            Ok(handle) => Ok(Some(handle)),
            Err(AdapterError::AddrInUse(port)) => {
                tracing::debug!(port, endpoint = %endpoint.name, "local port in use");
                Ok(None)
            }
            Err(source) => Err(ForwardError::Tunnel { endpoint: endpoint.name.clone(), source }),
        }
    }

    fn used_ports(&self) -> HashSet<u16> {
        let mut used: HashSet<u16> = self.active.iter().map(|a| a.port.local_port).collect();
        used.extend(self.config.pins.iter().map(|p| p.local_port));
        used
    }

    fn pick_port(&mut self, exclude: &HashSet<u16>) -> Option<u16> {
        let range = self.config.range.clone();
        let free = range.clone().filter(|p| !exclude.contains(p)).count();
        if free == 0 {
            return None;
        }
        loop {
            let port = self.rng.random_range(range.clone());
            if !exclude.contains(&port) {
                return Some(port);
            }
        }
    }

    fn persist(&self, store: &mut StateStore, reporter: &dyn Reporter) {
        if let Err(e) = store.set_forwarded_ports(self.ports()) {
            persistence_warning(reporter, &e);
        }
    }
}

fn endpoint_key(endpoint: &ContainerEndpoint) -> (&str, &str, u16) {
    (&endpoint.container, &endpoint.name, endpoint.target_port)
}

#[cfg(test)]
#[path = "forward_tests.rs"]
mod tests;
