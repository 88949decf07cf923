// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local TCP listeners tunneling to container ports

use crate::error::AdapterError;
use crate::shell::run_cli;
use crate::workload::{podman_container_name, Workload};
use crate::env;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How long `kubectl port-forward` may take to report it is listening.
const FORWARD_READY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSpec {
    pub container: String,
    pub local_address: String,
    pub local_port: u16,
    pub container_port: u16,
}

/// A live tunnel. Dropping the handle stops it.
#[derive(Debug)]
pub struct TunnelHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TunnelHandle {
    pub fn new(cancel: CancellationToken, task: Option<JoinHandle<()>>) -> Self {
        Self { cancel, task }
    }

    /// Stop the tunnel and wait for its listener to be released.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.task.as_ref().is_some_and(|t| t.is_finished())
    }
}

impl Drop for TunnelHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Adapter for opening port tunnels into a component's containers
#[async_trait]
pub trait PortTunneler: Clone + Send + Sync + 'static {
    /// Listen on `spec.local_port` and relay to the container port.
    ///
    /// Fails with [`AdapterError::AddrInUse`] when the local port is taken.
    async fn open(&self, spec: TunnelSpec) -> Result<TunnelHandle, AdapterError>;
}

/// Tunnels via `kubectl port-forward` (cluster) or a local relay to the
/// port published by podman.
#[derive(Debug, Clone)]
pub struct CliTunneler {
    workload: Workload,
}

impl CliTunneler {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

#[async_trait]
impl PortTunneler for CliTunneler {
    async fn open(&self, spec: TunnelSpec) -> Result<TunnelHandle, AdapterError> {
        match &self.workload {
            Workload::Cluster { namespace, pod } => port_forward(namespace, pod, &spec).await,
            Workload::Podman { pod } => {
                let container = podman_container_name(pod, &spec.container);
                let args = vec!["port".to_string(), container, spec.container_port.to_string()];
                let published = run_cli(&env::podman_cmd(), &args).await?;
                let host_port = parse_published_port(&published).ok_or_else(|| {
                    AdapterError::Tunnel(format!(
                        "container port {} is not published: {published:?}",
                        spec.container_port
                    ))
                })?;
                let listener = bind(&spec).await?;
                let cancel = CancellationToken::new();
                let task = tokio::spawn(relay(listener, format!("127.0.0.1:{host_port}"), cancel.clone()));
                Ok(TunnelHandle::new(cancel, Some(task)))
            }
        }
    }
}

/// Parse `podman port` output (`0.0.0.0:34567`, possibly several lines).
pub fn parse_published_port(output: &str) -> Option<u16> {
    output.lines().find_map(|line| line.trim().rsplit(':').next()?.parse().ok())
}

async fn bind(spec: &TunnelSpec) -> Result<TcpListener, AdapterError> {
    TcpListener::bind((spec.local_address.as_str(), spec.local_port)).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            AdapterError::AddrInUse(spec.local_port)
        } else {
            AdapterError::Tunnel(format!("binding {}:{}: {e}", spec.local_address, spec.local_port))
        }
    })
}

/// Accept connections on `listener` and pipe each one to `target` until cancelled.
pub async fn relay(listener: TcpListener, target: String, cancel: CancellationToken) {
    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => accepted,
        };
        let (mut inbound, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(error = %e, "relay accept failed");
                continue;
            }
        };
        let target = target.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let mut outbound = match TcpStream::connect(&target).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::debug!(%peer, %target, error = %e, "relay connect failed");
                    return;
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => {}
                result = tokio::io::copy_bidirectional(&mut inbound, &mut outbound) => {
                    if let Err(e) = result {
                        tracing::trace!(%peer, error = %e, "relay connection closed");
                    }
                }
            }
        });
    }
}

async fn port_forward(
    namespace: &str,
    pod: &str,
    spec: &TunnelSpec,
) -> Result<TunnelHandle, AdapterError> {
    // kubectl reports bind failures late and vaguely; check up front
    drop(bind(spec).await?);

    let program = env::kubectl_cmd();
    let mut child = tokio::process::Command::new(&program)
        .args([
            "port-forward".to_string(),
            "-n".to_string(),
            namespace.to_string(),
            format!("pod/{pod}"),
            "--address".to_string(),
            spec.local_address.clone(),
            format!("{}:{}", spec.local_port, spec.container_port),
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| AdapterError::Spawn { program: program.clone(), source })?;

    let ready = match child.stdout.take() {
        Some(stdout) => {
            let mut lines = BufReader::new(stdout).lines();
            tokio::time::timeout(FORWARD_READY_TIMEOUT, async {
                while let Ok(Some(line)) = lines.next_line().await {
                    if line.starts_with("Forwarding from") {
                        return Some(lines);
                    }
                }
                None
            })
            .await
            .ok()
            .flatten()
        }
        None => None,
    };

    let Some(mut lines) = ready else {
        let _ = child.kill().await;
        let stderr = match child.wait_with_output().await {
            Ok(output) => String::from_utf8_lossy(&output.stderr).trim().to_string(),
            Err(e) => e.to_string(),
        };
        if stderr.contains("address already in use") {
            return Err(AdapterError::AddrInUse(spec.local_port));
        }
        return Err(AdapterError::Tunnel(format!("{program} port-forward: {stderr}")));
    };

    let cancel = CancellationToken::new();
    let task = {
        let cancel = cancel.clone();
        let local_port = spec.local_port;
        tokio::spawn(async move {
            // Drain stdout so kubectl never blocks on a full pipe
            let drain = async { while let Ok(Some(_)) = lines.next_line().await {} };
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                }
                status = child.wait() => {
                    tracing::warn!(local_port, ?status, "port-forward exited");
                }
                _ = drain => {
                    let _ = child.kill().await;
                }
            }
        })
    };
    Ok(TunnelHandle::new(cancel, Some(task)))
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{PortTunneler, TunnelHandle, TunnelSpec};
    use crate::error::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct FakeTunnelState {
        busy: HashSet<u16>,
        attempts: Vec<TunnelSpec>,
        opened: Vec<(TunnelSpec, CancellationToken)>,
    }

    /// Fake tunneler that opens nothing and treats listed ports as taken.
    #[derive(Clone, Default)]
    pub struct FakeTunneler {
        inner: Arc<Mutex<FakeTunnelState>>,
    }

    impl FakeTunneler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_busy(&self, port: u16) {
            self.inner.lock().busy.insert(port);
        }

        /// Every open attempt, successful or not.
        pub fn attempts(&self) -> Vec<TunnelSpec> {
            self.inner.lock().attempts.clone()
        }

        /// Tunnels opened and not yet closed.
        pub fn active(&self) -> Vec<TunnelSpec> {
            self.inner
                .lock()
                .opened
                .iter()
                .filter(|(_, token)| !token.is_cancelled())
                .map(|(spec, _)| spec.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PortTunneler for FakeTunneler {
        async fn open(&self, spec: TunnelSpec) -> Result<TunnelHandle, AdapterError> {
            let mut inner = self.inner.lock();
            inner.attempts.push(spec.clone());
            if inner.busy.contains(&spec.local_port) {
                return Err(AdapterError::AddrInUse(spec.local_port));
            }
            let cancel = CancellationToken::new();
            inner.opened.push((spec, cancel.clone()));
            Ok(TunnelHandle::new(cancel, None))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTunneler;

#[cfg(test)]
#[path = "tunnel_tests.rs"]
mod tests;
