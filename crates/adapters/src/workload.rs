// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where a component's containers run

use crate::env;
use crate::error::AdapterError;
use dl_core::Platform;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams};
use kube::Client;

/// Label carrying the component name on cluster pods.
pub const COMPONENT_LABEL: &str = "app.kubernetes.io/instance";

/// A located workload, able to address each of its containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workload {
    Cluster { namespace: String, pod: String },
    Podman { pod: String },
}

impl Workload {
    /// Find the running workload for `component`.
    pub async fn locate(platform: Platform, component: &str) -> Result<Self, AdapterError> {
        match platform {
            Platform::Cluster => {
                let namespace = env::namespace();
                let pod = running_pod(&namespace, component).await?;
                tracing::debug!(%namespace, %pod, "located cluster workload");
                Ok(Workload::Cluster { namespace, pod })
            }
            Platform::Podman => Ok(Workload::Podman { pod: podman_pod_name(component) }),
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Workload::Cluster { .. } => Platform::Cluster,
            Workload::Podman { .. } => Platform::Podman,
        }
    }

    /// Program and arguments running `sh -c <script>` inside `container`.
    pub fn exec_argv(&self, container: &str, script: &str, stdin: bool) -> (String, Vec<String>) {
        let mut args = vec!["exec".to_string()];
        if stdin {
            args.push("-i".to_string());
        }
        match self {
            Workload::Cluster { namespace, pod } => {
                args.extend([
                    "-n".to_string(),
                    namespace.clone(),
                    pod.clone(),
                    "-c".to_string(),
                    container.to_string(),
                    "--".to_string(),
                ]);
                args.extend(["sh".to_string(), "-c".to_string(), script.to_string()]);
                (env::kubectl_cmd(), args)
            }
            Workload::Podman { pod } => {
                args.push(podman_container_name(pod, container));
                args.extend(["sh".to_string(), "-c".to_string(), script.to_string()]);
                (env::podman_cmd(), args)
            }
        }
    }
}

/// Pod name used for a component on podman.
pub fn podman_pod_name(component: &str) -> String {
    format!("{component}-app")
}

/// Podman names each container `<pod>-<container>`.
pub fn podman_container_name(pod: &str, container: &str) -> String {
    format!("{pod}-{container}")
}

async fn running_pod(namespace: &str, component: &str) -> Result<String, AdapterError> {
    let client = Client::try_default().await?;
    let pods: Api<Pod> = Api::namespaced(client, namespace);
    let params = ListParams::default().labels(&format!("{COMPONENT_LABEL}={component}"));
    let list = pods.list(&params).await?;

    list.items
        .into_iter()
        .filter(|pod| pod.metadata.deletion_timestamp.is_none())
        .find(|pod| {
            pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
        })
        .and_then(|pod| pod.metadata.name)
        .ok_or_else(|| AdapterError::WorkloadNotFound { component: component.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn podman_exec_targets_named_container() {
        let workload = Workload::Podman { pod: podman_pod_name("web") };
        let (_, args) = workload.exec_argv("runtime", "ls", false);
        assert_eq!(args, vec!["exec", "web-app-runtime", "sh", "-c", "ls"]);
    }

    #[test]
    fn cluster_exec_uses_namespace_and_container() {
        let workload = Workload::Cluster { namespace: "dev".into(), pod: "web-7f9".into() };
        let (_, args) = workload.exec_argv("runtime", "ls", true);
        assert_eq!(
            args,
            vec!["exec", "-i", "-n", "dev", "web-7f9", "-c", "runtime", "--", "sh", "-c", "ls"]
        );
        assert_eq!(workload.platform(), Platform::Cluster);
    }
}
