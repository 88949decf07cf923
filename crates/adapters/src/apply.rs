// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying devfile manifests to the platform

use crate::error::AdapterError;
use async_trait::async_trait;
use dl_core::AppliedResource;
use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::core::GroupVersionKind;
use kube::discovery::{pinned_kind, Scope};
use kube::Client;
use serde::Deserialize;

/// Field manager used for server-side apply.
pub const FIELD_MANAGER: &str = "devloop";

/// Adapter for creating and deleting resources declared by apply commands
#[async_trait]
pub trait ResourceApplier: Clone + Send + Sync + 'static {
    /// Reconcile every document in `manifest`. Re-applying is an update.
    async fn apply(&self, manifest: &str) -> Result<Vec<AppliedResource>, AdapterError>;

    /// Delete `resource`. Already-deleted resources are not an error.
    async fn delete(&self, resource: &AppliedResource) -> Result<(), AdapterError>;
}

/// Parse a multi-document YAML manifest, skipping empty documents.
pub fn parse_manifest(manifest: &str) -> Result<Vec<DynamicObject>, AdapterError> {
    let mut objects = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(manifest) {
        let value = serde_yaml::Value::deserialize(doc).map_err(|e| AdapterError::Manifest(e.to_string()))?;
        if value.is_null() {
            continue;
        }
        let object: DynamicObject =
            serde_yaml::from_value(value).map_err(|e| AdapterError::Manifest(e.to_string()))?;
        if object.types.is_none() {
            return Err(AdapterError::Manifest("document is missing apiVersion/kind".to_string()));
        }
        if object.metadata.name.is_none() {
            return Err(AdapterError::Manifest("document is missing metadata.name".to_string()));
        }
        objects.push(object);
    }
    Ok(objects)
}

/// Identity recorded in the state file for `object`.
pub fn identity(object: &DynamicObject, default_namespace: &str) -> Option<AppliedResource> {
    let types = object.types.as_ref()?;
    Some(AppliedResource {
        api_version: types.api_version.clone(),
        kind: types.kind.clone(),
        name: object.metadata.name.clone()?,
        namespace: Some(object.metadata.namespace.clone().unwrap_or_else(|| default_namespace.to_string())),
    })
}

fn gvk(api_version: &str, kind: &str) -> GroupVersionKind {
    match api_version.split_once('/') {
        Some((group, version)) => GroupVersionKind::gvk(group, version, kind),
        None => GroupVersionKind::gvk("", api_version, kind),
    }
}

/// Server-side apply through the Kubernetes API.
#[derive(Clone)]
pub struct KubeApplier {
    client: Client,
    namespace: String,
}

impl KubeApplier {
    pub async fn connect(namespace: String) -> Result<Self, AdapterError> {
        Ok(Self { client: Client::try_default().await?, namespace })
    }

    async fn api_for(&self, resource: &AppliedResource) -> Result<Api<DynamicObject>, AdapterError> {
        let (api_resource, caps) =
            pinned_kind(&self.client, &gvk(&resource.api_version, &resource.kind)).await?;
        Ok(match caps.scope {
            Scope::Namespaced => {
                let ns = resource.namespace.as_deref().unwrap_or(&self.namespace);
                Api::namespaced_with(self.client.clone(), ns, &api_resource)
            }
            Scope::Cluster => Api::all_with(self.client.clone(), &api_resource),
        })
    }
}

#[async_trait]
impl ResourceApplier for KubeApplier {
    async fn apply(&self, manifest: &str) -> Result<Vec<AppliedResource>, AdapterError> {
        let params = PatchParams::apply(FIELD_MANAGER).force();
        let mut applied = Vec::new();
        for object in parse_manifest(manifest)? {
            let Some(resource) = identity(&object, &self.namespace) else {
                continue;
            };
            let api = self.api_for(&resource).await?;
            api.patch(&resource.name, &params, &Patch::Apply(&object)).await?;
            tracing::info!(%resource, "applied");
            applied.push(resource);
        }
        Ok(applied)
    }

    async fn delete(&self, resource: &AppliedResource) -> Result<(), AdapterError> {
        let api = self.api_for(resource).await?;
        match api.delete(&resource.name, &DeleteParams::default()).await {
            Ok(_) => {
                tracing::info!(%resource, "deleted");
                Ok(())
            }
            Err(kube::Error::Api(response)) if response.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Applier for the selected platform. Podman has no API for arbitrary
/// resources, so apply commands only log there.
#[derive(Clone)]
pub enum PlatformApplier {
    Cluster(KubeApplier),
    Podman,
}

#[async_trait]
impl ResourceApplier for PlatformApplier {
    async fn apply(&self, manifest: &str) -> Result<Vec<AppliedResource>, AdapterError> {
        match self {
            PlatformApplier::Cluster(kube) => kube.apply(manifest).await,
            PlatformApplier::Podman => {
                let count = parse_manifest(manifest)?.len();
                tracing::warn!(documents = count, "apply commands are not supported on podman, skipping");
                Ok(Vec::new())
            }
        }
    }

    async fn delete(&self, resource: &AppliedResource) -> Result<(), AdapterError> {
        match self {
            PlatformApplier::Cluster(kube) => kube.delete(resource).await,
            PlatformApplier::Podman => Ok(()),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{identity, parse_manifest, ResourceApplier};
    use crate::error::AdapterError;
    use async_trait::async_trait;
    use dl_core::AppliedResource;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeApplierState {
        live: Vec<AppliedResource>,
        apply_count: usize,
        deleted: Vec<AppliedResource>,
        fail_with: Option<String>,
    }

    /// In-memory cluster holding applied resources.
    #[derive(Clone, Default)]
    pub struct FakeApplier {
        inner: Arc<Mutex<FakeApplierState>>,
    }

    impl FakeApplier {
        pub fn new() -> Self {
            Self::default()
        }

        /// Resources currently present.
        pub fn live(&self) -> Vec<AppliedResource> {
            self.inner.lock().live.clone()
        }

        pub fn deleted(&self) -> Vec<AppliedResource> {
            self.inner.lock().deleted.clone()
        }

        pub fn apply_count(&self) -> usize {
            self.inner.lock().apply_count
        }

        /// Seed a resource left behind by an earlier session.
        pub fn insert(&self, resource: AppliedResource) {
            self.inner.lock().live.push(resource);
        }

        pub fn fail_with(&self, message: &str) {
            self.inner.lock().fail_with = Some(message.to_string());
        }
    }

    #[async_trait]
    impl ResourceApplier for FakeApplier {
        async fn apply(&self, manifest: &str) -> Result<Vec<AppliedResource>, AdapterError> {
            let objects = parse_manifest(manifest)?;
            let mut inner = self.inner.lock();
            if let Some(message) = &inner.fail_with {
                return Err(AdapterError::Kube(message.clone()));
            }
            inner.apply_count += 1;
            let mut applied = Vec::new();
            for resource in objects.iter().filter_map(|o| identity(o, "default")) {
                if !inner.live.iter().any(|r| r.same_identity(&resource)) {
                    inner.live.push(resource.clone());
                }
                applied.push(resource);
            }
            Ok(applied)
        }

        async fn delete(&self, resource: &AppliedResource) -> Result<(), AdapterError> {
            let mut inner = self.inner.lock();
            inner.live.retain(|r| !r.same_identity(resource));
            inner.deleted.push(resource.clone());
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeApplier;

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
