// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serde model of the devfile subset consumed by dev sessions.
//!
//! Unknown keys are ignored so that full devfiles (registry stacks, starter
//! projects, volumes with sizes, ...) load without complaint.

use crate::command::CommandGroupKind;
use dl_core::Exposure;
use indexmap::IndexMap;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDevfile {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub variables: IndexMap<String, String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub commands: Vec<RawCommand>,
    #[serde(default)]
    pub events: Events,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub clone_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub container: Option<Container>,
    #[serde(default)]
    pub kubernetes: Option<ManifestRef>,
    #[serde(default)]
    pub openshift: Option<ManifestRef>,
    #[serde(default)]
    pub image: Option<ImageComponent>,
    #[serde(default)]
    pub volume: Option<serde_yaml::Value>,
}

/// The kind of a component, derived from whichever body key is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Container,
    Kubernetes,
    Openshift,
    Image,
    Volume,
}

dl_core::simple_display! {
    ComponentKind {
        Container => "container",
        Kubernetes => "kubernetes",
        Openshift => "openshift",
        Image => "image",
        Volume => "volume",
    }
}

impl Component {
    pub fn kind(&self) -> Option<ComponentKind> {
        if self.container.is_some() {
            Some(ComponentKind::Container)
        } else if self.kubernetes.is_some() {
            Some(ComponentKind::Kubernetes)
        } else if self.openshift.is_some() {
            Some(ComponentKind::Openshift)
        } else if self.image.is_some() {
            Some(ComponentKind::Image)
        } else if self.volume.is_some() {
            Some(ComponentKind::Volume)
        } else {
            None
        }
    }

    /// Kubernetes or OpenShift manifest reference, if any.
    pub fn manifest(&self) -> Option<&ManifestRef> {
        self.kubernetes.as_ref().or(self.openshift.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub image: String,
    #[serde(default = "default_true")]
    pub mount_sources: bool,
    #[serde(default)]
    pub source_mapping: Option<String>,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub name: String,
    pub target_port: u16,
    #[serde(default)]
    pub exposure: Option<Exposure>,
    #[serde(default)]
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Inline manifest or a URI relative to the devfile directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestRef {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub inlined: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageComponent {
    pub image_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawCommand {
    pub id: String,
    #[serde(default)]
    pub exec: Option<RawExec>,
    #[serde(default)]
    pub apply: Option<RawApply>,
    #[serde(default)]
    pub composite: Option<RawComposite>,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGroup {
    pub kind: CommandGroupKind,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExec {
    pub component: String,
    pub command_line: String,
    #[serde(default)]
    pub working_dir: Option<String>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    #[serde(default)]
    pub hot_reload_capable: Option<bool>,
    #[serde(default)]
    pub group: Option<RawGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawApply {
    pub component: String,
    #[serde(default)]
    pub group: Option<RawGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawComposite {
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub parallel: Option<bool>,
    #[serde(default)]
    pub group: Option<RawGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Events {
    #[serde(default)]
    pub post_start: Vec<String>,
    #[serde(default)]
    pub pre_stop: Vec<String>,
}
