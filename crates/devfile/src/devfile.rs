// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated devfile

use crate::command::{CommandGroupKind, CommandKind, DevfileCommand};
use crate::error::DevfileError;
use crate::graph::{self, ResolvedCommand};
use crate::model::{Component, ComponentKind, Container, Events, Project, RawDevfile};
use crate::vars::{self, VarOverrides};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Devfile {
    /// Component name from `metadata.name`, falling back to the directory name.
    pub name: String,
    pub schema_version: String,
    /// Directory containing the devfile; manifest URIs resolve against it.
    pub dir: PathBuf,
    /// File name of the devfile itself, excluded from sync.
    pub file_name: Option<String>,
    pub variables: IndexMap<String, String>,
    pub projects: Vec<Project>,
    pub components: Vec<Component>,
    pub commands: IndexMap<String, DevfileCommand>,
    pub events: Events,
}

impl Devfile {
    /// Parse and validate devfile content.
    ///
    /// Variables are substituted across the whole document before it is
    /// typed, so every string field (command lines, images, mappings) sees
    /// the final values.
    pub fn parse(content: &str, overrides: &VarOverrides) -> Result<Self, DevfileError> {
        let mut doc: serde_yaml::Value = serde_yaml::from_str(content)?;

        let mut variables: IndexMap<String, String> = match doc.get("variables") {
            Some(v) if !v.is_null() => serde_yaml::from_value(v.clone())?,
            _ => IndexMap::new(),
        };
        overrides.apply_to(&mut variables);

        let mut missing = BTreeSet::new();
        if let serde_yaml::Value::Mapping(map) = &mut doc {
            for (key, value) in map.iter_mut() {
                if key.as_str() == Some("variables") {
                    continue;
                }
                vars::substitute_value(value, &variables, &mut missing);
            }
        }
        if !missing.is_empty() {
            return Err(DevfileError::InvalidVariables { keys: missing.into_iter().collect() });
        }

        let raw: RawDevfile = serde_yaml::from_value(doc)?;
        Self::from_raw(raw, variables)
    }

    fn from_raw(raw: RawDevfile, variables: IndexMap<String, String>) -> Result<Self, DevfileError> {
        let mut commands = IndexMap::new();
        for raw_cmd in raw.commands {
            let cmd = DevfileCommand::try_from(raw_cmd)?;
            if commands.contains_key(&cmd.name) {
                return Err(DevfileError::DuplicateCommand(cmd.name));
            }
            commands.insert(cmd.name.clone(), cmd);
        }

        let events = Events {
            post_start: raw.events.post_start.iter().map(|c| c.to_lowercase()).collect(),
            pre_stop: raw.events.pre_stop.iter().map(|c| c.to_lowercase()).collect(),
        };

        let devfile = Devfile {
            name: raw.metadata.name,
            schema_version: raw.schema_version,
            dir: PathBuf::new(),
            file_name: None,
            variables,
            projects: raw.projects,
            components: raw.components,
            commands,
            events,
        };
        devfile.validate()?;
        Ok(devfile)
    }

    fn validate(&self) -> Result<(), DevfileError> {
        for cmd in self.commands.values() {
            match &cmd.kind {
                CommandKind::Exec(spec) => {
                    if self.container(&spec.component).is_none() {
                        return Err(DevfileError::UnknownComponent {
                            command: cmd.name.clone(),
                            component: spec.component.clone(),
                        });
                    }
                }
                CommandKind::Apply { component } => {
                    let applicable = self.component(component).and_then(Component::kind).is_some_and(
                        |k| matches!(k, ComponentKind::Kubernetes | ComponentKind::Openshift | ComponentKind::Image),
                    );
                    if !applicable {
                        return Err(DevfileError::UnknownComponent {
                            command: cmd.name.clone(),
                            component: component.clone(),
                        });
                    }
                }
                CommandKind::Composite { .. } => {}
            }
        }

        graph::check_acyclic(&self.commands)?;

        for (event, names) in [("postStart", &self.events.post_start), ("preStop", &self.events.pre_stop)] {
            for name in names {
                if !self.commands.contains_key(name) {
                    return Err(DevfileError::UnknownEventCommand { event, command: name.clone() });
                }
            }
        }
        Ok(())
    }

    pub(crate) fn with_location(mut self, path: &Path) -> Self {
        self.dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.file_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        if self.name.is_empty() {
            self.name = self
                .dir
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_else(|| "component".to_string());
        }
        self
    }

    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn container(&self, name: &str) -> Option<&Container> {
        self.component(name).and_then(|c| c.container.as_ref())
    }

    /// Container components in declaration order.
    pub fn containers(&self) -> impl Iterator<Item = (&str, &Container)> {
        self.components
            .iter()
            .filter_map(|c| c.container.as_ref().map(|container| (c.name.as_str(), container)))
    }

    /// Look up a command by id, case-insensitively.
    pub fn command(&self, name: &str) -> Option<&DevfileCommand> {
        self.commands.get(name.to_lowercase().as_str())
    }

    pub fn commands_in_group(&self, group: CommandGroupKind) -> Vec<&DevfileCommand> {
        self.commands.values().filter(|c| c.in_group(group)).collect()
    }

    pub fn has_group(&self, group: CommandGroupKind) -> bool {
        self.commands.values().any(|c| c.in_group(group))
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedCommand, DevfileError> {
        graph::resolve(&self.commands, &name.to_lowercase())
    }

    /// Resolve each command listed under an event, in order.
    pub fn resolve_events(&self, names: &[String]) -> Result<Vec<ResolvedCommand>, DevfileError> {
        names.iter().map(|name| self.resolve(name)).collect()
    }

    /// Manifest text for a kubernetes/openshift component, with variables substituted.
    pub fn manifest(&self, component: &str) -> Result<String, DevfileError> {
        let manifest = self
            .component(component)
            .and_then(Component::manifest)
            .ok_or_else(|| DevfileError::NoManifest(component.to_string()))?;

        let raw = match (&manifest.inlined, &manifest.uri) {
            (Some(inlined), _) => inlined.clone(),
            (None, Some(uri)) => {
                let path = self.dir.join(uri);
                std::fs::read_to_string(&path).map_err(|source| DevfileError::Io { path, source })?
            }
            (None, None) => return Err(DevfileError::NoManifest(component.to_string())),
        };

        let mut missing = BTreeSet::new();
        let text = vars::substitute(&raw, &self.variables, &mut missing);
        if !missing.is_empty() {
            return Err(DevfileError::InvalidVariables { keys: missing.into_iter().collect() });
        }
        Ok(text)
    }
}

#[cfg(test)]
#[path = "devfile_tests.rs"]
mod tests;
