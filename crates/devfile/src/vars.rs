// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Devfile variable substitution (`{{NAME}}`)

use crate::error::DevfileError;
use indexmap::IndexMap;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

/// Regex pattern for `{{NAME}}`, tolerating inner whitespace
#[allow(clippy::expect_used)]
pub static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.-]*)\s*\}\}")
        .expect("constant regex pattern is valid")
});

/// Variable values supplied on the command line, overriding the devfile's
/// `variables` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VarOverrides {
    vars: IndexMap<String, String>,
}

impl VarOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build overrides from an optional var file and `--var KEY=VALUE` flags.
    ///
    /// Flags win over the file, matching the order they are applied.
    pub fn from_sources(var_file: Option<&Path>, flags: &[String]) -> Result<Self, DevfileError> {
        let mut overrides = Self::new();
        if let Some(path) = var_file {
            let content = std::fs::read_to_string(path).map_err(|source| DevfileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            overrides.vars.extend(parse_var_file(&content)?);
        }
        for flag in flags {
            let (key, value) = parse_var_flag(flag)?;
            overrides.vars.insert(key, value);
        }
        Ok(overrides)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn apply_to(&self, vars: &mut IndexMap<String, String>) {
        for (key, value) in &self.vars {
            vars.insert(key.clone(), value.clone());
        }
    }
}

/// Parse a single `KEY=VALUE` flag. The value may itself contain `=`.
pub fn parse_var_flag(flag: &str) -> Result<(String, String), DevfileError> {
    match flag.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(DevfileError::InvalidVarFlag(flag.to_string())),
    }
}

/// Parse a var file: one `KEY=VALUE` per line, blank lines and `#` comments skipped.
pub fn parse_var_file(content: &str) -> Result<IndexMap<String, String>, DevfileError> {
    let mut vars = IndexMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = parse_var_flag(line)?;
        vars.insert(key, value);
    }
    Ok(vars)
}

/// Replace `{{NAME}}` references in `template`, recording unknown names in `missing`.
///
/// Unknown references are left in place.
pub fn substitute(
    template: &str,
    vars: &IndexMap<String, String>,
    missing: &mut BTreeSet<String>,
) -> String {
    VAR_PATTERN
        .replace_all(template, |caps: &regex::Captures| {
            let name = &caps[1];
            match vars.get(name) {
                Some(value) => value.clone(),
                None => {
                    missing.insert(name.to_string());
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Substitute variables in every string scalar of a YAML tree.
pub fn substitute_value(
    value: &mut serde_yaml::Value,
    vars: &IndexMap<String, String>,
    missing: &mut BTreeSet<String>,
) {
    match value {
        serde_yaml::Value::String(s) => {
            if s.contains("{{") {
                *s = substitute(s, vars, missing);
            }
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                substitute_value(item, vars, missing);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                substitute_value(item, vars, missing);
            }
        }
        serde_yaml::Value::Tagged(tagged) => substitute_value(&mut tagged.value, vars, missing),
        serde_yaml::Value::Null | serde_yaml::Value::Bool(_) | serde_yaml::Value::Number(_) => {}
    }
}

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
