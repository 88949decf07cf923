// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User preferences and the resolved session settings

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const PREFERENCE_FILE: &str = "preference.toml";

pub const DEFAULT_PORT_RANGE_START: u16 = 20001;
pub const DEFAULT_PORT_RANGE_END: u16 = 30001;
pub const DEFAULT_PORT_ATTEMPTS: u32 = 10;
pub const DEFAULT_RUN_GRACE: Duration = Duration::from_secs(1);
pub const DEFAULT_OUTPUT_TAIL_LINES: usize = 100;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid preference file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Contents of `preference.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preferences {
    pub port_range_start: Option<u16>,
    pub port_attempts: Option<u32>,
    pub sync_debounce_ms: Option<u64>,
    pub run_grace_ms: Option<u64>,
    pub output_tail_lines: Option<usize>,
}

impl Preferences {
    /// Load `<dir>/preference.toml`; a missing file yields defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(PREFERENCE_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Io { path, source }),
        };
        let prefs = toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        tracing::debug!(path = %path.display(), "loaded preferences");
        Ok(prefs)
    }
}

/// Tunables for a session after applying preferences over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub port_range: std::ops::Range<u16>,
    pub port_attempts: u32,
    pub sync_debounce: Duration,
    /// A run command exiting sooner than this counts as a failed start.
    pub run_grace: Duration,
    pub output_tail_lines: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port_range: DEFAULT_PORT_RANGE_START..DEFAULT_PORT_RANGE_END,
            port_attempts: DEFAULT_PORT_ATTEMPTS,
            sync_debounce: dl_sync::DEFAULT_DEBOUNCE,
            run_grace: DEFAULT_RUN_GRACE,
            output_tail_lines: DEFAULT_OUTPUT_TAIL_LINES,
        }
    }
}

impl Settings {
    pub fn from_preferences(prefs: &Preferences) -> Self {
        let defaults = Self::default();
        let start = prefs.port_range_start.unwrap_or(DEFAULT_PORT_RANGE_START);
        // Keep the width of the default range, clamped at the top of the port space
        let width = DEFAULT_PORT_RANGE_END - DEFAULT_PORT_RANGE_START;
        let end = start.saturating_add(width).max(start.saturating_add(1));
        Self {
            port_range: start..end,
            port_attempts: prefs.port_attempts.unwrap_or(defaults.port_attempts).max(1),
            sync_debounce: prefs.sync_debounce_ms.map(Duration::from_millis).unwrap_or(defaults.sync_debounce),
            run_grace: prefs.run_grace_ms.map(Duration::from_millis).unwrap_or(defaults.run_grace),
            output_tail_lines: prefs.output_tail_lines.unwrap_or(defaults.output_tail_lines).max(1),
        }
    }

    /// Settings from the user's preference directory, if it has a preference file.
    pub fn load() -> Result<Self, ConfigError> {
        let prefs = match crate::env::config_dir() {
            Some(dir) => Preferences::load(&dir)?,
            None => Preferences::default(),
        };
        Ok(Self::from_preferences(&prefs))
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
