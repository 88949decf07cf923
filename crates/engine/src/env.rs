// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::path::PathBuf;

/// Resolve the preference directory: DL_CONFIG_DIR > <config dir>/devloop > ~/.config/devloop
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DL_CONFIG_DIR") {
        if !dir.is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|d| d.join("devloop"))
}
