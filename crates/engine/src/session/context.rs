// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::config::Settings;
use dl_core::{Platform, SessionId};
use dl_devfile::{ContainerEndpoint, Devfile, PushCommands};
use dl_sync::{IgnoreRules, SyncPlan};
use std::path::PathBuf;
use std::sync::Arc;

/// Per-directory session facts, resolved once at start and never mutated.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    pub root: PathBuf,
    pub platform: Platform,
    pub devfile: Arc<Devfile>,
    pub commands: PushCommands,
    pub plan: SyncPlan,
    /// Endpoints to forward, already filtered for exposure and debug mode.
    pub endpoints: Vec<ContainerEndpoint>,
    pub ignore: Arc<IgnoreRules>,
    pub debug: bool,
    pub watch: bool,
    pub keep_resources: bool,
    pub settings: Settings,
}
