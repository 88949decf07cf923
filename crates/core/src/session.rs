// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dev session lifecycle state.
//!
//! ```text
//! NotStarted ──► Syncing ──► Building ──► Running
//!                   ▲                        │
//!                   └────────────────────────┘   (file change / manual push)
//!
//! any live state ──► Failed ──► Syncing          (next change retries)
//! any state ──► Stopping ──► Stopped              (graceful)
//! any state ──► Stopped                           (kill)
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current phase of a dev session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    Building,
    Syncing,
    Running,
    Stopping,
    Stopped,
    Failed,
}

crate::simple_display! {
    SessionState {
        NotStarted => "not started",
        Building => "building",
        Syncing => "syncing",
        Running => "running",
        Stopping => "stopping",
        Stopped => "stopped",
        Failed => "failed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid session transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: SessionState,
    pub to: SessionState,
}

impl SessionState {
    /// Whether the session has finished and can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Stopped)
    }

    /// Whether a sync/build/run cycle is in flight.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Syncing | SessionState::Building)
    }

    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Stopped, _) => false,
            // kill jumps straight to Stopped from anywhere
            (_, Stopped) => true,
            (Stopping, _) => false,
            (_, Stopping) => true,
            (NotStarted, Syncing) => true,
            (Syncing, Building) | (Syncing, Running) => true,
            (Building, Running) => true,
            (Running, Syncing) => true,
            (Failed, Syncing) => true,
            (NotStarted | Syncing | Building | Running, Failed) => true,
            _ => false,
        }
    }

    /// Validate and perform a transition.
    pub fn transition(&mut self, next: SessionState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
