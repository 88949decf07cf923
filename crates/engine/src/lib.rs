// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl-engine: command execution, port forwarding and the session controller

mod config;
pub mod env;
mod error;
pub mod executor;
pub mod forward;
mod output;
pub mod remote;
pub mod report;
pub mod session;

pub use config::{ConfigError, Preferences, Settings, PREFERENCE_FILE};
pub use error::{CycleFailure, ExecuteError, SessionError};
pub use executor::{CommandExecutionResult, CommandStatus, ExecContext, Executor, Phase, RunHandle};
pub use forward::{ForwardConfig, ForwardError, PortForwardManager, PortPin, LOCAL_ADDRESS};
pub use report::{Reporter, SilentReporter};
pub use session::{
    start, KeyAction, SessionContext, SessionDeps, SessionHandle, SessionOptions, SessionStatus,
    SYNC_KEY,
};

#[cfg(any(test, feature = "test-support"))]
pub use report::{RecordingReporter, Report};
