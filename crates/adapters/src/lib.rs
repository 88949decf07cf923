// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Platform adapters for the devloop (dl) session manager

pub mod apply;
pub mod env;
mod error;
pub mod exec;
pub mod push;
pub mod shell;
pub mod tunnel;
pub mod workload;

pub use apply::{KubeApplier, PlatformApplier, ResourceApplier};
pub use error::AdapterError;
pub use exec::{CliExecAdapter, ExecAdapter, ExecRequest, ExecStatus, OutputLine, Stream};
pub use push::{CliFileSync, FileSync};
pub use tunnel::{CliTunneler, PortTunneler, TunnelHandle, TunnelSpec};
pub use workload::Workload;

// Test support
#[cfg(any(test, feature = "test-support"))]
pub use apply::FakeApplier;
#[cfg(any(test, feature = "test-support"))]
pub use exec::{ExecCall, ExecResponse, FakeExecAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use push::{LocalMirror, PushCall};
#[cfg(any(test, feature = "test-support"))]
pub use tunnel::FakeTunneler;
