// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl-storage: on-disk session state under `<root>/.devloop/`

mod error;
pub mod json;
mod lock;
mod probe;
mod state;

pub use error::StorageError;
pub use lock::{SessionLock, LOCK_FILE};
pub use probe::{ProcessProbe, SystemProbe};
pub use state::{
    orphan_states, pid_state_path, read_forwarded_ports, read_pid_states, state_dir, DevState,
    OrphanState, StateStore, COMMON_STATE_FILE,
};

#[cfg(any(test, feature = "test-support"))]
pub use probe::FakeProbe;
