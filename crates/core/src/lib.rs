// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl-core: shared types for the devloop (dl) development-session manager

pub mod macros;

pub mod clock;
pub mod id;
pub mod port;
pub mod resource;
pub mod session;
pub mod time_fmt;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::SessionId;
pub use port::{Exposure, ForwardedPort, Platform, PlatformParseError};
pub use resource::AppliedResource;
pub use session::{InvalidTransition, SessionState};
pub use time_fmt::{format_elapsed, format_elapsed_ms};

/// Name of the per-directory metadata folder.
pub const METADATA_DIR: &str = ".devloop";
