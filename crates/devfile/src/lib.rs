// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl-devfile: the devfile subset a dev session consumes
//!
//! Loading resolves variables, validates component references and the
//! composite command graph up front, so nothing downstream has to guard
//! against unknown commands or cycles.

mod command;
mod devfile;
mod endpoints;
mod error;
mod graph;
mod load;
mod lookup;
pub mod model;
mod sources;
pub mod vars;

#[cfg(test)]
mod test_fixtures;

pub use command::{CommandGroupKind, CommandKind, DevfileCommand, ExecSpec, BEST_EFFORT_ATTRIBUTE};
pub use devfile::Devfile;
pub use endpoints::{forwardable_endpoints, is_debug_endpoint, ContainerEndpoint};
pub use error::DevfileError;
pub use graph::{check_acyclic, resolve, ResolvedCommand};
pub use load::{find_devfile, load_devfile, DEVFILE_NAMES};
pub use lookup::{select_command, CommandSelection, PushCommands};
pub use sources::{source_targets, SourceTarget, DEFAULT_SOURCE_MAPPING};
pub use vars::VarOverrides;
