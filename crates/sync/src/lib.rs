// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl-sync: source tree indexing, ignore rules and change watching

mod error;
mod ignore;
mod index;
mod mapping;
mod watcher;

pub use error::SyncError;
pub use ignore::{IgnoreRules, DEVLOOPIGNORE, GITIGNORE};
pub use index::{is_dir_key, poll, relative_key, ChangeSet, FileEntry, FileIndex, INDEX_FILE};
pub use mapping::{remote_path, SyncPlan};
pub use watcher::{SourceWatcher, DEFAULT_DEBOUNCE};
