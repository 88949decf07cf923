// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem watcher feeding debounced change batches into tokio

use crate::error::SyncError;
use crate::ignore::IgnoreRules;
use crate::index::relative_key;
use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Recursive watcher on the project root.
///
/// Events for ignored paths are dropped; the rest are grouped into batches
/// that end once no event arrives for the debounce interval.
pub struct SourceWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<notify::Result<NotifyEvent>>,
    root: PathBuf,
    ignore: Arc<IgnoreRules>,
    debounce: Duration,
}

impl SourceWatcher {
    pub fn start(
        root: &Path,
        ignore: Arc<IgnoreRules>,
        debounce: Duration,
    ) -> Result<Self, SyncError> {
        let (tx, rx) = mpsc::channel(256);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<NotifyEvent>| {
            let _ = tx.blocking_send(res);
        })?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), debounce_ms = debounce.as_millis() as u64, "watching sources");

        Ok(Self { _watcher: watcher, rx, root: root.to_path_buf(), ignore, debounce })
    }

    /// Wait for the next batch of changed relative paths.
    ///
    /// Returns `None` once the underlying watcher has shut down.
    pub async fn next_batch(&mut self) -> Option<Vec<String>> {
        let mut batch = BTreeSet::new();
        while batch.is_empty() {
            let res = self.rx.recv().await?;
            self.collect(res, &mut batch);
        }
        while let Ok(Some(res)) = tokio::time::timeout(self.debounce, self.rx.recv()).await {
            self.collect(res, &mut batch);
        }
        Some(batch.into_iter().collect())
    }

    fn collect(&self, res: notify::Result<NotifyEvent>, batch: &mut BTreeSet<String>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "file watcher error");
                return;
            }
        };
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        for path in event.paths {
            let Some(rel) = relative_key(&self.root, &path) else {
                continue;
            };
            if self.ignore.is_ignored(&rel, path.is_dir()) {
                tracing::trace!(error = %SyncError::IgnoredConflict { path: rel }, "skipping change");
                continue;
            }
            batch.insert(rel);
        }
    }
}
