// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session's single writer
//!
//! One task owns the session state, the file index, the state file and the
//! running command. Handle requests and watcher batches are handled one at a
//! time, so a stop requested mid-cycle waits for the cycle to finish. Kill is
//! a token and interrupts whatever is in flight.

use super::{SessionContext, SessionStatus};
use crate::error::{CycleFailure, SessionError};
use crate::executor::{ExecContext, Executor, RunHandle};
use crate::forward::PortForwardManager;
use crate::report::{persistence_warning, Reporter};
use dl_adapters::{ExecAdapter, FileSync, PortTunneler, ResourceApplier};
use dl_core::{Clock, ForwardedPort, SessionState};
use dl_devfile::ResolvedCommand;
use dl_storage::{SessionLock, StateStore};
use dl_sync::{poll, remote_path, ChangeSet, FileIndex, SourceWatcher};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

pub(super) type SyncReply = oneshot::Sender<Result<Vec<ForwardedPort>, CycleFailure>>;

pub(super) enum SessionEvent {
    /// Manual sync; replies once the cycle is done.
    Sync { reply: SyncReply },
    Stop { reply: oneshot::Sender<()> },
}

enum Next {
    Kill,
    Event(SessionEvent),
    Changed(Option<Vec<String>>),
    HandleDropped,
}

pub(super) struct Coordinator<E, F, T, R, C: Clock> {
    pub(super) ctx: SessionContext,
    pub(super) executor: Executor<E, R, C>,
    pub(super) files: F,
    pub(super) forwards: PortForwardManager<T>,
    pub(super) store: StateStore,
    pub(super) exec_ctx: ExecContext,
    pub(super) reporter: Arc<dyn Reporter>,
    pub(super) index: FileIndex,
    pub(super) run: Option<RunHandle>,
    pub(super) state: SessionState,
    pub(super) status: watch::Sender<SessionStatus>,
    pub(super) watcher: Option<SourceWatcher>,
    pub(super) kill: CancellationToken,
    pub(super) _lock: SessionLock,
}

impl<E, F, T, R, C> Coordinator<E, F, T, R, C>
where
    E: ExecAdapter,
    F: FileSync,
    T: PortTunneler,
    R: ResourceApplier,
    C: Clock,
{
    pub(super) async fn run(mut self, mut events: mpsc::Receiver<SessionEvent>) {
        if self.run_cycle(true).await.is_none() {
            return self.on_kill().await;
        }
        if self.ctx.watch {
            self.reporter.info("Watching for changes in the current directory");
        }
        self.reporter.info("Press p to sync manually, Ctrl+C to stop");

        loop {
            let kill = self.kill.clone();
            let next = tokio::select! {
                biased;
                _ = kill.cancelled() => Next::Kill,
                event = events.recv() => match event {
                    Some(event) => Next::Event(event),
                    None => Next::HandleDropped,
                },
                batch = next_batch(&mut self.watcher) => Next::Changed(batch),
            };

            match next {
                Next::Kill => return self.on_kill().await,
                Next::HandleDropped => {
                    tracing::debug!("session handle dropped, stopping");
                    return self.on_stop().await;
                }
                Next::Event(SessionEvent::Stop { reply }) => {
                    self.on_stop().await;
                    let _ = reply.send(());
                    return;
                }
                Next::Event(SessionEvent::Sync { reply }) => {
                    tracing::info!("manual sync requested");
                    match self.run_cycle(false).await {
                        Some(outcome) => {
                            let _ = reply.send(outcome);
                        }
                        None => return self.on_kill().await,
                    }
                }
                Next::Changed(None) => {
                    tracing::warn!("file watcher stopped, only manual syncs remain");
                    self.watcher = None;
                }
                Next::Changed(Some(paths)) => {
                    tracing::info!(count = paths.len(), "source change detected");
                    self.reporter.info(&describe_changes(&paths));
                    if self.run_cycle(false).await.is_none() {
                        return self.on_kill().await;
                    }
                }
            }
        }
    }

    /// Run one cycle and publish its outcome. `None` means the session was
    /// killed mid-cycle.
    async fn run_cycle(&mut self, initial: bool) -> Option<Result<Vec<ForwardedPort>, CycleFailure>> {
        self.status.send_modify(|s| s.pending = true);
        let kill = self.kill.clone();
        let status = self.status.subscribe();
        let outcome = {
            let cycle = self.cycle(initial);
            tokio::pin!(cycle);
            let outcome = tokio::select! {
                biased;
                _ = kill.cancelled() => None,
                outcome = &mut cycle => Some(outcome),
            };
            if outcome.is_none() && status.borrow().state == SessionState::Building {
                // The running build leaf finishes; nothing after it starts
                tracing::info!("killed while building, waiting for the current build command");
                let _ = cycle.await;
            }
            outcome
        };
        let outcome = outcome?;
        self.record_applied();

        let result = match outcome {
            Ok(ports) => Ok(ports),
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "sync cycle failed");
                self.reporter.warn(&e.to_string());
                self.enter(SessionState::Failed).unwrap_or_else(|t| tracing::debug!(error = %t, "staying put"));
                Err(CycleFailure::from(&e))
            }
        };
        let ports = self.forwards.ports();
        let state = self.state;
        self.status.send_modify(|s| {
            s.state = state;
            s.pending = false;
            s.cycles += 1;
            s.ports = ports;
            s.last_error = result.as_ref().err().cloned();
        });
        Some(result)
    }

    /// push, build, (re)start run, liveness, forwards
    async fn cycle(&mut self, initial: bool) -> Result<Vec<ForwardedPort>, SessionError> {
        self.enter(SessionState::Syncing)?;
        let changes = self.push(initial).await?;

        if !initial {
            if let Some(run) = &self.run {
                let alive = self.executor.is_running(run).await;
                if alive && (changes.is_empty() || run.hot_reload_capable()) {
                    tracing::info!(
                        command = run.command(),
                        changed = changes.len(),
                        "run command still alive, not restarting"
                    );
                    return self.establish_forwards().await;
                }
            }
        }

        if initial {
            for command in self.ctx.commands.post_start.clone() {
                self.run_event(&command).await?;
            }
        }

        if let Some(run) = self.run.take() {
            self.executor.stop_run(run).await;
        }

        if let Some(build) = self.ctx.commands.build.clone() {
            self.enter(SessionState::Building)?;
            self.executor.build(&build, &self.exec_ctx).await?;
        }

        let mut run = self.executor.start_run(&self.ctx.commands.run, &self.exec_ctx);
        let started = self.executor.await_started(&mut run, self.ctx.settings.run_grace).await;
        self.run = Some(run);
        started?;

        self.establish_forwards().await
    }

    async fn establish_forwards(&mut self) -> Result<Vec<ForwardedPort>, SessionError> {
        let ports = self
            .forwards
            .forward(&self.ctx.endpoints, &mut self.store, self.reporter.as_ref())
            .await?;
        self.enter(SessionState::Running)?;
        self.status.send_modify(|s| s.ports = ports.clone());
        Ok(ports)
    }

    /// Push local changes to every sync target and persist the new index.
    ///
    /// The first cycle pushes everything and deletes remote paths that the
    /// persisted index knew about but are gone locally.
    async fn push(&mut self, initial: bool) -> Result<ChangeSet, SessionError> {
        let root = &self.ctx.root;
        let (current, changes) = if initial {
            let persisted = FileIndex::load(root);
            let (current, everything) = poll(root, &FileIndex::default(), &self.ctx.ignore)?;
            let deleted = persisted.diff(&current).deleted;
            (current, ChangeSet { deleted, ..everything })
        } else {
            poll(root, &self.index, &self.ctx.ignore)?
        };

        if changes.is_empty() {
            tracing::debug!("no local changes");
        } else {
            let uploads: Vec<String> = changes.to_push().map(str::to_string).collect();
            let deletions = changes.deletions();
            for target in self.ctx.plan.targets() {
                if !deletions.is_empty() {
                    let remote: Vec<String> =
                        deletions.iter().map(|rel| remote_path(&target.remote_dir, rel)).collect();
                    self.files.remove(&target.container, &remote).await?;
                }
                self.files.upload(&target.container, &target.remote_dir, root, &uploads).await?;
            }
            tracing::info!(
                added = changes.added.len(),
                modified = changes.modified.len(),
                deleted = changes.deleted.len(),
                targets = self.ctx.plan.targets().len(),
                "pushed changes"
            );
            self.reporter.info(&format!("Synced {} path(s)", changes.len()));
        }

        if let Err(e) = current.save(root) {
            tracing::warn!(error = %e, "could not persist file index");
        }
        self.index = current;
        Ok(changes)
    }

    async fn run_event(&mut self, command: &ResolvedCommand) -> Result<(), SessionError> {
        self.executor.execute(command, &self.exec_ctx).await?;
        Ok(())
    }

    fn record_applied(&mut self) {
        for resource in self.exec_ctx.take_applied() {
            if let Err(e) = self.store.record_applied(resource) {
                self.persistence_warning(&e);
            }
        }
    }

    async fn on_stop(&mut self) {
        self.enter(SessionState::Stopping).unwrap_or_else(|e| tracing::debug!(error = %e, "stop"));
        self.publish_state();
        self.reporter.info("Cleaning up resources");

        if let Some(run) = self.run.take() {
            self.executor.stop_run(run).await;
        }
        for command in self.ctx.commands.pre_stop.clone() {
            if let Err(e) = self.run_event(&command).await {
                tracing::warn!(command = command.name(), error = %e, "preStop command failed");
                self.reporter.warn(&format!("preStop command {:?} failed: {e}", command.name()));
            }
        }
        self.record_applied();
        self.forwards.release(&mut self.store, self.reporter.as_ref()).await;

        if self.ctx.keep_resources {
            tracing::info!("keeping applied resources");
        } else {
            for resource in self.store.content().applied_resources.clone() {
                match self.executor.applier().delete(&resource).await {
                    Ok(()) => {
                        self.reporter.info(&format!("Deleted {resource}"));
                        if let Err(e) = self.store.forget_applied(&resource) {
                            self.persistence_warning(&e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%resource, error = %e, "failed to delete resource");
                        self.reporter.warn(&format!("Failed to delete {resource}: {e}"));
                    }
                }
            }
        }

        if let Err(e) = self.store.save_exit() {
            self.persistence_warning(&e);
        }
        self.finish();
        tracing::info!(session = %self.ctx.id, "session stopped");
    }

    /// No teardown: the remote process is cancelled locally only and state
    /// files stay behind for `dl delete`.
    async fn on_kill(&mut self) {
        tracing::warn!(session = %self.ctx.id, "session killed");
        // The run stream was cancelled with the kill token
        self.run = None;
        self.record_applied();
        self.finish();
    }

    fn finish(&mut self) {
        self.enter(SessionState::Stopped).unwrap_or_else(|e| tracing::debug!(error = %e, "finish"));
        self.status.send_modify(|s| {
            s.state = SessionState::Stopped;
            s.pending = false;
            s.ports.clear();
        });
    }

    fn enter(&mut self, next: SessionState) -> Result<(), SessionError> {
        if self.state == next {
            return Ok(());
        }
        let from = self.state;
        self.state.transition(next)?;
        tracing::debug!(%from, to = %next, "session state");
        self.publish_state();
        Ok(())
    }

    fn publish_state(&self) {
        let state = self.state;
        self.status.send_modify(|s| s.state = state);
    }

    fn persistence_warning(&self, e: &dl_storage::StorageError) {
        persistence_warning(self.reporter.as_ref(), e);
    }
}

async fn next_batch(watcher: &mut Option<SourceWatcher>) -> Option<Vec<String>> {
    match watcher {
        Some(watcher) => watcher.next_batch().await,
        None => std::future::pending().await,
    }
}

fn describe_changes(paths: &[String]) -> String {
    match paths {
        [one] => format!("File {one} changed"),
        [first, rest @ ..] => format!("File {first} and {} more changed", rest.len()),
        [] => "Files changed".to_string(),
    }
}
