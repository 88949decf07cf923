// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session controller
//!
//! [`start`] validates the component directory, takes the per-directory
//! lock and spawns a coordinator task. The returned [`SessionHandle`] talks
//! to that task over an event queue; the coordinator is the only writer of
//! session state, the file index and the state file.

mod context;
mod coordinator;

pub use context::SessionContext;

use crate::config::Settings;
use crate::error::{CycleFailure, SessionError};
use crate::executor::{ExecContext, Executor};
use crate::forward::{validate_pins, ForwardConfig, PortForwardManager, PortPin};
use crate::report::{persistence_warning, Reporter};
use coordinator::{Coordinator, SessionEvent};
use dl_adapters::{ExecAdapter, FileSync, PortTunneler, ResourceApplier};
use dl_core::{Clock, ForwardedPort, Platform, SessionId, SessionState};
use dl_devfile::{forwardable_endpoints, load_devfile, CommandSelection, PushCommands, VarOverrides};
use dl_storage::{orphan_states, ProcessProbe, SessionLock, StateStore, StorageError};
use dl_sync::{IgnoreRules, SourceWatcher, SyncPlan};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a session should run, from CLI flags and preferences.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub root: PathBuf,
    pub platform: Platform,
    pub selection: CommandSelection,
    pub overrides: VarOverrides,
    /// Watch the source tree; otherwise only manual syncs push changes.
    pub watch: bool,
    /// Skip reusing ports recorded by a killed session.
    pub random_ports: bool,
    pub port_forwards: Vec<PortPin>,
    pub keep_resources: bool,
    pub settings: Settings,
    pub pid: u32,
}

impl SessionOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            platform: Platform::default(),
            selection: CommandSelection::default(),
            overrides: VarOverrides::new(),
            watch: true,
            random_ports: false,
            port_forwards: Vec::new(),
            keep_resources: false,
            settings: Settings::default(),
            pid: std::process::id(),
        }
    }
}

/// Adapters and services a session runs with
pub struct SessionDeps<E, F, T, R, C> {
    pub exec: E,
    pub files: F,
    pub tunnels: T,
    pub applier: R,
    pub clock: C,
    pub probe: Arc<dyn ProcessProbe>,
    pub reporter: Arc<dyn Reporter>,
}

/// Observable session status, published by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub state: SessionState,
    pub ports: Vec<ForwardedPort>,
    /// Completed sync cycles, successful or not.
    pub cycles: u64,
    /// A cycle is queued or in flight.
    pub pending: bool,
    pub last_error: Option<CycleFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Synced(Vec<ForwardedPort>),
    Ignored(char),
}

/// Key that requests a manual sync.
pub const SYNC_KEY: char = 'p';

/// Start a dev session in `options.root`.
///
/// Everything that can be validated locally is validated before the lock is
/// taken or anything is pushed. The initial sync runs in the background;
/// use [`SessionHandle::wait_for_sync`] to wait for it.
pub async fn start<E, F, T, R, C>(
    options: SessionOptions,
    deps: SessionDeps<E, F, T, R, C>,
) -> Result<SessionHandle, SessionError>
where
    E: ExecAdapter,
    F: FileSync,
    T: PortTunneler,
    R: ResourceApplier,
    C: Clock,
{
    let root = options.root.clone();
    let devfile = Arc::new(load_devfile(&root, &options.overrides)?);
    let commands = PushCommands::select(&devfile, &options.selection)?;
    let plan = SyncPlan::from_devfile(&devfile)?;
    let endpoints = forwardable_endpoints(&devfile, options.selection.debug_mode);
    validate_pins(&options.port_forwards, &endpoints)?;

    let lock = SessionLock::acquire(&root, options.pid)?;

    let previous = if options.random_ports || !options.port_forwards.is_empty() {
        Vec::new()
    } else {
        killed_session_ports(&root, options.pid, options.platform, deps.probe.as_ref())
    };
    let mut store = StateStore::new(&root, options.pid, options.platform, deps.probe.clone());
    match store.init() {
        Ok(()) => {}
        Err(e @ StorageError::AlreadyRunningOnPlatform { .. }) => return Err(e.into()),
        Err(e) => persistence_warning(deps.reporter.as_ref(), &e),
    }

    let ignore = Arc::new(IgnoreRules::load(&root, devfile.file_name.as_deref())?);
    let watcher = if options.watch {
        Some(SourceWatcher::start(&root, ignore.clone(), options.settings.sync_debounce)?)
    } else {
        None
    };

    let workdirs: HashMap<String, String> = plan
        .targets()
        .iter()
        .map(|t| (t.container.clone(), t.remote_dir.clone()))
        .collect();
    let kill = CancellationToken::new();
    let exec_ctx = ExecContext::new(devfile.clone(), Arc::new(workdirs), deps.reporter.clone())
        .with_cancel(kill.child_token());
    let executor = Executor::new(deps.exec, deps.applier, deps.clock, options.settings.output_tail_lines);
    let forwards = PortForwardManager::new(
        deps.tunnels,
        options.platform,
        ForwardConfig {
            range: options.settings.port_range.clone(),
            attempts: options.settings.port_attempts,
            pins: options.port_forwards.clone(),
            previous,
            ..Default::default()
        },
    );

    let id = SessionId::new();
    let ctx = SessionContext {
        id: id.clone(),
        root: root.clone(),
        platform: options.platform,
        devfile,
        commands,
        plan,
        endpoints,
        ignore,
        debug: options.selection.debug_mode,
        watch: options.watch,
        keep_resources: options.keep_resources,
        settings: options.settings,
    };
    tracing::info!(session = %id, root = %root.display(), platform = %options.platform, "session starting");

    let (status_tx, status_rx) = watch::channel(SessionStatus {
        state: SessionState::NotStarted,
        ports: Vec::new(),
        cycles: 0,
        pending: true,
        last_error: None,
    });
    let (event_tx, event_rx) = mpsc::channel(16);

    let coordinator = Coordinator {
        ctx,
        executor,
        files: deps.files,
        forwards,
        store,
        exec_ctx,
        reporter: deps.reporter.clone(),
        index: Default::default(),
        run: None,
        state: SessionState::NotStarted,
        status: status_tx,
        watcher,
        kill: kill.clone(),
        _lock: lock,
    };
    let reporter = coordinator.reporter.clone();
    let task = tokio::spawn(coordinator.run(event_rx));

    Ok(SessionHandle {
        id,
        root,
        events: event_tx,
        status: status_rx,
        kill,
        reporter,
        task: Some(task),
    })
}

/// Ports recorded by sessions of this directory and platform whose process died.
fn killed_session_ports(root: &std::path::Path, pid: u32, platform: Platform, probe: &dyn ProcessProbe) -> Vec<ForwardedPort> {
    match orphan_states(root, pid, probe) {
        Ok(orphans) => orphans
            .into_iter()
            .filter(|o| o.state.platform == Some(platform))
            .flat_map(|o| o.state.forwarded_ports)
            .collect(),
        Err(e) => {
            tracing::debug!(error = %e, "no previous ports to reuse");
            Vec::new()
        }
    }
}

/// Client side of a running session
pub struct SessionHandle {
    id: SessionId,
    root: PathBuf,
    events: mpsc::Sender<SessionEvent>,
    status: watch::Receiver<SessionStatus>,
    kill: CancellationToken,
    reporter: Arc<dyn Reporter>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    /// Wait until no cycle is queued or in flight, then return the forwarded
    /// ports or the error that failed the last cycle.
    pub async fn wait_for_sync(&mut self) -> Result<Vec<ForwardedPort>, SessionError> {
        let status = self
            .status
            .wait_for(|s| !s.pending || s.state.is_terminal())
            .await
            .map_err(|_| SessionError::Closed)?
            .clone();
        if status.state.is_terminal() {
            return Err(SessionError::Closed);
        }
        match (status.state, status.last_error) {
            (SessionState::Failed, Some(failure)) => Err(SessionError::Cycle(failure)),
            _ => Ok(status.ports),
        }
    }

    /// Handle a key press. `p` runs one sync cycle and returns when it is done.
    pub async fn press_key(&self, key: char) -> Result<KeyAction, SessionError> {
        if key != SYNC_KEY {
            tracing::debug!(?key, "ignoring key");
            self.reporter.info(&format!("Unknown key {key:?} ignored, press {SYNC_KEY} to sync"));
            return Ok(KeyAction::Ignored(key));
        }
        let (reply, rx) = oneshot::channel();
        self.events.send(SessionEvent::Sync { reply }).await.map_err(|_| SessionError::Closed)?;
        match rx.await.map_err(|_| SessionError::Closed)? {
            Ok(ports) => Ok(KeyAction::Synced(ports)),
            Err(failure) => Err(SessionError::Cycle(failure)),
        }
    }

    /// Graceful teardown, then wait for the coordinator to exit.
    pub async fn stop(mut self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        if self.events.send(SessionEvent::Stop { reply }).await.is_ok() {
            let _ = rx.await;
        }
        self.join().await;
        Ok(())
    }

    /// Abrupt termination: no teardown, state files are left for `dl delete`.
    pub async fn kill(mut self) {
        self.kill.cancel();
        self.join().await;
    }

    /// Resolves when the session ends on its own (e.g. the coordinator failed).
    pub async fn stopped(&mut self) {
        let _ = self.status.wait_for(|s| s.state.is_terminal()).await;
    }

    async fn join(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "session coordinator panicked");
            }
        }
    }
}

#[cfg(test)]
#[path = "../session_tests/mod.rs"]
mod tests;
