// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution engine
//!
//! Runs resolved devfile commands: exec leaves inside containers, apply
//! leaves through the platform applier, composites in order or in parallel.
//! Long-lived run/debug commands are started in the background and tracked
//! through a [`RunHandle`].

use crate::error::ExecuteError;
use crate::output::OutputTail;
use crate::remote;
use crate::report::{building_message, executing_message, running_message, Reporter};
use dl_adapters::{ExecAdapter, ExecRequest, ExecStatus, OutputLine, ResourceApplier};
use dl_core::{format_elapsed_ms, AppliedResource, Clock};
use dl_devfile::{Devfile, ExecSpec, ResolvedCommand};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

type Execution = Pin<Box<dyn Future<Output = Result<CommandExecutionResult, ExecuteError>> + Send>>;

/// What the command is being run for; decides progress wording and whether
/// exec leaves are started as long-lived processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Build,
    Run,
    Event,
}

/// Everything a command needs besides the command itself.
#[derive(Clone)]
pub struct ExecContext {
    pub devfile: Arc<Devfile>,
    /// Source directory per container, used when an exec has no `workingDir`.
    pub workdirs: Arc<HashMap<String, String>>,
    pub phase: Phase,
    /// Stops new commands from starting.
    pub cancel: CancellationToken,
    /// Handed to running exec leaves.
    interrupt: CancellationToken,
    pub reporter: Arc<dyn Reporter>,
    applied: Arc<Mutex<Vec<AppliedResource>>>,
}

impl ExecContext {
    pub fn new(
        devfile: Arc<Devfile>,
        workdirs: Arc<HashMap<String, String>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let cancel = CancellationToken::new();
        Self {
            devfile,
            workdirs,
            phase: Phase::Event,
            interrupt: cancel.clone(),
            cancel,
            reporter,
            applied: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_phase(&self, phase: Phase) -> Self {
        Self { phase, ..self.clone() }
    }

    pub fn with_cancel(&self, cancel: CancellationToken) -> Self {
        Self { interrupt: cancel.clone(), cancel, ..self.clone() }
    }

    /// Running leaves finish even when `cancel` fires; only the next
    /// command is refused.
    fn cooperative(&self) -> Self {
        Self { interrupt: CancellationToken::new(), ..self.clone() }
    }

    /// Resources applied since the last call, including by failed composites.
    pub fn take_applied(&self) -> Vec<AppliedResource> {
        std::mem::take(&mut *self.applied.lock())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Succeeded,
    /// Failed, but the command is best-effort so its parent carried on.
    Failed(String),
}

/// Outcome of one command. Composites aggregate their children.
#[derive(Debug, Clone)]
pub struct CommandExecutionResult {
    pub name: String,
    pub status: CommandStatus,
    pub exit_code: Option<i32>,
    pub started_at_ms: u64,
    pub duration: Duration,
    /// Last lines of combined stdout/stderr (leaves only).
    pub output: Vec<String>,
    pub children: Vec<CommandExecutionResult>,
}

impl CommandExecutionResult {
    pub fn succeeded(&self) -> bool {
        self.status == CommandStatus::Succeeded
    }

    /// Leaf results in execution tree order.
    pub fn leaves(&self) -> Vec<&CommandExecutionResult> {
        if self.children.is_empty() {
            return vec![self];
        }
        self.children.iter().flat_map(|c| c.leaves()).collect()
    }

    fn failed(name: &str, started_at_ms: u64, error: &ExecuteError) -> Self {
        Self {
            name: name.to_string(),
            status: CommandStatus::Failed(error.to_string()),
            exit_code: match error {
                ExecuteError::CommandFailed { exit_code, .. } => *exit_code,
                _ => None,
            },
            started_at_ms,
            duration: Duration::ZERO,
            output: error.tail().to_vec(),
            children: Vec::new(),
        }
    }
}

/// Runs devfile commands using the configured adapters
#[derive(Clone)]
pub struct Executor<E, R, C: Clock> {
    exec: E,
    applier: R,
    clock: C,
    tail_lines: usize,
}

impl<E, R, C> Executor<E, R, C>
where
    E: ExecAdapter,
    R: ResourceApplier,
    C: Clock,
{
    pub fn new(exec: E, applier: R, clock: C, tail_lines: usize) -> Self {
        Self { exec, applier, clock, tail_lines }
    }

    pub fn applier(&self) -> &R {
        &self.applier
    }

    /// Execute `command` to completion.
    pub fn execute(&self, command: &ResolvedCommand, ctx: &ExecContext) -> Execution {
        let this = self.clone();
        let command = command.clone();
        let ctx = ctx.clone();
        Box::pin(async move { this.execute_inner(command, ctx).await })
    }

    /// Run the build command. Any failure other than cancellation becomes a
    /// [`ExecuteError::BuildFailure`] naming the leaf that failed.
    pub async fn build(
        &self,
        command: &ResolvedCommand,
        ctx: &ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        match self.execute(command, &ctx.with_phase(Phase::Build).cooperative()).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_cancelled() => Err(e),
            Err(e) => {
                let failed = match e.failed_command() {
                    "" => command.name().to_string(),
                    leaf => leaf.to_string(),
                };
                tracing::warn!(command = %failed, error = %e, "build failed");
                Err(ExecuteError::BuildFailure { command: failed, tail: e.tail().to_vec() })
            }
        }
    }

    async fn execute_inner(
        &self,
        command: ResolvedCommand,
        ctx: ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        if ctx.cancel.is_cancelled() {
            return Err(ExecuteError::Cancelled { command: command.name().to_string() });
        }
        match command {
            ResolvedCommand::Exec { name, spec, .. } => self.run_exec(&name, &spec, &ctx).await,
            ResolvedCommand::Apply { name, component, .. } => {
                self.run_apply(&name, &component, &ctx).await
            }
            ResolvedCommand::Composite { name, parallel: false, children, .. } => {
                self.run_sequential(&name, &children, &ctx).await
            }
            ResolvedCommand::Composite { name, parallel: true, children, .. } => {
                self.run_parallel(&name, &children, &ctx).await
            }
        }
    }

    async fn run_exec(
        &self,
        name: &str,
        spec: &ExecSpec,
        ctx: &ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        let default_dir = ctx.workdirs.get(&spec.component).map(String::as_str);
        let script = match ctx.phase {
            Phase::Run => remote::run_script(name, spec, default_dir),
            Phase::Build | Phase::Event => remote::exec_script(spec, default_dir),
        };
        let message = match ctx.phase {
            Phase::Build => building_message(name),
            Phase::Run => running_message(name),
            Phase::Event => executing_message(name, &spec.component),
        };
        ctx.reporter.info(&message);
        tracing::info!(command = name, container = %spec.component, phase = ?ctx.phase, "executing");

        let started_at_ms = self.clock.epoch_ms();
        let start = self.clock.now();
        let request =
            ExecRequest { label: name.to_string(), container: spec.component.clone(), script };
        let (tx, mut rx) = mpsc::channel::<OutputLine>(64);
        let mut tail = OutputTail::new(self.tail_lines);
        let collect = async {
            while let Some(line) = rx.recv().await {
                tracing::trace!(command = name, line = %line.text, "output");
                ctx.reporter.output(name, &line);
                tail.push(line.text);
            }
        };
        let (status, ()) = tokio::join!(self.exec.exec(request, tx, ctx.interrupt.clone()), collect);
        let duration = self.clock.now().saturating_duration_since(start);
        let output = tail.into_lines();

        let status = status
            .map_err(|source| ExecuteError::Platform { command: name.to_string(), source })?;
        tracing::info!(
            command = name,
            ?status,
            elapsed = %format_elapsed_ms(duration.as_millis() as u64),
            "command finished"
        );
        match status {
            ExecStatus::Exited(0) => Ok(CommandExecutionResult {
                name: name.to_string(),
                status: CommandStatus::Succeeded,
                exit_code: Some(0),
                started_at_ms,
                duration,
                output,
                children: Vec::new(),
            }),
            ExecStatus::Exited(code) => Err(ExecuteError::CommandFailed {
                command: name.to_string(),
                exit_code: Some(code),
                tail: output,
            }),
            ExecStatus::Killed => Err(ExecuteError::CommandFailed {
                command: name.to_string(),
                exit_code: None,
                tail: output,
            }),
            ExecStatus::Cancelled => Err(ExecuteError::Cancelled { command: name.to_string() }),
        }
    }

    async fn run_apply(
        &self,
        name: &str,
        component: &str,
        ctx: &ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        let manifest = ctx.devfile.manifest(component)?;
        let started_at_ms = self.clock.epoch_ms();
        let start = self.clock.now();

        let applied = self
            .applier
            .apply(&manifest)
            .await
            .map_err(|source| ExecuteError::Apply { command: name.to_string(), source })?;
        for resource in &applied {
            ctx.reporter.info(&format!("Applied {resource} (command: {name})"));
        }
        let output = applied.iter().map(|r| format!("{r} applied")).collect();
        ctx.applied.lock().extend(applied);

        Ok(CommandExecutionResult {
            name: name.to_string(),
            status: CommandStatus::Succeeded,
            exit_code: None,
            started_at_ms,
            duration: self.clock.now().saturating_duration_since(start),
            output,
            children: Vec::new(),
        })
    }

    async fn run_sequential(
        &self,
        name: &str,
        children: &[ResolvedCommand],
        ctx: &ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        let started_at_ms = self.clock.epoch_ms();
        let start = self.clock.now();
        let mut results = Vec::with_capacity(children.len());

        for child in children {
            let child_started = self.clock.epoch_ms();
            match self.execute(child, ctx).await {
                Ok(result) => results.push(result),
                Err(e) if child.best_effort() && !e.is_cancelled() => {
                    self.report_best_effort(name, child.name(), &e, ctx);
                    results.push(CommandExecutionResult::failed(child.name(), child_started, &e));
                }
                Err(e) => {
                    return Err(ExecuteError::ChildFailed {
                        composite: name.to_string(),
                        child: child.name().to_string(),
                        source: Box::new(e),
                    })
                }
            }
        }

        Ok(self.aggregate(name, started_at_ms, start, results))
    }

    async fn run_parallel(
        &self,
        name: &str,
        children: &[ResolvedCommand],
        ctx: &ExecContext,
    ) -> Result<CommandExecutionResult, ExecuteError> {
        let started_at_ms = self.clock.epoch_ms();
        let start = self.clock.now();

        // Siblings share a token so the first failure stops the rest
        let group_cancel = ctx.cancel.child_token();
        let group_interrupt = ctx.interrupt.child_token();
        let child_ctx = ExecContext {
            cancel: group_cancel.clone(),
            interrupt: group_interrupt.clone(),
            ..ctx.clone()
        };
        let mut set = JoinSet::new();
        for (index, child) in children.iter().enumerate() {
            let execution = self.execute(child, &child_ctx);
            let child_name = child.name().to_string();
            let best_effort = child.best_effort();
            set.spawn(async move { (index, child_name, best_effort, execution.await) });
        }

        let mut slots: Vec<Option<CommandExecutionResult>> = (0..children.len()).map(|_| None).collect();
        let mut failure: Option<(String, ExecuteError)> = None;
        while let Some(joined) = set.join_next().await {
            let (index, child, best_effort, outcome) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(composite = name, error = %e, "parallel child task failed");
                    group_cancel.cancel();
                    group_interrupt.cancel();
                    failure.get_or_insert_with(|| {
                        (String::new(), ExecuteError::Cancelled { command: name.to_string() })
                    });
                    continue;
                }
            };
            match outcome {
                Ok(result) => slots[index] = Some(result),
                Err(e) if best_effort && !e.is_cancelled() => {
                    self.report_best_effort(name, &child, &e, ctx);
                    slots[index] = Some(CommandExecutionResult::failed(&child, started_at_ms, &e));
                }
                Err(e) => {
                    // Later errors are the cancellations this one causes
                    if failure.is_none() {
                        tracing::warn!(composite = name, child, error = %e, "cancelling parallel siblings");
                        group_cancel.cancel();
                        group_interrupt.cancel();
                        failure = Some((child, e));
                    }
                }
            }
        }

        if let Some((child, e)) = failure {
            if child.is_empty() || (e.is_cancelled() && ctx.cancel.is_cancelled()) {
                return Err(ExecuteError::Cancelled { command: name.to_string() });
            }
            return Err(ExecuteError::ChildFailed {
                composite: name.to_string(),
                child,
                source: Box::new(e),
            });
        }
        let results = slots.into_iter().flatten().collect();
        Ok(self.aggregate(name, started_at_ms, start, results))
    }

    fn aggregate(
        &self,
        name: &str,
        started_at_ms: u64,
        start: std::time::Instant,
        children: Vec<CommandExecutionResult>,
    ) -> CommandExecutionResult {
        CommandExecutionResult {
            name: name.to_string(),
            status: CommandStatus::Succeeded,
            exit_code: None,
            started_at_ms,
            duration: self.clock.now().saturating_duration_since(start),
            output: Vec::new(),
            children,
        }
    }

    fn report_best_effort(&self, composite: &str, child: &str, error: &ExecuteError, ctx: &ExecContext) {
        tracing::warn!(composite, child, error = %error, "best-effort command failed");
        ctx.reporter.warn(&format!("Command {child:?} failed, continuing: {error}"));
    }

    /// Start a run/debug command in the background.
    pub fn start_run(&self, command: &ResolvedCommand, ctx: &ExecContext) -> RunHandle {
        let cancel = ctx.cancel.child_token();
        let run_ctx = ctx.with_phase(Phase::Run).with_cancel(cancel.clone());
        let leaves = exec_leaves(command);
        let hot_reload = !leaves.is_empty() && leaves.iter().all(|(_, spec)| spec.hot_reload_capable);
        RunHandle {
            command: command.name().to_string(),
            leaves: leaves.into_iter().map(|(name, spec)| (name, spec.component)).collect(),
            hot_reload,
            cancel,
            task: Some(tokio::spawn(self.execute(command, &run_ctx))),
        }
    }

    /// Wait out the grace period. A run command that ends within it with an
    /// error is a failed start; one that ends cleanly only gets a warning.
    pub async fn await_started(&self, handle: &mut RunHandle, grace: Duration) -> Result<(), ExecuteError> {
        let Some(task) = handle.task.as_mut() else {
            return Ok(());
        };
        let joined = match tokio::time::timeout(grace, task).await {
            Err(_) => return Ok(()),
            Ok(joined) => joined,
        };
        handle.task = None;
        match joined {
            Ok(Ok(_)) => {
                tracing::warn!(command = %handle.command, "run command exited during startup");
                Ok(())
            }
            Ok(Err(e)) if e.is_cancelled() => Err(e),
            Ok(Err(e)) => {
                let command = match e.failed_command() {
                    "" => handle.command.clone(),
                    leaf => leaf.to_string(),
                };
                Err(ExecuteError::RunFailure { command, tail: e.tail().to_vec() })
            }
            Err(e) => {
                tracing::error!(command = %handle.command, error = %e, "run task failed");
                Err(ExecuteError::Cancelled { command: handle.command.clone() })
            }
        }
    }

    /// Check each exec leaf's PID file in its container.
    pub async fn is_running(&self, handle: &RunHandle) -> bool {
        for (name, container) in &handle.leaves {
            match self.exec_quiet(name, container, remote::alive_script(name)).await {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    tracing::debug!(command = %name, ?status, "run command not alive");
                    return false;
                }
                Err(e) => {
                    tracing::warn!(command = %name, error = %e, "liveness check failed");
                    return false;
                }
            }
        }
        true
    }

    /// Stop the run command: drop the local exec stream, then kill the
    /// recorded remote process.
    pub async fn stop_run(&self, mut handle: RunHandle) {
        handle.cancel.cancel();
        if let Some(task) = handle.task.take() {
            let _ = task.await;
        }
        for (name, container) in &handle.leaves {
            if let Err(e) = self.exec_quiet(name, container, remote::stop_script(name)).await {
                tracing::warn!(command = %name, error = %e, "failed to stop remote process");
            }
        }
        tracing::info!(command = %handle.command, "run command stopped");
    }

    async fn exec_quiet(
        &self,
        name: &str,
        container: &str,
        script: String,
    ) -> Result<ExecStatus, dl_adapters::AdapterError> {
        let (tx, _rx) = mpsc::channel(16);
        let request = ExecRequest { label: name.to_string(), container: container.to_string(), script };
        self.exec.exec(request, tx, CancellationToken::new()).await
    }
}

/// A run/debug command started in the background
#[derive(Debug)]
pub struct RunHandle {
    command: String,
    /// (command name, container) for each exec leaf
    leaves: Vec<(String, String)>,
    hot_reload: bool,
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<CommandExecutionResult, ExecuteError>>>,
}

impl RunHandle {
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether every exec leaf reloads changed sources itself.
    pub fn hot_reload_capable(&self) -> bool {
        self.hot_reload
    }

    /// Whether the local exec stream has ended.
    pub fn has_exited(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }
}

fn exec_leaves(command: &ResolvedCommand) -> Vec<(String, ExecSpec)> {
    match command {
        ResolvedCommand::Exec { name, spec, .. } => vec![(name.clone(), spec.clone())],
        ResolvedCommand::Apply { .. } => Vec::new(),
        ResolvedCommand::Composite { children, .. } => children.iter().flat_map(exec_leaves).collect(),
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
