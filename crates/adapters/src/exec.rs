// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running shell scripts inside component containers

use crate::error::AdapterError;
use crate::workload::Workload;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Devfile command name, for logs.
    pub label: String,
    pub container: String,
    /// Script passed to `sh -c` inside the container.
    pub script: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Exited(i32),
    /// Terminated by a signal.
    Killed,
    /// Stopped locally because the cancellation token fired.
    Cancelled,
}

impl ExecStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExecStatus::Exited(0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: Stream,
    pub text: String,
}

/// Adapter for running commands inside a component's containers
#[async_trait]
pub trait ExecAdapter: Clone + Send + Sync + 'static {
    /// Run `req` to completion, streaming output lines to `output`.
    ///
    /// Returns [`ExecStatus::Cancelled`] as soon as `cancel` fires; the local
    /// client process is killed, the remote side is left to the caller.
    async fn exec(
        &self,
        req: ExecRequest,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExecStatus, AdapterError>;
}

/// Exec through `kubectl exec` or `podman exec`.
#[derive(Debug, Clone)]
pub struct CliExecAdapter {
    workload: Workload,
}

impl CliExecAdapter {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

#[async_trait]
impl ExecAdapter for CliExecAdapter {
    async fn exec(
        &self,
        req: ExecRequest,
        output: mpsc::Sender<OutputLine>,
        cancel: CancellationToken,
    ) -> Result<ExecStatus, AdapterError> {
        let (program, args) = self.workload.exec_argv(&req.container, &req.script, false);
        tracing::debug!(command = %req.label, container = %req.container, %program, "exec");

        let mut child = tokio::process::Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdapterError::Spawn { program: program.clone(), source })?;

        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, Stream::Stdout, output.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, Stream::Stderr, output)));
        }

        let status = tokio::select! {
            status = child.wait() => status.map_err(|source| AdapterError::Spawn { program, source })?,
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                for reader in readers {
                    reader.abort();
                }
                return Ok(ExecStatus::Cancelled);
            }
        };
        for reader in readers {
            let _ = reader.await;
        }

        Ok(match status.code() {
            Some(code) => ExecStatus::Exited(code),
            None => ExecStatus::Killed,
        })
    }
}

/// Forward each line of `reader` until EOF or the receiver goes away.
pub async fn forward_lines<R>(reader: R, stream: Stream, tx: mpsc::Sender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(text)) = lines.next_line().await {
        if tx.send(OutputLine { stream, text }).await.is_err() {
            break;
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ExecAdapter, ExecRequest, ExecStatus, OutputLine, Stream};
    use crate::error::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    type Effect = Arc<dyn Fn(&ExecRequest) + Send + Sync>;

    /// Scripted response for scripts containing a pattern.
    #[derive(Clone, Default)]
    pub struct ExecResponse {
        pub exit_code: i32,
        pub stdout: Vec<String>,
        pub stderr: Vec<String>,
        pub delay: Duration,
        /// Run until cancelled (long-lived run commands).
        pub hang: bool,
        effect: Option<Effect>,
    }

    impl ExecResponse {
        pub fn ok() -> Self {
            Self::default()
        }

        pub fn fail(exit_code: i32, stderr: &str) -> Self {
            Self { exit_code, stderr: vec![stderr.to_string()], ..Self::default() }
        }

        pub fn hang() -> Self {
            Self { hang: true, ..Self::default() }
        }

        pub fn stdout(mut self, line: &str) -> Self {
            self.stdout.push(line.to_string());
            self
        }

        pub fn after(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Run `f` when the script starts (e.g. to create files in a local mirror).
        pub fn effect(mut self, f: impl Fn(&ExecRequest) + Send + Sync + 'static) -> Self {
            self.effect = Some(Arc::new(f));
            self
        }
    }

    /// Recorded exec call
    #[derive(Debug, Clone)]
    pub struct ExecCall {
        pub label: String,
        pub container: String,
        pub script: String,
        pub started: Instant,
        pub status: Option<ExecStatus>,
    }

    #[derive(Default)]
    struct FakeExecState {
        rules: Vec<(String, ExecResponse)>,
        calls: Vec<ExecCall>,
    }

    /// Fake exec adapter for testing. Unmatched scripts succeed immediately.
    #[derive(Clone, Default)]
    pub struct FakeExecAdapter {
        inner: Arc<Mutex<FakeExecState>>,
    }

    impl FakeExecAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to scripts containing `pattern`. Later rules take precedence.
        pub fn respond(&self, pattern: &str, response: ExecResponse) {
            self.inner.lock().rules.push((pattern.to_string(), response));
        }

        pub fn calls(&self) -> Vec<ExecCall> {
            self.inner.lock().calls.clone()
        }

        /// Labels of calls, in start order.
        pub fn labels(&self) -> Vec<String> {
            self.inner.lock().calls.iter().map(|c| c.label.clone()).collect()
        }

        pub fn scripts_containing(&self, needle: &str) -> Vec<String> {
            self.inner
                .lock()
                .calls
                .iter()
                .filter(|c| c.script.contains(needle))
                .map(|c| c.script.clone())
                .collect()
        }

        fn finish(&self, index: usize, status: ExecStatus) -> ExecStatus {
            if let Some(call) = self.inner.lock().calls.get_mut(index) {
                call.status = Some(status);
            }
            status
        }
    }

    #[async_trait]
    impl ExecAdapter for FakeExecAdapter {
        async fn exec(
            &self,
            req: ExecRequest,
            output: mpsc::Sender<OutputLine>,
            cancel: CancellationToken,
        ) -> Result<ExecStatus, AdapterError> {
            let (index, response) = {
                let mut inner = self.inner.lock();
                let response = inner
                    .rules
                    .iter()
                    .rev()
                    .find(|(pattern, _)| req.script.contains(pattern.as_str()))
                    .map(|(_, r)| r.clone())
                    .unwrap_or_default();
                inner.calls.push(ExecCall {
                    label: req.label.clone(),
                    container: req.container.clone(),
                    script: req.script.clone(),
                    started: Instant::now(),
                    status: None,
                });
                (inner.calls.len() - 1, response)
            };

            if let Some(effect) = &response.effect {
                effect(&req);
            }
            for text in &response.stdout {
                let _ = output.send(OutputLine { stream: Stream::Stdout, text: text.clone() }).await;
            }

            if response.hang {
                cancel.cancelled().await;
                return Ok(self.finish(index, ExecStatus::Cancelled));
            }
            if !response.delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(response.delay) => {}
                    _ = cancel.cancelled() => return Ok(self.finish(index, ExecStatus::Cancelled)),
                }
            }

            for text in &response.stderr {
                let _ = output.send(OutputLine { stream: Stream::Stderr, text: text.clone() }).await;
            }
            Ok(self.finish(index, ExecStatus::Exited(response.exit_code)))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecCall, ExecResponse, FakeExecAdapter};

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
