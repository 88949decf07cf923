// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pushing source files into containers

use crate::error::AdapterError;
use crate::shell::{run_cli, shell_quote};
use crate::workload::Workload;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;

/// Adapter for copying files into, and deleting files from, a container.
#[async_trait]
pub trait FileSync: Clone + Send + Sync + 'static {
    /// Copy `paths` (relative to `local_root`) under `remote_dir`.
    /// Keys ending in `/` are directories.
    async fn upload(
        &self,
        container: &str,
        remote_dir: &str,
        local_root: &Path,
        paths: &[String],
    ) -> Result<(), AdapterError>;

    /// Recursively delete absolute `remote_paths`. Missing paths are not an error.
    async fn remove(&self, container: &str, remote_paths: &[String]) -> Result<(), AdapterError>;
}

/// Push through a local `tar` piped into `tar -x` over exec.
#[derive(Debug, Clone)]
pub struct CliFileSync {
    workload: Workload,
}

impl CliFileSync {
    pub fn new(workload: Workload) -> Self {
        Self { workload }
    }
}

/// Remote side of the tar pipe.
pub fn extract_script(remote_dir: &str) -> String {
    let dir = shell_quote(remote_dir);
    format!("mkdir -p {dir} && tar -xf - -C {dir}")
}

pub fn remove_script(remote_paths: &[String]) -> String {
    let quoted: Vec<String> = remote_paths.iter().map(|p| shell_quote(p)).collect();
    format!("rm -rf -- {}", quoted.join(" "))
}

#[async_trait]
impl FileSync for CliFileSync {
    async fn upload(
        &self,
        container: &str,
        remote_dir: &str,
        local_root: &Path,
        paths: &[String],
    ) -> Result<(), AdapterError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut tar_args = vec![
            "-C".to_string(),
            local_root.display().to_string(),
            "--no-recursion".to_string(),
            "-cf".to_string(),
            "-".to_string(),
            "--".to_string(),
        ];
        tar_args.extend(paths.iter().cloned());

        let mut tar = tokio::process::Command::new("tar")
            .args(&tar_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdapterError::Spawn { program: "tar".to_string(), source })?;

        let (program, args) = self.workload.exec_argv(container, &extract_script(remote_dir), true);
        let mut exec = tokio::process::Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdapterError::Spawn { program: program.clone(), source })?;

        if let (Some(mut archive), Some(mut remote)) = (tar.stdout.take(), exec.stdin.take()) {
            tokio::io::copy(&mut archive, &mut remote)
                .await
                .map_err(|e| AdapterError::Tunnel(format!("copying archive: {e}")))?;
            remote
                .shutdown()
                .await
                .map_err(|e| AdapterError::Tunnel(format!("closing archive stream: {e}")))?;
        }

        let tar_out = tar
            .wait_with_output()
            .await
            .map_err(|source| AdapterError::Spawn { program: "tar".to_string(), source })?;
        let exec_out = exec
            .wait_with_output()
            .await
            .map_err(|source| AdapterError::Spawn { program: program.clone(), source })?;

        if !tar_out.status.success() {
            return Err(AdapterError::CommandFailed {
                program: "tar".to_string(),
                action: "create".to_string(),
                stderr: String::from_utf8_lossy(&tar_out.stderr).trim().to_string(),
            });
        }
        if !exec_out.status.success() {
            return Err(AdapterError::CommandFailed {
                program,
                action: "exec".to_string(),
                stderr: String::from_utf8_lossy(&exec_out.stderr).trim().to_string(),
            });
        }
        tracing::debug!(container, remote_dir, files = paths.len(), "uploaded files");
        Ok(())
    }

    async fn remove(&self, container: &str, remote_paths: &[String]) -> Result<(), AdapterError> {
        if remote_paths.is_empty() {
            return Ok(());
        }
        let (program, args) = self.workload.exec_argv(container, &remove_script(remote_paths), false);
        run_cli(&program, &args).await?;
        tracing::debug!(container, files = remote_paths.len(), "removed remote files");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::FileSync;
    use crate::error::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Recorded push operation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum PushCall {
        Upload { container: String, remote_dir: String, paths: Vec<String> },
        Remove { container: String, remote_paths: Vec<String> },
    }

    #[derive(Default)]
    struct MirrorState {
        calls: Vec<PushCall>,
        fail_uploads: bool,
    }

    /// File sync into a local directory: `<root>/<container>/<remote path>`.
    #[derive(Clone)]
    pub struct LocalMirror {
        root: PathBuf,
        inner: Arc<Mutex<MirrorState>>,
    }

    impl LocalMirror {
        pub fn new(root: impl Into<PathBuf>) -> Self {
            Self { root: root.into(), inner: Arc::new(Mutex::new(MirrorState::default())) }
        }

        /// Local location standing in for `remote_path` in `container`.
        pub fn path(&self, container: &str, remote_path: &str) -> PathBuf {
            self.root.join(container).join(remote_path.trim_start_matches('/'))
        }

        pub fn calls(&self) -> Vec<PushCall> {
            self.inner.lock().calls.clone()
        }

        /// All uploaded relative paths, in upload order.
        pub fn uploaded(&self) -> Vec<String> {
            self.inner
                .lock()
                .calls
                .iter()
                .filter_map(|c| match c {
                    PushCall::Upload { paths, .. } => Some(paths.clone()),
                    PushCall::Remove { .. } => None,
                })
                .flatten()
                .collect()
        }

        pub fn set_fail_uploads(&self, fail: bool) {
            self.inner.lock().fail_uploads = fail;
        }

        fn io(path: &Path, e: std::io::Error) -> AdapterError {
            AdapterError::CommandFailed {
                program: "mirror".to_string(),
                action: path.display().to_string(),
                stderr: e.to_string(),
            }
        }
    }

    #[async_trait]
    impl FileSync for LocalMirror {
        async fn upload(
            &self,
            container: &str,
            remote_dir: &str,
            local_root: &Path,
            paths: &[String],
        ) -> Result<(), AdapterError> {
            {
                let mut inner = self.inner.lock();
                inner.calls.push(PushCall::Upload {
                    container: container.to_string(),
                    remote_dir: remote_dir.to_string(),
                    paths: paths.to_vec(),
                });
                if inner.fail_uploads {
                    return Err(AdapterError::CommandFailed {
                        program: "mirror".to_string(),
                        action: "upload".to_string(),
                        stderr: "upload rejected".to_string(),
                    });
                }
            }
            let base = self.path(container, remote_dir);
            for rel in paths {
                let dest = base.join(rel.trim_end_matches('/'));
                if rel.ends_with('/') {
                    std::fs::create_dir_all(&dest).map_err(|e| Self::io(&dest, e))?;
                    continue;
                }
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| Self::io(parent, e))?;
                }
                let src = local_root.join(rel);
                std::fs::copy(&src, &dest).map_err(|e| Self::io(&src, e))?;
            }
            Ok(())
        }

        async fn remove(&self, container: &str, remote_paths: &[String]) -> Result<(), AdapterError> {
            self.inner.lock().calls.push(PushCall::Remove {
                container: container.to_string(),
                remote_paths: remote_paths.to_vec(),
            });
            for remote in remote_paths {
                let target = self.path(container, remote);
                let result = if target.is_dir() {
                    std::fs::remove_dir_all(&target)
                } else {
                    std::fs::remove_file(&target)
                };
                match result {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => return Err(Self::io(&target, e)),
                }
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{LocalMirror, PushCall};

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
