// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builders shared by every spec.

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const DEVFILE: &str = r#"
schemaVersion: 2.2.0
metadata:
  name: web
components:
  - name: runtime
    container:
      image: node:20
      endpoints:
        - name: http-3000
          targetPort: 3000
commands:
  - id: install
    exec:
      component: runtime
      commandLine: npm install
      group: { kind: build, isDefault: true }
  - id: start
    exec:
      component: runtime
      commandLine: npm start
      group: { kind: run, isDefault: true }
"#;

/// `dl` run from a directory with no project.
pub fn cli() -> CliBuilder {
    CliBuilder::new(std::env::temp_dir())
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    fn new(dir: PathBuf) -> Self {
        let mut cmd = Command::cargo_bin("dl").expect("dl binary is built for specs");
        cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("DL_LOG");
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn pwd(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    pub fn passes(self) -> RunAssert {
        self.code(0)
    }

    /// Fails with the generic failure code.
    pub fn fails(self) -> RunAssert {
        self.code(1)
    }

    pub fn code(mut self, expected: i32) -> RunAssert {
        let output = self.cmd.write_stdin("").output().expect("dl runs");
        let run = RunAssert {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        assert_eq!(
            output.status.code(),
            Some(expected),
            "unexpected exit status\nstdout:\n{}\nstderr:\n{}",
            run.stdout,
            run.stderr
        );
        run
    }
}

pub struct RunAssert {
    pub stdout: String,
    pub stderr: String,
}

impl RunAssert {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout lacks {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout has {needle:?}:\n{}", self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr lacks {needle:?}:\n{}", self.stderr);
        self
    }

    pub fn stdout_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is JSON")
    }

    /// The error envelope printed under `-o json`.
    pub fn stderr_json(&self) -> serde_json::Value {
        let line = self.stderr.lines().last().unwrap_or_default();
        serde_json::from_str(line).expect("last stderr line is JSON")
    }
}

/// Scratch project directory.
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self { dir: TempDir::new().expect("temp dir") }
    }

    pub fn with_devfile() -> Self {
        let project = Self::empty();
        project.file("devfile.yaml", DEVFILE);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.dir.path().join(rel).exists()
    }

    pub fn dl(&self) -> CliBuilder {
        CliBuilder::new(self.path().to_path_buf())
    }
}
