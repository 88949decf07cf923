// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session controller tests

mod lifecycle;
mod start;
mod sync;

use super::*;
use crate::report::RecordingReporter;
use dl_adapters::{ExecResponse, FakeApplier, FakeExecAdapter, FakeTunneler, LocalMirror};
use dl_core::FakeClock;
use dl_storage::{json::read_json, pid_state_path, DevState, FakeProbe};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const DEVFILE: &str = r#"
schemaVersion: 2.2.0
metadata:
  name: web
components:
  - name: runtime
    container:
      image: node:18
      endpoints:
        - name: http-3000
          targetPort: 3000
        - name: debug
          targetPort: 5858
  - name: config
    kubernetes:
      inlined: |
        apiVersion: v1
        kind: ConfigMap
        metadata:
          name: web-config
commands:
  - id: devbuild
    exec: { component: runtime, commandLine: npm install, group: { kind: build, isDefault: true } }
  - id: my-custom-build
    exec: { component: runtime, commandLine: touch /projects/custom-build-marker, group: { kind: build } }
  - id: devrun
    exec: { component: runtime, commandLine: npm start, group: { kind: run, isDefault: true } }
  - id: apply-config
    apply: { component: config }
  - id: farewell
    exec: { component: runtime, commandLine: ./farewell.sh }
events:
  postStart: [apply-config]
  preStop: [farewell]
"#;

const PID: u32 = 41_000;

struct Harness {
    project: TempDir,
    _remote: TempDir,
    exec: FakeExecAdapter,
    mirror: LocalMirror,
    tunnels: FakeTunneler,
    applier: FakeApplier,
    probe: FakeProbe,
    reporter: RecordingReporter,
}

impl Harness {
    fn new() -> Self {
        let project = TempDir::new().unwrap();
        std::fs::write(project.path().join("devfile.yaml"), DEVFILE).unwrap();
        let remote = TempDir::new().unwrap();
        let exec = FakeExecAdapter::new();
        exec.respond("npm start", ExecResponse::hang());
        Self {
            mirror: LocalMirror::new(remote.path()),
            project,
            _remote: remote,
            exec,
            tunnels: FakeTunneler::new(),
            applier: FakeApplier::new(),
            probe: FakeProbe::with_alive(&[]),
            reporter: RecordingReporter::new(),
        }
    }

    fn root(&self) -> &Path {
        self.project.path()
    }

    fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn remote_exists(&self, rel: &str) -> bool {
        self.mirror.path("runtime", &format!("/projects/{rel}")).exists()
    }

    fn options(&self) -> SessionOptions {
        let mut options = SessionOptions::new(self.root());
        options.watch = false;
        options.pid = PID;
        options.settings.run_grace = Duration::from_millis(10);
        options
    }

    fn deps(&self) -> SessionDeps<FakeExecAdapter, LocalMirror, FakeTunneler, FakeApplier, FakeClock> {
        SessionDeps {
            exec: self.exec.clone(),
            files: self.mirror.clone(),
            tunnels: self.tunnels.clone(),
            applier: self.applier.clone(),
            clock: FakeClock::ticking(Duration::from_millis(1)),
            probe: Arc::new(self.probe.clone()),
            reporter: Arc::new(self.reporter.clone()),
        }
    }

    async fn start(&self) -> SessionHandle {
        self.start_with(self.options()).await
    }

    async fn start_with(&self, options: SessionOptions) -> SessionHandle {
        start(options, self.deps()).await.unwrap()
    }

    fn state_file(&self, pid: u32) -> Option<DevState> {
        read_json(&pid_state_path(self.root(), pid)).unwrap()
    }
}
