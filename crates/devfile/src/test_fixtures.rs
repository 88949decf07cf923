// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Devfiles shared by unit tests

use crate::{Devfile, VarOverrides};

/// Node component with two builds, run/debug, a composite, and an apply.
pub const NODE: &str = r#"
schemaVersion: 2.2.0
metadata:
  name: nodejs-app
variables:
  PORT: "3000"
projects:
  - name: web
components:
  - name: runtime
    container:
      image: node:18
      endpoints:
        - name: http-3000
          targetPort: 3000
        - name: debug
          targetPort: 5858
        - name: metrics
          targetPort: 9090
          exposure: none
  - name: tools
    container:
      image: busybox
      mountSources: false
  - name: config
    kubernetes:
      inlined: |
        apiVersion: v1
        kind: ConfigMap
        metadata:
          name: app-config
        data:
          port: "{{PORT}}"
commands:
  - id: devbuild
    exec:
      component: runtime
      commandLine: npm install
      group: { kind: build, isDefault: true }
  - id: my-custom-build
    exec:
      component: runtime
      commandLine: touch /projects/custom-build-marker
      group: { kind: build }
  - id: devrun
    exec:
      component: runtime
      commandLine: PORT={{PORT}} npm start
      group: { kind: run, isDefault: true }
  - id: devdebug
    exec:
      component: runtime
      commandLine: npm run debug
      group: { kind: debug }
  - id: apply-config
    apply:
      component: config
  - id: lint
    exec:
      component: tools
      commandLine: echo lint
      group: { kind: test }
  - id: prepare
    composite:
      commands: [apply-config, lint]
events:
  postStart: [prepare]
"#;

pub fn node() -> Devfile {
    Devfile::parse(NODE, &VarOverrides::new()).unwrap()
}
