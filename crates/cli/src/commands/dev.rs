// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dl dev`: run an interactive dev session in the current directory.

use crate::exit_error::{ExitError, EXIT_FAILURE};
use crate::output::port_lines;
use crate::reporter::TerminalReporter;
use anyhow::Result;
use clap::Args;
use dl_adapters::{CliExecAdapter, CliFileSync, CliTunneler, KubeApplier, PlatformApplier, Workload};
use dl_core::{Platform, SystemClock};
use dl_devfile::{load_devfile, CommandSelection, VarOverrides};
use dl_engine::{start, KeyAction, PortPin, SessionDeps, SessionHandle, SessionOptions, Settings, SYNC_KEY};
use dl_storage::SystemProbe;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Args, Debug, Clone, Default)]
pub struct DevArgs {
    /// Do not watch the source tree; press p to sync manually
    #[arg(long)]
    pub no_watch: bool,

    /// Start the debug command and forward debug endpoints
    #[arg(long)]
    pub debug: bool,

    /// Build command to run instead of the default build command
    #[arg(long, value_name = "NAME")]
    pub build_command: Option<String>,

    /// Run command to start instead of the default run command
    #[arg(long, value_name = "NAME")]
    pub run_command: Option<String>,

    /// Debug command to start instead of the default debug command
    #[arg(long, value_name = "NAME", requires = "debug")]
    pub debug_command: Option<String>,

    /// Override a devfile variable
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// File of KEY=VALUE lines overriding devfile variables
    #[arg(long, value_name = "PATH")]
    pub var_file: Option<PathBuf>,

    /// Where the component runs (cluster or podman)
    #[arg(long, default_value = "cluster")]
    pub platform: Platform,

    /// Do not reuse ports recorded by an earlier session
    #[arg(long, conflicts_with = "port_forwards")]
    pub random_ports: bool,

    /// Pin a local port: LOCAL:CONTAINER or LOCAL:CONTAINER_NAME:CONTAINER
    #[arg(long = "port-forward", value_name = "SPEC", value_parser = PortPin::parse)]
    pub port_forwards: Vec<PortPin>,

    /// Keep resources created by apply commands on exit
    #[arg(long)]
    pub keep_resources: bool,
}

impl DevArgs {
    pub fn selection(&self) -> CommandSelection {
        CommandSelection {
            build: self.build_command.clone(),
            run: self.run_command.clone(),
            debug: self.debug_command.clone(),
            debug_mode: self.debug,
        }
    }

    pub fn session_options(&self, root: &Path, overrides: VarOverrides, settings: Settings) -> SessionOptions {
        let mut options = SessionOptions::new(root);
        options.platform = self.platform;
        options.selection = self.selection();
        options.overrides = overrides;
        options.watch = !self.no_watch;
        options.random_ports = self.random_ports;
        options.port_forwards = self.port_forwards.clone();
        options.keep_resources = self.keep_resources;
        options.settings = settings;
        options
    }
}

pub async fn handle(args: DevArgs, root: PathBuf) -> Result<()> {
    let settings = Settings::load()?;
    let overrides = VarOverrides::from_sources(args.var_file.as_deref(), &args.vars)?;
    // Fail on a missing or invalid devfile before touching the platform
    let devfile = load_devfile(&root, &overrides)?;

    let workload = Workload::locate(args.platform, &devfile.name).await?;
    let applier = match args.platform {
        Platform::Cluster => PlatformApplier::Cluster(KubeApplier::connect(dl_adapters::env::namespace()).await?),
        Platform::Podman => PlatformApplier::Podman,
    };
    let deps = SessionDeps {
        exec: CliExecAdapter::new(workload.clone()),
        files: CliFileSync::new(workload.clone()),
        tunnels: CliTunneler::new(workload),
        applier,
        clock: SystemClock,
        probe: Arc::new(SystemProbe),
        reporter: Arc::new(TerminalReporter),
    };

    println!("Developing {} on {}", devfile.name, args.platform);
    let mut session = start(args.session_options(&root, overrides, settings), deps).await?;
    match session.wait_for_sync().await {
        Ok(ports) => print_ports(&ports),
        Err(e) => tracing::warn!(error = %e, kind = e.kind(), "initial sync failed"),
    }
    println!("Keyboard commands: [{SYNC_KEY}] sync now, [Ctrl+C] stop");

    interact(&mut session).await?;

    println!("Cleaning up");
    session.stop().await?;
    println!("Finished dev session");
    Ok(())
}

enum Input {
    Interrupt,
    Key(Option<char>),
    Ended,
}

/// Forward key presses until Ctrl+C.
async fn interact(session: &mut SessionHandle) -> Result<()> {
    let mut keys = Some(spawn_key_reader());
    loop {
        let input = tokio::select! {
            _ = tokio::signal::ctrl_c() => Input::Interrupt,
            key = next_key(&mut keys) => Input::Key(key),
            _ = session.stopped() => Input::Ended,
        };
        match input {
            Input::Interrupt => return Ok(()),
            Input::Ended => {
                return Err(ExitError::new(EXIT_FAILURE, "dev session ended unexpectedly").into())
            }
            Input::Key(None) => {
                tracing::debug!("stdin closed, keyboard commands disabled");
                keys = None;
            }
            Input::Key(Some(key)) => match session.press_key(key).await {
                Ok(KeyAction::Synced(ports)) => print_ports(&ports),
                Ok(KeyAction::Ignored(_)) => {}
                // Already reported by the session
                Err(e) => tracing::debug!(error = %e, "manual sync failed"),
            },
        }
    }
}

async fn next_key(keys: &mut Option<mpsc::Receiver<char>>) -> Option<char> {
    match keys {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Read stdin on a plain thread; a blocking read must not hold up runtime shutdown.
fn spawn_key_reader() -> mpsc::Receiver<char> {
    let (tx, rx) = mpsc::channel(8);
    std::thread::spawn(move || {
        for byte in std::io::stdin().lock().bytes() {
            let Ok(byte) = byte else { break };
            let key = char::from(byte);
            if key.is_ascii_whitespace() {
                continue;
            }
            if tx.blocking_send(key).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_ports(ports: &[dl_core::ForwardedPort]) {
    if ports.is_empty() {
        return;
    }
    println!("Forwarded ports:");
    for line in port_lines(ports) {
        println!(" •  {line}");
    }
}

#[cfg(test)]
#[path = "dev_tests.rs"]
mod tests;
