// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dl: interactive dev sessions for devfile components

mod color;
mod commands;
mod env;
mod exit_error;
mod logging;
mod output;
mod reporter;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{delete, describe, dev};
use output::OutputFormat;
use dl_storage::state_dir;
use std::path::Path;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(
    name = "dl",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Sync, build and run a devfile component while you edit it",
    styles = color::styles(),
)]
struct Cli {
    /// Output format for results and errors
    #[arg(short = 'o', long = "output", global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Push, build and run the component, then keep it in sync with local edits
    Dev(dev::DevArgs),
    /// Show the component, its commands and live sessions
    Describe,
    /// Remove state and resources left by sessions that did not shut down
    Delete,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.output;
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&err, format);
            let code = u8::try_from(output::exit_code(&err)).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let root = std::env::current_dir().context("cannot read the current directory")?;
    match cli.command {
        Command::Dev(args) => {
            let _guard = init_logging(&root);
            tracing::info!(root = %root.display(), platform = %args.platform, "dl dev");
            dev::handle(args, root).await
        }
        Command::Describe => {
            logging::init_stderr();
            describe::handle(&root, cli.output)
        }
        Command::Delete => {
            let _guard = init_logging(&root);
            delete::handle(&root, cli.output).await
        }
    }
}

/// Log into the state directory only inside a project; `.devloop` is never
/// created next to a missing devfile.
fn init_logging(root: &Path) -> Option<WorkerGuard> {
    let dir = state_dir(root);
    if dir.is_dir() || dl_devfile::find_devfile(root).is_ok() {
        return logging::init_file(&dir);
    }
    logging::init_stderr();
    None
}
