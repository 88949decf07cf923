// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for running platform CLIs

use crate::error::AdapterError;
use std::process::Output;

/// Quote `s` for a POSIX shell using single quotes.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Run a CLI to completion and return trimmed stdout on success.
pub async fn run_cli(program: &str, args: &[String]) -> Result<String, AdapterError> {
    let output = tokio::process::Command::new(program)
        .args(args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| AdapterError::Spawn { program: program.to_string(), source })?;
    check_output(program, args, output)
}

fn check_output(program: &str, args: &[String], output: Output) -> Result<String, AdapterError> {
    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        Err(AdapterError::CommandFailed {
            program: program.to_string(),
            action: args.first().cloned().unwrap_or_default(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        plain  = { "npm start", "'npm start'" },
        quote  = { "echo 'hi'", "'echo '\\''hi'\\'''" },
        empty  = { "", "''" },
    )]
    fn quotes(input: &str, expected: &str) {
        assert_eq!(shell_quote(input), expected);
    }

    #[tokio::test]
    async fn run_cli_reports_stderr() {
        let args = vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()];
        let err = run_cli("sh", &args).await.unwrap_err();
        assert!(matches!(err, AdapterError::CommandFailed { ref stderr, .. } if stderr == "boom"));
    }

    #[tokio::test]
    async fn run_cli_returns_stdout() {
        let args = vec!["-c".to_string(), "echo ok".to_string()];
        assert_eq!(run_cli("sh", &args).await.unwrap(), "ok");
    }
}
