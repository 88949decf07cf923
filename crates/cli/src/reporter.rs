// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::color;
use dl_adapters::{OutputLine, Stream};
use dl_engine::Reporter;

/// Progress lines on stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalReporter;

impl Reporter for TerminalReporter {
    fn info(&self, message: &str) {
        println!(" •  {message}");
    }

    fn warn(&self, message: &str) {
        println!(" ⚠  {}", color::warn(message));
    }

    fn output(&self, command: &str, line: &OutputLine) {
        let prefix = color::context(&format!("[{command}]"));
        match line.stream {
            Stream::Stdout => println!("{prefix} {}", line.text),
            Stream::Stderr => println!("{prefix} {}", color::warn(&line.text)),
        }
    }
}
