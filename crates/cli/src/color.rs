// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal palette for session progress and clap help.

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

/// 256-color palette entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Headers and local URLs
    Header = 74,
    Literal = 250,
    /// Command labels and hints
    Context = 245,
    Warn = 179,
    Error = 167,
}

impl Tone {
    fn code(self) -> u8 {
        self as u8
    }

    fn style(self) -> Style {
        Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(self.code()))))
    }

    pub fn paint(self, text: &str) -> String {
        if should_colorize() {
            format!("\x1b[38;5;{}m{text}\x1b[0m", self.code())
        } else {
            text.to_string()
        }
    }
}

/// `NO_COLOR` disables, `COLOR` forces, otherwise only on a TTY.
pub fn should_colorize() -> bool {
    !crate::env::no_color() && (crate::env::force_color() || std::io::stdout().is_terminal())
}

pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Tone::Header.style())
        .literal(Tone::Literal.style())
        .placeholder(Tone::Context.style())
}

pub fn header(text: &str) -> String {
    Tone::Header.paint(text)
}

pub fn context(text: &str) -> String {
    Tone::Context.paint(text)
}

pub fn warn(text: &str) -> String {
    Tone::Warn.paint(text)
}

pub fn error(text: &str) -> String {
    Tone::Error.paint(text)
}

#[cfg(test)]
#[path = "color_tests.rs"]
mod tests;
