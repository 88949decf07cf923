// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded buffer of a command's most recent output lines

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct OutputTail {
    lines: VecDeque<String>,
    capacity: usize,
    dropped: usize,
}

impl OutputTail {
    pub fn new(capacity: usize) -> Self {
        Self { lines: VecDeque::with_capacity(capacity.min(1024)), capacity: capacity.max(1), dropped: 0 }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
            self.dropped += 1;
        }
        self.lines.push_back(line.into());
    }

    /// Number of lines that fell off the front.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines.into()
    }
}

/// Indent a tail for display under an error message.
pub fn format_tail(tail: &[String]) -> String {
    if tail.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for line in tail {
        out.push_str("\n  ");
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_last_lines() {
        let mut tail = OutputTail::new(3);
        for i in 0..5 {
            tail.push(format!("line {i}"));
        }
        assert_eq!(tail.dropped(), 2);
        assert_eq!(tail.into_lines(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn zero_capacity_keeps_one() {
        let mut tail = OutputTail::new(0);
        tail.push("a");
        tail.push("b");
        assert_eq!(tail.into_lines(), vec!["b"]);
    }

    #[test]
    fn format_indents_each_line() {
        assert_eq!(format_tail(&["a".into(), "b".into()]), "\n  a\n  b");
        assert_eq!(format_tail(&[]), "");
    }
}
