// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ignore rules for the source tree
//!
//! Follows `.gitignore` semantics for the common cases: `#` comments, `!`
//! negation, trailing `/` for directories, patterns containing `/` anchored
//! at the root, `**` across directories. A path inside an ignored directory
//! stays ignored even if a later rule re-includes it.

use crate::error::SyncError;
use glob::{MatchOptions, Pattern};
use std::path::Path;

pub const GITIGNORE: &str = ".gitignore";
pub const DEVLOOPIGNORE: &str = ".devloopignore";

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    negated: bool,
    dir_only: bool,
    anchored: bool,
}

impl Rule {
    fn parse(line: &str) -> Option<Rule> {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line.strip_prefix('\\').unwrap_or(line)),
        };
        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest),
            None => (false, body),
        };
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }
        match Pattern::new(body) {
            Ok(pattern) => Some(Rule { pattern, negated, dir_only, anchored }),
            Err(e) => {
                tracing::debug!(pattern = body, error = %e, "skipping invalid ignore pattern");
                None
            }
        }
    }

    fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.anchored {
            self.pattern.matches_with(rel, MATCH_OPTIONS)
        } else {
            let name = rel.rsplit('/').next().unwrap_or(rel);
            self.pattern.matches_with(name, MATCH_OPTIONS)
        }
    }
}

/// Compiled ignore rules for one project root.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    /// Always excluded; cannot be negated.
    fixed: Vec<Rule>,
    rules: Vec<Rule>,
}

impl IgnoreRules {
    /// Rules that always apply: the metadata directory, `.git`, and the devfile.
    pub fn fixed(devfile_name: Option<&str>) -> Self {
        let mut lines = vec![format!("/{}", dl_core::METADATA_DIR), ".git".to_string()];
        if let Some(name) = devfile_name {
            lines.push(format!("/{name}"));
        }
        Self { fixed: lines.iter().filter_map(|l| Rule::parse(l)).collect(), rules: Vec::new() }
    }

    /// Fixed rules plus `.gitignore` and `.devloopignore` at `root`, when present.
    pub fn load(root: &Path, devfile_name: Option<&str>) -> Result<Self, SyncError> {
        let mut rules = Self::fixed(devfile_name);
        for name in [GITIGNORE, DEVLOOPIGNORE] {
            let path = root.join(name);
            match std::fs::read_to_string(&path) {
                Ok(content) => rules.add_lines(&content),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(SyncError::io(path, e)),
            }
        }
        tracing::debug!(rules = rules.rules.len(), "loaded ignore rules");
        Ok(rules)
    }

    pub fn add_lines(&mut self, content: &str) {
        self.rules.extend(content.lines().filter_map(Rule::parse));
    }

    /// Whether `rel` (slash-separated, relative to the root) is excluded from sync.
    pub fn is_ignored(&self, rel: &str, is_dir: bool) -> bool {
        let rel = rel.trim_matches('/');
        if rel.is_empty() {
            return false;
        }
        let ancestor_ignored = rel
            .match_indices('/')
            .any(|(idx, _)| self.decide(&rel[..idx], true));
        ancestor_ignored || self.decide(rel, is_dir)
    }

    fn decide(&self, rel: &str, is_dir: bool) -> bool {
        if self.fixed.iter().any(|rule| rule.matches(rel, is_dir)) {
            return true;
        }
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(rel, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }
}

#[cfg(test)]
#[path = "ignore_tests.rs"]
mod tests;
