// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path-based addressing: `<prefix>/<workspace id>/<rest>`.

use crate::directory::Directory;

#[derive(Debug, Clone)]
pub struct PathMatcher {
    prefix: String,
}

/// A workspace found in the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub workspace_id: String,
    /// Path left after removing the prefix and the id; always starts with `/`.
    pub rest: String,
}

impl PathMatcher {
    pub fn new(prefix: &str) -> Self {
        let trimmed = prefix.trim_matches('/');
        let prefix = if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") };
        Self { prefix }
    }

    /// Splits off the candidate id; accepts it only if the directory knows it.
    pub fn match_path(&self, path: &str, directory: &Directory) -> Option<PathMatch> {
        let after_prefix = path.strip_prefix(self.prefix.as_str())?;
        let after_prefix = after_prefix.strip_prefix('/')?;
        let (candidate, rest) = match after_prefix.find('/') {
            Some(i) => (&after_prefix[..i], &after_prefix[i..]),
            None => (after_prefix, "/"),
        };
        if candidate.is_empty() || directory.lookup(candidate).is_none() {
            return None;
        }
        Some(PathMatch { workspace_id: candidate.to_string(), rest: rest.to_string() })
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
