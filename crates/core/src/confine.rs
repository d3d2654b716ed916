// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Path confinement for user-supplied volume paths.
//!
//! Helper containers mount a volume at a fixed point and every
//! user-supplied path is joined beneath it. Normalization is purely
//! textual — no filesystem access — and runs before any container or
//! file operation.

use thiserror::Error;

/// A requested path resolved outside its permitted root.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("path {requested:?} escapes root {root:?}")]
pub struct PathEscapeError {
    pub root: String,
    pub requested: String,
}

/// A normalized path confined beneath a root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath {
    /// Normalized path relative to the root; always starts with `/`.
    pub relative: String,
    /// The root joined with `relative`.
    pub absolute: String,
}

/// Normalize `requested` against `root`, resolving `.` and `..`
/// components textually.
///
/// Forward slashes separate components regardless of host OS. Any
/// traversal that would climb above the root is rejected.
pub fn confine(root: &str, requested: &str) -> Result<ConfinedPath, PathEscapeError> {
    let mut stack: Vec<&str> = Vec::new();
    for component in requested.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if stack.pop().is_none() {
                    return Err(PathEscapeError {
                        root: root.to_string(),
                        requested: requested.to_string(),
                    });
                }
            }
            other => stack.push(other),
        }
    }

    let root = root.trim_end_matches('/');
    let relative =
        if stack.is_empty() { "/".to_string() } else { format!("/{}", stack.join("/")) };
    let absolute = if relative == "/" {
        if root.is_empty() { "/".to_string() } else { root.to_string() }
    } else {
        format!("{}{}", root, relative)
    };
    Ok(ConfinedPath { relative, absolute })
}

#[cfg(test)]
#[path = "confine_tests.rs"]
mod tests;
