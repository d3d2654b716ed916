// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsing for directory listings produced inside helper containers.
//!
//! The helper runs a long-format `ls` against the mounted volume; this
//! module turns that text into structured entries. Pure string handling,
//! no I/O.

use serde::{Deserialize, Serialize};

/// One entry from a volume directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub mod_time: String,
    pub permissions: String,
    /// Path of the entry relative to the volume root, forward slashes on
    /// every host OS.
    pub relative_path: String,
}

/// Parse long-format listing output captured from a helper container.
///
/// The leading `total N` summary line, the synthetic `.`/`..` entries, and
/// malformed lines (fewer than 9 whitespace-separated fields) are skipped.
/// Names keep any internal whitespace. Directories sort before files, then
/// case-sensitive lexicographic by name.
pub fn parse_listing(raw: &str, base_path: &str) -> Vec<VolumeEntry> {
    let mut entries: Vec<VolumeEntry> =
        raw.lines().filter_map(|line| parse_line(line, base_path)).collect();
    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));
    entries
}

fn parse_line(line: &str, base_path: &str) -> Option<VolumeEntry> {
    let line = line.trim_end_matches(['\r', ' ']);
    if line.is_empty() || line.starts_with("total ") {
        return None;
    }

    // Scan the first eight fields positionally so the name (everything
    // after field eight) keeps its internal spaces.
    let mut rest = line;
    let mut fields = [""; 8];
    for field in &mut fields {
        rest = rest.trim_start();
        let end = rest.find(char::is_whitespace)?;
        *field = &rest[..end];
        rest = &rest[end..];
    }
    let name = rest.trim_start();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }

    let permissions = fields[0];
    Some(VolumeEntry {
        name: name.to_string(),
        is_dir: permissions.starts_with('d'),
        size: fields[4].parse().unwrap_or(0),
        mod_time: format!("{} {} {}", fields[5], fields[6], fields[7]),
        permissions: permissions.to_string(),
        relative_path: join_slash(base_path, name),
    })
}

fn join_slash(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    format!("{}/{}", base, name)
}

#[cfg(test)]
#[path = "listing_tests.rs"]
mod tests;
