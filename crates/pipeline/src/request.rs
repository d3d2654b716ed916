// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Requests accepted by, and responses produced by, the orchestrator.

use dockhand_core::{TransferKind, VolumeEntry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A transfer request from an external caller (the dashboard's API
/// layer). File names are relative and confined to the configured
/// backup directory; volume paths are confined to the volume mount.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransferRequest {
    /// Run a dump command in a running container, streaming its stdout
    /// into a backup file.
    DbBackup { container: String, command: Vec<String>, destination: String },
    /// Stream a backup file into a restore command's stdin.
    DbRestore { container: String, command: Vec<String>, source: String },
    /// Archive a volume's contents into a tarball file.
    VolBackup { volume: String, destination: String },
    /// Extract a tarball file into a volume.
    VolRestore { volume: String, source: String },
    /// List a directory inside a volume.
    VolList { volume: String, path: String },
    /// Read one file out of a volume.
    VolDownload { volume: String, path: String },
    /// Tail a container's logs.
    LogTail {
        container: String,
        #[serde(default)]
        tail: Option<u32>,
        #[serde(default)]
        timestamps: bool,
    },
}

impl TransferRequest {
    pub fn kind(&self) -> TransferKind {
        match self {
            TransferRequest::DbBackup { .. } => TransferKind::DbBackup,
            TransferRequest::DbRestore { .. } => TransferKind::DbRestore,
            TransferRequest::VolBackup { .. } => TransferKind::VolBackup,
            TransferRequest::VolRestore { .. } => TransferKind::VolRestore,
            TransferRequest::VolList { .. } => TransferKind::VolList,
            TransferRequest::VolDownload { .. } => TransferKind::VolDownload,
            TransferRequest::LogTail { .. } => TransferKind::LogTail,
        }
    }

    /// Container or volume the job reads from or writes to.
    pub(crate) fn source_ref(&self) -> &str {
        match self {
            TransferRequest::DbBackup { container, .. }
            | TransferRequest::DbRestore { container, .. }
            | TransferRequest::LogTail { container, .. } => container,
            TransferRequest::VolBackup { volume, .. }
            | TransferRequest::VolRestore { volume, .. }
            | TransferRequest::VolList { volume, .. }
            | TransferRequest::VolDownload { volume, .. } => volume,
        }
    }

    /// Destination label recorded on the job (file name or volume path).
    pub(crate) fn destination_ref(&self) -> &str {
        match self {
            TransferRequest::DbBackup { destination, .. }
            | TransferRequest::VolBackup { destination, .. } => destination,
            TransferRequest::DbRestore { source, .. }
            | TransferRequest::VolRestore { source, .. } => source,
            TransferRequest::VolList { path, .. }
            | TransferRequest::VolDownload { path, .. } => path,
            TransferRequest::LogTail { .. } => "",
        }
    }
}

/// Result payload returned to the caller on success.
#[derive(Debug)]
pub enum TransferResponse {
    /// In-memory bytes suitable for an HTTP attachment response.
    Bytes { bytes: Vec<u8>, content_type: &'static str, filename: String },
    /// Structured directory listing plus the normalized requested path.
    Listing { entries: Vec<VolumeEntry>, current_path: String },
    /// A file fully and durably written (or consumed) on disk.
    File { path: PathBuf, filename: String, size_bytes: u64 },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
