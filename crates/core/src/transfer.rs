// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transfer job state machine.

use crate::id::TransferId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// What a transfer job moves, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Database dump streamed out of a running container into a file.
    DbBackup,
    /// SQL file streamed into a restore command inside a running container.
    DbRestore,
    /// Volume contents archived into a tarball file.
    VolBackup,
    /// Tarball extracted into a volume.
    VolRestore,
    /// Directory listing of a path inside a volume.
    VolList,
    /// Single file read out of a volume.
    VolDownload,
    /// Container log tail.
    LogTail,
}

crate::simple_display! {
    TransferKind {
        DbBackup => "db-backup",
        DbRestore => "db-restore",
        VolBackup => "vol-backup",
        VolRestore => "vol-restore",
        VolList => "vol-list",
        VolDownload => "vol-download",
        LogTail => "log-tail",
    }
}

/// Lifecycle status of a transfer job.
///
/// `Pending → Running → {Succeeded | Failed}`; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStatus::Succeeded | TransferStatus::Failed)
    }
}

crate::simple_display! {
    TransferStatus {
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// A transfer job instance.
///
/// Mutated only by the orchestrator that owns it. Once a terminal status
/// is reached the transition methods become no-ops, so a finished job can
/// never be revived or re-failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferJob {
    pub id: TransferId,
    pub kind: TransferKind,
    /// Container or volume the bytes come from (or go to, for restores).
    pub source: String,
    /// Destination ref — a file name for file kinds, empty for in-memory
    /// responses.
    pub destination: String,
    pub status: TransferStatus,
    pub error: Option<String>,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub finished_at_ms: Option<u64>,
}

impl TransferJob {
    pub fn new(kind: TransferKind, source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            id: TransferId::new(),
            kind,
            source: source.into(),
            destination: destination.into(),
            status: TransferStatus::Pending,
            error: None,
            created_at_ms: epoch_ms(),
            started_at_ms: None,
            finished_at_ms: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Transition `Pending → Running`.
    pub fn start(&mut self, epoch_ms: u64) {
        if self.status == TransferStatus::Pending {
            self.status = TransferStatus::Running;
            self.started_at_ms = Some(epoch_ms);
        }
    }

    /// Transition to `Succeeded`. Ignored once terminal.
    pub fn succeed(&mut self, epoch_ms: u64) {
        if !self.is_terminal() {
            self.status = TransferStatus::Succeeded;
            self.finished_at_ms = Some(epoch_ms);
        }
    }

    /// Transition to `Failed`, recording the error. Ignored once terminal.
    pub fn fail(&mut self, error: impl Into<String>, epoch_ms: u64) {
        if !self.is_terminal() {
            self.status = TransferStatus::Failed;
            self.error = Some(error.into());
            self.finished_at_ms = Some(epoch_ms);
        }
    }
}

#[cfg(test)]
#[path = "transfer_tests.rs"]
mod tests;
