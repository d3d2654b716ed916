// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job-level error classification surfaced to external callers.
//!
//! Every failure is terminal for its job; nothing here is retried.
//! Callers that want a retry re-submit the request themselves.

use dockhand_core::PathEscapeError;
use dockhand_mux::{DecodeError, PumpError};
use dockhand_runtime::{RunError, RuntimeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classified error kind for callers that render failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Protocol,
    NotFound,
    PathEscape,
    Runtime,
    Io,
    ProcessExit,
    InvalidRequest,
}

dockhand_core::simple_display! {
    ErrorKind {
        Protocol => "protocol",
        NotFound => "not-found",
        PathEscape => "path-escape",
        Runtime => "runtime",
        Io => "io",
        ProcessExit => "process-exit",
        InvalidRequest => "invalid-request",
    }
}

/// A transfer job's terminal error.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Malformed or truncated multiplexing frame.
    #[error("protocol decode failed: {0}")]
    Protocol(#[from] DecodeError),
    /// Referenced container, volume, or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    PathEscape(#[from] PathEscapeError),
    /// Image pull, container or exec lifecycle call failed; carries the
    /// runtime's diagnostic text.
    #[error("runtime operation failed: {0}")]
    Runtime(String),
    /// Local file or stream I/O failure.
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// The contained command exited non-zero; captured stderr attached.
    #[error("command exited with code {exit_code}: {stderr}")]
    ProcessExit { exit_code: i64, stderr: String },
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::Protocol(_) => ErrorKind::Protocol,
            TransferError::NotFound(_) => ErrorKind::NotFound,
            TransferError::PathEscape(_) => ErrorKind::PathEscape,
            TransferError::Runtime(_) => ErrorKind::Runtime,
            TransferError::Io(_) => ErrorKind::Io,
            TransferError::ProcessExit { .. } => ErrorKind::ProcessExit,
            TransferError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

impl From<RuntimeError> for TransferError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::NotFound(message) => TransferError::NotFound(message),
            RuntimeError::Io(io) => TransferError::Io(io),
            other => TransferError::Runtime(other.to_string()),
        }
    }
}

impl From<PumpError> for TransferError {
    fn from(e: PumpError) -> Self {
        match e {
            PumpError::Decode(decode) => TransferError::Protocol(decode),
            PumpError::Read(io) | PumpError::Write(io) => TransferError::Io(io),
        }
    }
}

impl From<RunError> for TransferError {
    fn from(e: RunError) -> Self {
        match e {
            RunError::Runtime(runtime) => runtime.into(),
            RunError::Pump(pump) => pump.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
