// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors from container runtime operations.

use dockhand_mux::PumpError;
use thiserror::Error;

/// Errors from individual runtime API operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Referenced container, image, or exec instance does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The runtime rejected the operation; `message` carries its
    /// diagnostic text.
    #[error("runtime API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("runtime connection failed: {0}")]
    Connect(String),
    #[error("runtime i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// Errors from driving a helper container or exec channel end to end.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Pump(#[from] PumpError),
}
