// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container and exec specifications passed to a runtime.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

/// A host path or named volume mounted into a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindMount {
    /// Host path or named volume.
    pub source: String,
    /// Mount point inside the container.
    pub target: String,
    pub read_only: bool,
}

impl BindMount {
    pub fn new(source: impl Into<String>, target: impl Into<String>, read_only: bool) -> Self {
        Self { source: source.into(), target: target.into(), read_only }
    }

    /// Render in the runtime's `Binds` syntax (`source:target[:ro]`).
    pub fn to_bind(&self) -> String {
        if self.read_only {
            format!("{}:{}:ro", self.source, self.target)
        } else {
            format!("{}:{}", self.source, self.target)
        }
    }
}

/// Specification for a short-lived helper container.
#[derive(Debug, Clone)]
pub struct ContainerSpec {
    pub image: String,
    pub command: Vec<String>,
    pub binds: Vec<BindMount>,
    /// Attach and keep stdin open; the caller pumps it and closes it to
    /// signal EOF.
    pub stdin: bool,
}

impl ContainerSpec {
    pub fn new(image: impl Into<String>, command: Vec<String>) -> Self {
        Self { image: image.into(), command, binds: Vec::new(), stdin: false }
    }

    dockhand_core::setters! {
        set {
            binds: Vec<BindMount>,
            stdin: bool,
        }
    }
}

/// Specification for a command run inside an already-running container.
#[derive(Debug, Clone)]
pub struct ExecSpec {
    pub command: Vec<String>,
    pub stdin: bool,
}

impl ExecSpec {
    pub fn new(command: Vec<String>) -> Self {
        Self { command, stdin: false }
    }

    dockhand_core::setters! {
        set {
            stdin: bool,
        }
    }
}

/// Options for a container log stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogOptions {
    /// Last N lines; all lines when `None`.
    pub tail: Option<u32>,
    pub timestamps: bool,
}

/// A hijacked attach stream.
///
/// The write half feeds the process's stdin (present only when stdin was
/// requested); the read half carries its multiplexed output.
pub struct AttachedStream {
    pub stdin: Option<Box<dyn AsyncWrite + Send + Unpin>>,
    pub output: Box<dyn AsyncRead + Send + Unpin>,
}

impl std::fmt::Debug for AttachedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedStream")
            .field("stdin", &self.stdin.as_ref().map(|_| "..."))
            .field("output", &"...")
            .finish()
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
