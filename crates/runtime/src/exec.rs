// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exec channels: commands run inside an already-running container.
//!
//! Unlike helper containers there is no create/start/remove lifecycle —
//! the container is a long-lived collaborator (typically the database
//! server). The exit code is resolved from exec inspect after the
//! hijacked stream ends.

use crate::error::{RunError, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::spec::ExecSpec;
use crate::stdio::relay_stdio;
use dockhand_mux::DEFAULT_STDERR_CAP;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};

/// Outcome of a completed exec run.
#[derive(Debug)]
pub struct ExecRun {
    pub exit_code: i64,
    pub stdout_bytes: u64,
    pub stderr: String,
}

/// Runs exec instances against running containers.
pub struct ExecChannel {
    runtime: Arc<dyn ContainerRuntime>,
    wait_timeout: Option<Duration>,
    stderr_cap: usize,
}

impl ExecChannel {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime, wait_timeout: None, stderr_cap: DEFAULT_STDERR_CAP }
    }

    dockhand_core::setters! {
        set {
            wait_timeout: Option<Duration>,
            stderr_cap: usize,
        }
    }

    /// Run `spec` inside `container`, streaming its stdout into `sink`.
    pub async fn run<R, W>(
        &self,
        container: &str,
        spec: &ExecSpec,
        stdin_source: Option<R>,
        sink: &mut W,
    ) -> Result<ExecRun, RunError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(%container, command = ?spec.command, "opening exec channel");
        let exec_id = self.runtime.create_exec(container, spec).await?;
        let attached = self.runtime.start_exec(&exec_id, spec.stdin).await?;

        let summary = relay_stdio(attached, stdin_source, sink, self.stderr_cap).await?;

        let exit_code = match self.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, self.runtime.exec_exit_code(&exec_id))
                .await
                .map_err(|_| RuntimeError::Timeout(format!("exec {} exit", exec_id)))??,
            None => self.runtime.exec_exit_code(&exec_id).await?,
        };

        tracing::info!(%container, %exec_id, exit_code, "exec channel finished");
        Ok(ExecRun { exit_code, stdout_bytes: summary.stdout_bytes, stderr: summary.stderr })
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
