// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ephemeral helper containers for volume-level file operations.
//!
//! Lifecycle: ensure image → create → attach → start → pump stdin →
//! demux output → wait → remove. Removal is unconditional once the
//! container exists — every exit route reaches it, including failures
//! between create and start.

use crate::error::{RunError, RuntimeError};
use crate::runtime::ContainerRuntime;
use crate::spec::ContainerSpec;
use crate::stdio::relay_stdio;
use dockhand_mux::DEFAULT_STDERR_CAP;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncWrite};

/// Outcome of a completed helper container run.
///
/// A non-zero `exit_code` is not an error here; the caller classifies it
/// with `stderr` attached.
#[derive(Debug)]
pub struct HelperRun {
    pub exit_code: i64,
    pub stdout_bytes: u64,
    pub stderr: String,
}

/// Runs short-lived helper containers with guaranteed removal.
pub struct EphemeralContainerRunner {
    runtime: Arc<dyn ContainerRuntime>,
    wait_timeout: Option<Duration>,
    stderr_cap: usize,
}

impl EphemeralContainerRunner {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime, wait_timeout: None, stderr_cap: DEFAULT_STDERR_CAP }
    }

    dockhand_core::setters! {
        set {
            wait_timeout: Option<Duration>,
            stderr_cap: usize,
        }
    }

    /// Run `spec` to completion, streaming its stdout into `sink`.
    pub async fn run<R, W>(
        &self,
        name: &str,
        spec: &ContainerSpec,
        stdin_source: Option<R>,
        sink: &mut W,
    ) -> Result<HelperRun, RunError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Unpin,
    {
        if !self.runtime.image_present(&spec.image).await? {
            tracing::info!(image = %spec.image, "helper image absent, pulling");
            self.runtime.pull_image(&spec.image).await?;
        }

        let id = self.runtime.create_container(name, spec).await?;
        let started = Instant::now();
        let result = self.drive(&id, spec, stdin_source, sink).await;

        let removal = self.runtime.remove_container(&id).await;
        if let Err(e) = &removal {
            tracing::warn!(%id, error = %e, "helper container removal failed");
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(run) => {
                removal?;
                tracing::info!(%id, elapsed_ms, exit_code = run.exit_code, "helper finished");
                Ok(run)
            }
            Err(e) => {
                tracing::error!(%id, elapsed_ms, error = %e, "helper failed");
                Err(e)
            }
        }
    }

    async fn drive<R, W>(
        &self,
        id: &str,
        spec: &ContainerSpec,
        stdin_source: Option<R>,
        sink: &mut W,
    ) -> Result<HelperRun, RunError>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Unpin,
    {
        // Attach before start so no early output is missed.
        let attached = self.runtime.attach_container(id, spec.stdin).await?;
        self.runtime.start_container(id).await?;

        let summary = relay_stdio(attached, stdin_source, sink, self.stderr_cap).await?;

        let exit_code = match self.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, self.runtime.wait_container(id))
                .await
                .map_err(|_| RuntimeError::Timeout(format!("container {} exit", id)))??,
            None => self.runtime.wait_container(id).await?,
        };

        Ok(HelperRun { exit_code, stdout_bytes: summary.stdout_bytes, stderr: summary.stderr })
    }
}

#[cfg(test)]
#[path = "helper_tests.rs"]
mod tests;
