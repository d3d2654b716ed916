// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runtime seam: the container lifecycle operations the pipeline
//! needs, behind a trait so tests can script a fake.

use crate::error::RuntimeError;
use crate::spec::{AttachedStream, ContainerSpec, ExecSpec, LogOptions};
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Container lifecycle and stream operations.
///
/// Implementations must be safe to share across concurrent jobs; every
/// method takes `&self`.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// True when `image` is available locally.
    async fn image_present(&self, image: &str) -> Result<bool, RuntimeError>;

    /// Pull `image` from its registry.
    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError>;

    /// Create a container, returning its id.
    async fn create_container(
        &self,
        name: &str,
        spec: &ContainerSpec,
    ) -> Result<String, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Hijack the container's stdio. Callers attach before starting the
    /// container so no early output is missed.
    async fn attach_container(
        &self,
        id: &str,
        stdin: bool,
    ) -> Result<AttachedStream, RuntimeError>;

    /// Block until the container exits, returning its exit code.
    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError>;

    /// Force-remove the container. Must be callable after any failure;
    /// an already-gone container counts as removed.
    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Whether the container allocates a TTY. A TTY container's log
    /// stream is unmultiplexed.
    async fn container_uses_tty(&self, id: &str) -> Result<bool, RuntimeError>;

    /// Create an exec instance in a running container, returning its id.
    async fn create_exec(&self, container: &str, spec: &ExecSpec) -> Result<String, RuntimeError>;

    /// Start an exec instance, hijacking its stdio.
    async fn start_exec(&self, exec_id: &str, stdin: bool)
        -> Result<AttachedStream, RuntimeError>;

    /// Exit code of a finished exec instance.
    async fn exec_exit_code(&self, exec_id: &str) -> Result<i64, RuntimeError>;

    /// Open the container's log stream. Multiplexed unless the container
    /// has a TTY.
    async fn container_logs(
        &self,
        id: &str,
        opts: &LogOptions,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, RuntimeError>;
}
