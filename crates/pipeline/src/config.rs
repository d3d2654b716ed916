// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline configuration.
//!
//! Everything the orchestrator needs arrives through this struct —
//! socket path, helper image, mount point, backup directory — rather
//! than process-wide constants, so path confinement is testable without
//! touching global state.

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
const DEFAULT_HELPER_IMAGE: &str = "busybox:stable";
const DEFAULT_VOLUME_MOUNT: &str = "/mnt/volume";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Container engine Unix socket.
    pub socket_path: PathBuf,
    /// Image used for helper containers (needs `tar`, `ls`, `cat`).
    pub helper_image: String,
    /// Mount point for volumes inside helper containers.
    pub volume_mount: String,
    /// Directory that receives and serves backup artifacts. All
    /// user-supplied file names are confined beneath it.
    pub backup_dir: PathBuf,
    /// Bound on container-wait / exec completion. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Cap on captured stderr diagnostics per job.
    pub stderr_cap: usize,
}

impl PipelineConfig {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET),
            helper_image: DEFAULT_HELPER_IMAGE.to_string(),
            volume_mount: DEFAULT_VOLUME_MOUNT.to_string(),
            backup_dir: backup_dir.into(),
            wait_timeout: None,
            stderr_cap: dockhand_mux::DEFAULT_STDERR_CAP,
        }
    }

    dockhand_core::setters! {
        into {
            socket_path: PathBuf,
            helper_image: String,
            volume_mount: String,
        }
        set {
            wait_timeout: Option<Duration>,
            stderr_cap: usize,
        }
    }
}
