// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transfer façade.
//!
//! One orchestrator serves many concurrent jobs. Each job validates its
//! request, runs the right lower-level machinery, and resolves to exactly
//! one terminal state. File destinations are written to a `.partial`
//! path, fsynced, and renamed into place only on success — a failed job
//! never leaves a half-written file masquerading as a backup.

use crate::config::PipelineConfig;
use crate::error::TransferError;
use crate::request::{TransferRequest, TransferResponse};
use dockhand_core::{confine, epoch_ms, parse_listing, TransferId, TransferJob};
use dockhand_mux::{copy_stream, demux_merged};
use dockhand_runtime::{
    BindMount, ContainerRuntime, ContainerSpec, EphemeralContainerRunner, ExecChannel, ExecSpec,
    LogOptions,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;

/// A finished job plus its response payload (or classified error).
#[derive(Debug)]
pub struct TransferOutcome {
    pub job: TransferJob,
    pub result: Result<TransferResponse, TransferError>,
}

/// Accepts transfer requests and drives them to a terminal result.
pub struct TransferOrchestrator {
    runtime: Arc<dyn ContainerRuntime>,
    config: PipelineConfig,
    /// Advisory map of in-flight jobs for status reporting. Each entry
    /// is removed exactly once, after its job reaches a terminal state.
    jobs: Mutex<HashMap<TransferId, TransferJob>>,
}

impl TransferOrchestrator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: PipelineConfig) -> Self {
        Self { runtime, config, jobs: Mutex::new(HashMap::new()) }
    }

    /// Snapshot of in-flight jobs.
    pub fn active_jobs(&self) -> Vec<TransferJob> {
        self.jobs.lock().values().cloned().collect()
    }

    /// Run a request to completion.
    pub async fn run(&self, request: TransferRequest) -> TransferOutcome {
        let mut job =
            TransferJob::new(request.kind(), request.source_ref(), request.destination_ref());
        tracing::info!(job = %job.id, kind = %job.kind, source = %job.source, "transfer accepted");

        // Rejected requests never start: no runtime call, no map entry.
        if let Err(e) = validate(&request) {
            tracing::warn!(job = %job.id, error = %e, "transfer rejected");
            job.fail(e.to_string(), epoch_ms());
            return TransferOutcome { job, result: Err(e) };
        }

        job.start(epoch_ms());
        self.jobs.lock().insert(job.id.clone(), job.clone());

        let result = self.execute(&request, &job).await;

        match &result {
            Ok(_) => {
                job.succeed(epoch_ms());
                tracing::info!(job = %job.id, kind = %job.kind, "transfer succeeded");
            }
            Err(e) => {
                job.fail(e.to_string(), epoch_ms());
                tracing::error!(job = %job.id, kind = %job.kind, error = %e, "transfer failed");
            }
        }

        self.jobs.lock().remove(&job.id);
        TransferOutcome { job, result }
    }

    async fn execute(
        &self,
        request: &TransferRequest,
        job: &TransferJob,
    ) -> Result<TransferResponse, TransferError> {
        let helper_name = format!("dockhand-{}", job.id.suffix());
        match request {
            TransferRequest::DbBackup { container, command, destination } => {
                self.db_backup(container, command, destination).await
            }
            TransferRequest::DbRestore { container, command, source } => {
                self.db_restore(container, command, source).await
            }
            TransferRequest::VolBackup { volume, destination } => {
                self.vol_backup(volume, destination, &helper_name).await
            }
            TransferRequest::VolRestore { volume, source } => {
                self.vol_restore(volume, source, &helper_name).await
            }
            TransferRequest::VolList { volume, path } => {
                self.vol_list(volume, path, &helper_name).await
            }
            TransferRequest::VolDownload { volume, path } => {
                self.vol_download(volume, path, &helper_name).await
            }
            TransferRequest::LogTail { container, tail, timestamps } => {
                self.log_tail(container, *tail, *timestamps).await
            }
        }
    }

    fn exec_channel(&self) -> ExecChannel {
        ExecChannel::new(self.runtime.clone())
            .wait_timeout(self.config.wait_timeout)
            .stderr_cap(self.config.stderr_cap)
    }

    fn helper_runner(&self) -> EphemeralContainerRunner {
        EphemeralContainerRunner::new(self.runtime.clone())
            .wait_timeout(self.config.wait_timeout)
            .stderr_cap(self.config.stderr_cap)
    }

    /// Resolve a user-supplied file name beneath the backup directory.
    fn backup_file(&self, name: &str) -> Result<(PathBuf, String), TransferError> {
        let root = self.config.backup_dir.to_string_lossy();
        let confined = confine(&root, name)?;
        if confined.relative == "/" {
            return Err(TransferError::InvalidRequest(
                "file name resolves to the backup root".to_string(),
            ));
        }
        let filename = confined.relative.rsplit('/').next().unwrap_or_default().to_string();
        Ok((PathBuf::from(confined.absolute), filename))
    }

    async fn db_backup(
        &self,
        container: &str,
        command: &[String],
        destination: &str,
    ) -> Result<TransferResponse, TransferError> {
        let (path, filename) = self.backup_file(destination)?;
        let partial = partial_path(&path);
        let mut file = create_partial(&path, &partial).await?;

        let spec = ExecSpec::new(command.to_vec());
        let outcome = self
            .exec_channel()
            .run(container, &spec, no_stdin(), &mut file)
            .await
            .map(|run| (run.exit_code, run.stdout_bytes, run.stderr))
            .map_err(TransferError::from);

        let size_bytes = finish_backup_file(file, &partial, &path, outcome).await?;
        Ok(TransferResponse::File { path, filename, size_bytes })
    }

    async fn db_restore(
        &self,
        container: &str,
        command: &[String],
        source: &str,
    ) -> Result<TransferResponse, TransferError> {
        let (path, filename) = self.backup_file(source)?;
        let file = open_backup(&path, &filename).await?;
        let size_bytes = file.metadata().await?.len();

        let spec = ExecSpec::new(command.to_vec()).stdin(true);
        let mut discard = tokio::io::sink();
        let run = self.exec_channel().run(container, &spec, Some(file), &mut discard).await?;
        if run.exit_code != 0 {
            return Err(TransferError::ProcessExit { exit_code: run.exit_code, stderr: run.stderr });
        }
        Ok(TransferResponse::File { path, filename, size_bytes })
    }

    async fn vol_backup(
        &self,
        volume: &str,
        destination: &str,
        helper_name: &str,
    ) -> Result<TransferResponse, TransferError> {
        let (path, filename) = self.backup_file(destination)?;
        let partial = partial_path(&path);
        let mut file = create_partial(&path, &partial).await?;

        let mount = self.config.volume_mount.clone();
        let spec = ContainerSpec::new(
            self.config.helper_image.clone(),
            vec!["tar".into(), "-cf".into(), "-".into(), "-C".into(), mount.clone(), ".".into()],
        )
        .binds(vec![BindMount::new(volume, mount, true)]);

        let outcome = self
            .helper_runner()
            .run(helper_name, &spec, no_stdin(), &mut file)
            .await
            .map(|run| (run.exit_code, run.stdout_bytes, run.stderr))
            .map_err(TransferError::from);

        let size_bytes = finish_backup_file(file, &partial, &path, outcome).await?;
        Ok(TransferResponse::File { path, filename, size_bytes })
    }

    async fn vol_restore(
        &self,
        volume: &str,
        source: &str,
        helper_name: &str,
    ) -> Result<TransferResponse, TransferError> {
        let (path, filename) = self.backup_file(source)?;
        let file = open_backup(&path, &filename).await?;
        let size_bytes = file.metadata().await?.len();

        let mount = self.config.volume_mount.clone();
        let spec = ContainerSpec::new(
            self.config.helper_image.clone(),
            vec!["tar".into(), "-xf".into(), "-".into(), "-C".into(), mount.clone()],
        )
        .binds(vec![BindMount::new(volume, mount, false)])
        .stdin(true);

        let mut discard = tokio::io::sink();
        let run = self.helper_runner().run(helper_name, &spec, Some(file), &mut discard).await?;
        if run.exit_code != 0 {
            return Err(TransferError::ProcessExit { exit_code: run.exit_code, stderr: run.stderr });
        }
        Ok(TransferResponse::File { path, filename, size_bytes })
    }

    async fn vol_list(
        &self,
        volume: &str,
        path: &str,
        helper_name: &str,
    ) -> Result<TransferResponse, TransferError> {
        let confined = confine(&self.config.volume_mount, path)?;
        let spec = ContainerSpec::new(
            self.config.helper_image.clone(),
            vec!["ls".into(), "-la".into(), confined.absolute.clone()],
        )
        .binds(vec![BindMount::new(volume, self.config.volume_mount.clone(), true)]);

        let mut buf: Vec<u8> = Vec::new();
        let run = self.helper_runner().run(helper_name, &spec, no_stdin(), &mut buf).await?;
        if run.exit_code != 0 {
            return Err(classify_helper_exit(run.exit_code, run.stderr, &confined.relative));
        }

        let text = String::from_utf8_lossy(&buf);
        let entries = parse_listing(&text, &confined.relative);
        Ok(TransferResponse::Listing { entries, current_path: confined.relative })
    }

    async fn vol_download(
        &self,
        volume: &str,
        path: &str,
        helper_name: &str,
    ) -> Result<TransferResponse, TransferError> {
        let confined = confine(&self.config.volume_mount, path)?;
        if confined.relative == "/" {
            return Err(TransferError::InvalidRequest(
                "download path must name a file".to_string(),
            ));
        }
        let spec = ContainerSpec::new(
            self.config.helper_image.clone(),
            vec!["cat".into(), confined.absolute.clone()],
        )
        .binds(vec![BindMount::new(volume, self.config.volume_mount.clone(), true)]);

        let mut bytes: Vec<u8> = Vec::new();
        let run = self.helper_runner().run(helper_name, &spec, no_stdin(), &mut bytes).await?;
        if run.exit_code != 0 {
            return Err(classify_helper_exit(run.exit_code, run.stderr, &confined.relative));
        }

        let filename = confined.relative.rsplit('/').next().unwrap_or_default().to_string();
        Ok(TransferResponse::Bytes {
            bytes,
            content_type: "application/octet-stream",
            filename,
        })
    }

    async fn log_tail(
        &self,
        container: &str,
        tail: Option<u32>,
        timestamps: bool,
    ) -> Result<TransferResponse, TransferError> {
        // TTY containers emit an unmultiplexed log stream; strip frame
        // headers only when the runtime actually multiplexes.
        let uses_tty = self.runtime.container_uses_tty(container).await?;
        let reader =
            self.runtime.container_logs(container, &LogOptions { tail, timestamps }).await?;

        let mut bytes: Vec<u8> = Vec::new();
        if uses_tty {
            copy_stream(reader, &mut bytes).await?;
        } else {
            demux_merged(reader, &mut bytes).await?;
        }

        Ok(TransferResponse::Bytes {
            bytes,
            content_type: "text/plain; charset=utf-8",
            filename: format!("{}-logs.txt", container),
        })
    }
}

fn no_stdin() -> Option<tokio::io::Empty> {
    None
}

fn validate(request: &TransferRequest) -> Result<(), TransferError> {
    if request.source_ref().trim().is_empty() {
        return Err(TransferError::InvalidRequest(
            "container or volume ref must not be empty".to_string(),
        ));
    }
    match request {
        TransferRequest::DbBackup { command, destination, .. } => {
            require(!command.is_empty(), "dump command must not be empty")?;
            require(!destination.trim().is_empty(), "destination file name must not be empty")?;
        }
        TransferRequest::DbRestore { command, source, .. } => {
            require(!command.is_empty(), "restore command must not be empty")?;
            require(!source.trim().is_empty(), "source file name must not be empty")?;
        }
        TransferRequest::VolBackup { destination, .. } => {
            require(!destination.trim().is_empty(), "destination file name must not be empty")?;
        }
        TransferRequest::VolRestore { source, .. } => {
            require(!source.trim().is_empty(), "source file name must not be empty")?;
        }
        TransferRequest::VolDownload { path, .. } => {
            require(!path.trim().is_empty(), "download path must not be empty")?;
        }
        TransferRequest::VolList { .. } | TransferRequest::LogTail { .. } => {}
    }
    Ok(())
}

fn require(condition: bool, message: &str) -> Result<(), TransferError> {
    if condition {
        Ok(())
    } else {
        Err(TransferError::InvalidRequest(message.to_string()))
    }
}

fn classify_helper_exit(exit_code: i64, stderr: String, what: &str) -> TransferError {
    // `ls`/`cat` against a missing path is a not-found result, not a
    // generic process failure.
    if stderr.contains("No such file or directory") {
        TransferError::NotFound(what.to_string())
    } else {
        TransferError::ProcessExit { exit_code, stderr }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

async fn create_partial(path: &Path, partial: &Path) -> Result<File, TransferError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(File::create(partial).await?)
}

async fn open_backup(path: &Path, filename: &str) -> Result<File, TransferError> {
    File::open(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TransferError::NotFound(format!("backup file {}", filename))
        } else {
            TransferError::Io(e)
        }
    })
}

/// Seal or discard a `.partial` backup file.
///
/// `outcome` carries `(exit_code, stdout_bytes, stderr)` from the
/// producing run. Only a zero exit with no transfer error gets fsynced
/// and renamed into place; every other route deletes the partial file.
async fn finish_backup_file(
    file: File,
    partial: &Path,
    path: &Path,
    outcome: Result<(i64, u64, String), TransferError>,
) -> Result<u64, TransferError> {
    let sealed: Result<u64, TransferError> = match outcome {
        Ok((0, bytes, _)) => file.sync_all().await.map(|()| bytes).map_err(TransferError::from),
        Ok((exit_code, _, stderr)) => Err(TransferError::ProcessExit { exit_code, stderr }),
        Err(e) => Err(e),
    };
    drop(file);

    match sealed {
        Ok(bytes) => match tokio::fs::rename(partial, path).await {
            Ok(()) => Ok(bytes),
            Err(e) => {
                discard_partial(partial).await;
                Err(e.into())
            }
        },
        Err(e) => {
            discard_partial(partial).await;
            Err(e)
        }
    }
}

async fn discard_partial(partial: &Path) {
    if let Err(e) = tokio::fs::remove_file(partial).await {
        tracing::warn!(path = %partial.display(), error = %e, "failed to remove partial file");
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
