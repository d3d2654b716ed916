// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end orchestrator tests against the scripted fake runtime.

use super::*;
use crate::error::ErrorKind;
use dockhand_core::{TransferKind, TransferStatus};
use dockhand_mux::{encode_frame, StreamChannel};
use dockhand_runtime::{FailPoint, FakeRuntime, RuntimeCall};

fn orchestrator(fake: &FakeRuntime, backup_dir: &std::path::Path) -> TransferOrchestrator {
    TransferOrchestrator::new(Arc::new(fake.clone()), PipelineConfig::new(backup_dir))
}

#[tokio::test]
async fn db_backup_writes_exact_stdout_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new().with_frames(&[
        (StreamChannel::Stdout, b"-- dump part 1\n"),
        (StreamChannel::Stderr, b"pg_dump: reading tables\n"),
        (StreamChannel::Stdout, b"-- dump part 2\n"),
    ]);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::DbBackup {
            container: "pg-main".into(),
            command: vec!["pg_dump".into(), "-U".into(), "app".into()],
            destination: "app.sql".into(),
        })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Succeeded);
    assert!(outcome.job.started_at_ms.is_some());
    assert!(outcome.job.finished_at_ms.is_some());

    match outcome.result.unwrap() {
        TransferResponse::File { path, filename, size_bytes } => {
            assert_eq!(filename, "app.sql");
            assert_eq!(size_bytes, 30);
            let written = std::fs::read(path).unwrap();
            assert_eq!(written, b"-- dump part 1\n-- dump part 2\n");
        }
        other => panic!("unexpected: {:?}", other),
    }

    // Terminal jobs leave the advisory map.
    assert!(orch.active_jobs().is_empty());
}

#[tokio::test]
async fn db_backup_process_failure_leaves_no_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new()
        .with_frames(&[(StreamChannel::Stderr, b"pg_dump: connection refused\n")])
        .with_exit_code(1);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::DbBackup {
            container: "pg-main".into(),
            command: vec!["pg_dump".into()],
            destination: "app.sql".into(),
        })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Failed);
    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ProcessExit);
    assert!(err.to_string().contains("connection refused"));

    // Neither the destination nor a partial file survives.
    assert!(!dir.path().join("app.sql").exists());
    assert!(!dir.path().join("app.sql.partial").exists());
}

#[tokio::test]
async fn db_backup_broken_stream_cleans_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = encode_frame(StreamChannel::Stdout, b"start of dump");
    bytes.extend_from_slice(&encode_frame(StreamChannel::Stdout, b"never finishes")[..11]);
    let fake = FakeRuntime::new().with_output(bytes);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::DbBackup {
            container: "pg-main".into(),
            command: vec!["pg_dump".into()],
            destination: "app.sql".into(),
        })
        .await;

    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::Protocol);
    assert!(!dir.path().join("app.sql").exists());
    assert!(!dir.path().join("app.sql.partial").exists());
}

#[tokio::test]
async fn db_restore_streams_file_into_stdin_and_closes_it() {
    let dir = tempfile::tempdir().unwrap();
    let sql = b"CREATE TABLE t (id int);\n".to_vec();
    std::fs::write(dir.path().join("app.sql"), &sql).unwrap();

    let fake = FakeRuntime::new();
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::DbRestore {
            container: "pg-main".into(),
            command: vec!["psql".into(), "-U".into(), "app".into()],
            source: "app.sql".into(),
        })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Succeeded);
    assert_eq!(fake.stdin_bytes(), sql);
    assert!(fake.stdin_closed(), "restore stdin must be closed for EOF");
}

#[tokio::test]
async fn db_restore_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new();
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::DbRestore {
            container: "pg-main".into(),
            command: vec!["psql".into()],
            source: "missing.sql".into(),
        })
        .await;

    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::NotFound);
    // The job failed before any exec was created.
    assert!(!fake.calls().iter().any(|c| matches!(c, RuntimeCall::ExecCreated(_))));
}

#[tokio::test]
async fn vol_backup_mounts_read_only_and_archives() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new().with_frames(&[(StreamChannel::Stdout, b"TARBYTES")]);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolBackup { volume: "data".into(), destination: "data.tar".into() })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Succeeded);
    assert_eq!(std::fs::read(dir.path().join("data.tar")).unwrap(), b"TARBYTES");

    let (_, spec) = fake.created_specs().pop().unwrap();
    assert_eq!(spec.binds[0].to_bind(), "data:/mnt/volume:ro");
    assert!(!spec.stdin);
    assert!(fake.leaked_containers().is_empty());
}

#[tokio::test]
async fn vol_restore_mounts_read_write_and_pumps_tarball() {
    let dir = tempfile::tempdir().unwrap();
    let tar = b"fake-tarball".to_vec();
    std::fs::write(dir.path().join("data.tar"), &tar).unwrap();

    let fake = FakeRuntime::new();
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolRestore { volume: "data".into(), source: "data.tar".into() })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Succeeded);
    assert_eq!(fake.stdin_bytes(), tar);
    assert!(fake.stdin_closed());

    let (_, spec) = fake.created_specs().pop().unwrap();
    assert_eq!(spec.binds[0].to_bind(), "data:/mnt/volume");
    assert!(spec.stdin);
}

#[tokio::test]
async fn vol_list_parses_helper_output() {
    let dir = tempfile::tempdir().unwrap();
    let listing = "total 8\n\
        drwxr-xr-x 2 root root 4096 Feb 25 12:00 .\n\
        drwxr-xr-x 2 root root 4096 Feb 25 12:00 ..\n\
        -rw-r--r-- 1 root root  123 Feb 25 12:00 notes.txt\n\
        drwxr-xr-x 2 root root 4096 Feb 25 12:00 sub dir\n";
    let fake =
        FakeRuntime::new().with_frames(&[(StreamChannel::Stdout, listing.as_bytes())]);
    let orch = orchestrator(&fake, dir.path());

    let outcome =
        orch.run(TransferRequest::VolList { volume: "data".into(), path: String::new() }).await;

    match outcome.result.unwrap() {
        TransferResponse::Listing { entries, current_path } => {
            assert_eq!(current_path, "/");
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].name, "sub dir");
            assert!(entries[0].is_dir);
            assert_eq!(entries[1].name, "notes.txt");
            assert_eq!(entries[1].size, 123);
        }
        other => panic!("unexpected: {:?}", other),
    }

    // The helper ran `ls -la` against the confined mount path.
    let (_, spec) = fake.created_specs().pop().unwrap();
    assert_eq!(spec.command, vec!["ls", "-la", "/mnt/volume"]);
}

#[tokio::test]
async fn vol_list_escape_is_rejected_before_any_runtime_call() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new();
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolList {
            volume: "data".into(),
            path: "../../etc/passwd".into(),
        })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Failed);
    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::PathEscape);
    assert!(fake.calls().is_empty(), "no runtime call may happen after a path escape");
}

#[yare::parameterized(
    climb_out    = { "../../etc/passwd" },
    climb_inner  = { "a/../../b" },
)]
fn backup_names_escaping_the_backup_dir_are_rejected(name: &str) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    rt.block_on(async {
        let dir = tempfile::tempdir().unwrap();
        let fake = FakeRuntime::new();
        let orch = orchestrator(&fake, dir.path());

        let outcome = orch
            .run(TransferRequest::DbBackup {
                container: "pg-main".into(),
                command: vec!["pg_dump".into()],
                destination: name.to_string(),
            })
            .await;

        assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::PathEscape);
        assert!(fake.calls().is_empty());
    });
}

#[tokio::test]
async fn vol_download_returns_bytes_with_filename() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new().with_frames(&[(StreamChannel::Stdout, b"file body")]);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolDownload {
            volume: "data".into(),
            path: "sub dir/notes.txt".into(),
        })
        .await;

    match outcome.result.unwrap() {
        TransferResponse::Bytes { bytes, content_type, filename } => {
            assert_eq!(bytes, b"file body");
            assert_eq!(content_type, "application/octet-stream");
            assert_eq!(filename, "notes.txt");
        }
        other => panic!("unexpected: {:?}", other),
    }

    let (_, spec) = fake.created_specs().pop().unwrap();
    assert_eq!(spec.command, vec!["cat", "/mnt/volume/sub dir/notes.txt"]);
}

#[tokio::test]
async fn vol_download_missing_file_maps_to_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new()
        .with_frames(&[(
            StreamChannel::Stderr,
            b"cat: can't open '/mnt/volume/nope': No such file or directory\n",
        )])
        .with_exit_code(1);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolDownload { volume: "data".into(), path: "nope".into() })
        .await;

    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn log_tail_demuxes_tty_less_containers() {
    let dir = tempfile::tempdir().unwrap();
    let mut logs = Vec::new();
    logs.extend_from_slice(&encode_frame(StreamChannel::Stdout, b"line out\n"));
    logs.extend_from_slice(&encode_frame(StreamChannel::Stderr, b"line err\n"));
    let fake = FakeRuntime::new().with_logs(logs);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::LogTail { container: "web".into(), tail: Some(50), timestamps: false })
        .await;

    match outcome.result.unwrap() {
        TransferResponse::Bytes { bytes, content_type, filename } => {
            assert_eq!(bytes, b"line out\nline err\n");
            assert_eq!(content_type, "text/plain; charset=utf-8");
            assert_eq!(filename, "web-logs.txt");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn log_tail_copies_tty_streams_raw() {
    let dir = tempfile::tempdir().unwrap();
    let fake =
        FakeRuntime::new().with_tty(true).with_logs(b"raw tty log line\n".to_vec());
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::LogTail { container: "web".into(), tail: None, timestamps: false })
        .await;

    match outcome.result.unwrap() {
        TransferResponse::Bytes { bytes, .. } => assert_eq!(bytes, b"raw tty log line\n"),
        other => panic!("unexpected: {:?}", other),
    }
}

#[tokio::test]
async fn empty_ref_is_rejected_without_starting() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new();
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::LogTail { container: "  ".into(), tail: None, timestamps: false })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Failed);
    assert!(outcome.job.started_at_ms.is_none(), "rejected jobs never run");
    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::InvalidRequest);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn runtime_failure_fails_the_job_without_leaks() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new().failing_at([FailPoint::Wait]);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolBackup { volume: "data".into(), destination: "data.tar".into() })
        .await;

    assert_eq!(outcome.job.status, TransferStatus::Failed);
    assert_eq!(outcome.result.unwrap_err().kind(), ErrorKind::Runtime);
    assert!(fake.leaked_containers().is_empty());
    assert!(!dir.path().join("data.tar").exists());
    assert!(!dir.path().join("data.tar.partial").exists());
}

#[tokio::test]
async fn job_kind_and_refs_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRuntime::new().with_frames(&[(StreamChannel::Stdout, b"x")]);
    let orch = orchestrator(&fake, dir.path());

    let outcome = orch
        .run(TransferRequest::VolBackup { volume: "data".into(), destination: "d.tar".into() })
        .await;

    assert_eq!(outcome.job.kind, TransferKind::VolBackup);
    assert_eq!(outcome.job.source, "data");
    assert_eq!(outcome.job.destination, "d.tar");
}
