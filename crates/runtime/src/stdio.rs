// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared stdio wiring for helper containers and exec channels.
//!
//! The stdin pump runs as its own task, concurrent with output
//! demultiplexing — the contained process may start emitting output
//! before it has consumed all of its input.

use crate::error::{RunError, RuntimeError};
use crate::spec::AttachedStream;
use dockhand_mux::{demux_stream, pump_stdin, DemuxSummary, PumpError};
use tokio::io::{AsyncRead, AsyncWrite};

pub(crate) async fn relay_stdio<R, W>(
    attached: AttachedStream,
    stdin_source: Option<R>,
    sink: &mut W,
    stderr_cap: usize,
) -> Result<DemuxSummary, RunError>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Unpin,
{
    let stdin_task = match stdin_source {
        Some(source) => {
            let stdin = attached.stdin.ok_or_else(|| {
                RuntimeError::Io(std::io::Error::other("attach stream is missing a stdin half"))
            })?;
            Some(tokio::spawn(pump_stdin(source, stdin)))
        }
        None => None,
    };

    let mut output = attached.output;
    let summary = match demux_stream(&mut output, sink, stderr_cap).await {
        Ok(summary) => summary,
        Err(e) => {
            // Output side broke: stop feeding stdin before surfacing.
            if let Some(task) = &stdin_task {
                task.abort();
            }
            return Err(e.into());
        }
    };

    if let Some(task) = stdin_task {
        match task.await {
            Ok(Ok(written)) => {
                tracing::debug!(written, "stdin fully written and closed");
            }
            // The process exited before draining stdin; its exit code
            // decides the outcome.
            Ok(Err(PumpError::Write(e)))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::BrokenPipe
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::UnexpectedEof
                ) =>
            {
                tracing::debug!(error = %e, "container closed stdin early");
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(join_err) if join_err.is_cancelled() => {}
            Err(join_err) => {
                return Err(RunError::Pump(PumpError::Read(std::io::Error::other(join_err))))
            }
        }
    }

    Ok(summary)
}
