// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream pumps between local files, remote attach streams, and buffers.
//!
//! Every pump reads in bounded chunks and awaits each write before the
//! next read, so a slow sink throttles the source instead of growing an
//! unbounded buffer. Whole payloads are never held in memory.

use crate::frame::{DecodeError, FrameDecoder, StreamChannel};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Read/write chunk size.
const CHUNK_SIZE: usize = 8 * 1024;

/// Default cap on captured stderr diagnostics.
pub const DEFAULT_STDERR_CAP: usize = 64 * 1024;

/// Transfer failures, split by which side of the pump broke.
#[derive(Debug, Error)]
pub enum PumpError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Source-side failure: the remote stream broke mid-transfer.
    #[error("stream read failed: {0}")]
    Read(#[source] std::io::Error),
    /// Sink-side failure (disk full, closed pipe); the source should be
    /// cancelled by the caller.
    #[error("sink write failed: {0}")]
    Write(#[source] std::io::Error),
}

/// What a demultiplexing transfer moved.
#[derive(Debug, Default)]
pub struct DemuxSummary {
    /// Stdout payload bytes written to the sink.
    pub stdout_bytes: u64,
    /// Captured stderr text, truncated to the cap.
    pub stderr: String,
}

/// Pump a source into a process's stdin, then shut the writer down so the
/// contained process observes EOF.
///
/// Without the shutdown, commands that read stdin to completion (`tar -x`,
/// `psql`) would never terminate.
pub async fn pump_stdin<R, W>(mut source: R, mut stdin: W) -> Result<u64, PumpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = source.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            break;
        }
        stdin.write_all(&buf[..n]).await.map_err(PumpError::Write)?;
        written += n as u64;
    }
    stdin.shutdown().await.map_err(PumpError::Write)?;
    tracing::trace!(written, "stdin pump complete");
    Ok(written)
}

/// Demultiplex a combined output stream, writing stdout payload bytes to
/// `sink` and capturing stderr for diagnostics.
///
/// Stderr never reaches the sink; interleaved stdout frames arrive in the
/// sink byte-for-byte in their original order.
pub async fn demux_stream<R, W>(
    mut source: R,
    sink: &mut W,
    stderr_cap: usize,
) -> Result<DemuxSummary, PumpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut summary = DemuxSummary::default();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = source.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            break;
        }
        for frame in decoder.feed(&buf[..n])? {
            match frame.channel {
                StreamChannel::Stdout => {
                    sink.write_all(&frame.payload).await.map_err(PumpError::Write)?;
                    summary.stdout_bytes += frame.payload.len() as u64;
                }
                StreamChannel::Stderr => {
                    push_capped(&mut summary.stderr, &frame.payload, stderr_cap);
                }
            }
        }
    }
    decoder.finish()?;
    sink.flush().await.map_err(PumpError::Write)?;
    Ok(summary)
}

/// Demultiplex a stream writing BOTH channels' payloads to the sink in
/// arrival order. Used for log tails, where stderr lines are part of the
/// log rather than diagnostics.
pub async fn demux_merged<R, W>(mut source: R, sink: &mut W) -> Result<u64, PumpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut total = 0u64;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = source.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            break;
        }
        for frame in decoder.feed(&buf[..n])? {
            sink.write_all(&frame.payload).await.map_err(PumpError::Write)?;
            total += frame.payload.len() as u64;
        }
    }
    decoder.finish()?;
    sink.flush().await.map_err(PumpError::Write)?;
    Ok(total)
}

/// Copy an unmultiplexed stream to the sink. TTY containers attach raw,
/// with no frame headers to strip.
pub async fn copy_stream<R, W>(mut source: R, sink: &mut W) -> Result<u64, PumpError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut total = 0u64;
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = source.read(&mut buf).await.map_err(PumpError::Read)?;
        if n == 0 {
            break;
        }
        sink.write_all(&buf[..n]).await.map_err(PumpError::Write)?;
        total += n as u64;
    }
    sink.flush().await.map_err(PumpError::Write)?;
    Ok(total)
}

/// Append UTF-8 text to `out`, truncating on a char boundary at `cap`.
fn push_capped(out: &mut String, payload: &[u8], cap: usize) {
    if out.len() >= cap {
        return;
    }
    let text = String::from_utf8_lossy(payload);
    let room = cap - out.len();
    if text.len() <= room {
        out.push_str(&text);
    } else {
        let mut end = room;
        while end > 0 && !text.is_char_boundary(end) {
            end -= 1;
        }
        out.push_str(&text[..end]);
    }
}

#[cfg(test)]
#[path = "pump_tests.rs"]
mod tests;
