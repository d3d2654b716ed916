// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Incremental decoder for the multiplexed stdout/stderr frame format.

use thiserror::Error;

/// Size of a frame header: channel byte, 3 reserved bytes, big-endian
/// u32 payload length.
pub const HEADER_LEN: usize = 8;

/// Output channel a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamChannel {
    Stdout,
    Stderr,
}

impl StreamChannel {
    /// Wire tag for this channel.
    pub fn tag(self) -> u8 {
        match self {
            StreamChannel::Stdout => 1,
            StreamChannel::Stderr => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self, DecodeError> {
        match tag {
            1 => Ok(StreamChannel::Stdout),
            2 => Ok(StreamChannel::Stderr),
            other => Err(DecodeError::InvalidChannel(other)),
        }
    }
}

/// One demultiplexed unit: a channel tag plus its payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub channel: StreamChannel,
    pub payload: Vec<u8>,
}

/// Decoding failures. All are fatal to the current transfer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid channel byte {0:#04x} in frame header")]
    InvalidChannel(u8),
    /// The stream ended inside a payload. Always an error — a short frame
    /// must never be passed off as complete.
    #[error("stream ended {remaining} bytes short of a {expected}-byte payload")]
    TruncatedPayload { expected: usize, remaining: usize },
    /// The stream ended inside a header. Distinct from payload truncation
    /// so callers can decide whether trailing garbage is tolerable.
    #[error("stream ended with {0} trailing bytes of a partial header")]
    TrailingBytes(usize),
}

enum DecodeState {
    AwaitingHeader,
    AwaitingPayload { channel: StreamChannel, length: usize },
}

/// Stateful demultiplexer for one attach/exec stream.
///
/// Feed chunks as they arrive — boundaries are arbitrary; a chunk may end
/// mid-header, mid-payload, or carry several complete frames — and call
/// [`FrameDecoder::finish`] at EOF to catch truncation. Each decoder
/// belongs to exactly one stream.
pub struct FrameDecoder {
    residual: Vec<u8>,
    state: DecodeState,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self { residual: Vec::new(), state: DecodeState::AwaitingHeader }
    }

    /// Consume one chunk, returning every frame it completes.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, DecodeError> {
        self.residual.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            match self.state {
                DecodeState::AwaitingHeader => {
                    if self.residual.len() < HEADER_LEN {
                        break;
                    }
                    let channel = StreamChannel::from_tag(self.residual[0])?;
                    let length = u32::from_be_bytes([
                        self.residual[4],
                        self.residual[5],
                        self.residual[6],
                        self.residual[7],
                    ]) as usize;
                    self.residual.drain(..HEADER_LEN);
                    self.state = DecodeState::AwaitingPayload { channel, length };
                }
                DecodeState::AwaitingPayload { channel, length } => {
                    if self.residual.len() < length {
                        break;
                    }
                    let payload: Vec<u8> = self.residual.drain(..length).collect();
                    self.state = DecodeState::AwaitingHeader;
                    frames.push(Frame { channel, payload });
                }
            }
        }
        Ok(frames)
    }

    /// Assert the stream ended on a frame boundary.
    pub fn finish(&self) -> Result<(), DecodeError> {
        match self.state {
            DecodeState::AwaitingPayload { length, .. } => Err(DecodeError::TruncatedPayload {
                expected: length,
                remaining: length - self.residual.len(),
            }),
            DecodeState::AwaitingHeader if !self.residual.is_empty() => {
                Err(DecodeError::TrailingBytes(self.residual.len()))
            }
            DecodeState::AwaitingHeader => Ok(()),
        }
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode one frame in the multiplexed wire format.
///
/// The runtime produces this format; we encode it ourselves only in tests
/// and fakes.
pub fn encode_frame(channel: StreamChannel, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.push(channel.tag());
    out.extend_from_slice(&[0, 0, 0]);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
