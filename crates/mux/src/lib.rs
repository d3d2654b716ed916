// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream demultiplexing for container attach/exec output.
//!
//! Wire format: 8-byte header — 1 channel byte (1 = stdout, 2 = stderr),
//! 3 reserved bytes, 4-byte big-endian payload length — followed by
//! exactly that many payload bytes, repeating until stream close.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod frame;
mod pump;

pub use frame::{encode_frame, DecodeError, Frame, FrameDecoder, StreamChannel, HEADER_LEN};
pub use pump::{
    copy_stream, demux_merged, demux_stream, pump_stdin, DemuxSummary, PumpError,
    DEFAULT_STDERR_CAP,
};
