// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dockhand_mux::DecodeError;

#[test]
fn kinds_classify_every_variant() {
    let cases: Vec<(TransferError, ErrorKind)> = vec![
        (TransferError::Protocol(DecodeError::InvalidChannel(9)), ErrorKind::Protocol),
        (TransferError::NotFound("x".into()), ErrorKind::NotFound),
        (
            TransferError::PathEscape(PathEscapeError {
                root: "/vol".into(),
                requested: "../x".into(),
            }),
            ErrorKind::PathEscape,
        ),
        (TransferError::Runtime("boom".into()), ErrorKind::Runtime),
        (TransferError::Io(std::io::Error::other("disk full")), ErrorKind::Io),
        (
            TransferError::ProcessExit { exit_code: 2, stderr: "bad".into() },
            ErrorKind::ProcessExit,
        ),
        (TransferError::InvalidRequest("empty".into()), ErrorKind::InvalidRequest),
    ];
    for (error, kind) in cases {
        assert_eq!(error.kind(), kind, "error: {}", error);
    }
}

#[test]
fn runtime_not_found_stays_not_found() {
    let err: TransferError = RuntimeError::NotFound("no such container: x".into()).into();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn runtime_api_error_keeps_diagnostic_text() {
    let err: TransferError =
        RuntimeError::Api { status: 500, message: "driver failed".into() }.into();
    assert_eq!(err.kind(), ErrorKind::Runtime);
    assert!(err.to_string().contains("driver failed"));
}

#[test]
fn pump_decode_maps_to_protocol() {
    let err: TransferError = PumpError::Decode(DecodeError::TrailingBytes(3)).into();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn process_exit_message_carries_stderr() {
    let err = TransferError::ProcessExit {
        exit_code: 1,
        stderr: "pg_dump: connection refused".into(),
    };
    assert!(err.to_string().contains("pg_dump: connection refused"));
}

#[test]
fn error_kind_serializes_snake_case() {
    assert_eq!(serde_json::to_string(&ErrorKind::PathEscape).unwrap(), r#""path_escape""#);
    assert_eq!(ErrorKind::ProcessExit.to_string(), "process-exit");
}
