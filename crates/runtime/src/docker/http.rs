// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/1.1 client for the container engine's Unix socket API.
//!
//! Hand-rolled like our other socket clients: requests are formatted
//! directly, responses are read with Content-Length / chunked / to-EOF
//! framing, and attach endpoints hijack the connection (`Upgrade: tcp`)
//! into a raw duplex stream — write half feeds stdin, read half carries
//! the multiplexed output.

use crate::error::RuntimeError;
use crate::spec::AttachedStream;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Debug)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

struct ResponseHead {
    status: u16,
    content_length: Option<usize>,
    chunked: bool,
}

/// Send a request and read a complete (non-hijacked) response.
pub(crate) async fn request(
    socket: &Path,
    method: &str,
    path: &str,
    body: Option<&serde_json::Value>,
) -> Result<HttpResponse, RuntimeError> {
    let mut stream = connect(socket).await?;
    let request = format_request(method, path, body, false);
    stream.write_all(request.as_bytes()).await?;

    let mut reader = BufReader::new(&mut stream);
    let head = read_head(&mut reader).await?;
    let body = read_body(&mut reader, &head).await?;
    Ok(HttpResponse { status: head.status, body })
}

/// Send a request with `Upgrade: tcp` and return the hijacked stream.
pub(crate) async fn hijack(
    socket: &Path,
    method: &str,
    path: &str,
    body: Option<&serde_json::Value>,
) -> Result<AttachedStream, RuntimeError> {
    let stream = connect(socket).await?;
    let (read_half, mut write_half) = stream.into_split();

    let request = format_request(method, path, body, true);
    write_half.write_all(request.as_bytes()).await?;

    let mut reader = BufReader::new(read_half);
    let head = read_head(&mut reader).await?;
    if head.status != 101 && head.status != 200 {
        let body = read_body(&mut reader, &head).await?;
        return Err(api_error(head.status, &body));
    }

    // Past the head the connection is raw. Bytes the reader already
    // buffered belong to the stream, so the reader itself is handed out.
    Ok(AttachedStream { stdin: Some(Box::new(write_half)), output: Box::new(reader) })
}

async fn connect(socket: &Path) -> Result<UnixStream, RuntimeError> {
    UnixStream::connect(socket)
        .await
        .map_err(|e| RuntimeError::Connect(format!("{}: {}", socket.display(), e)))
}

fn format_request(
    method: &str,
    path: &str,
    body: Option<&serde_json::Value>,
    upgrade: bool,
) -> String {
    let mut request = format!("{} {} HTTP/1.1\r\nHost: localhost\r\n", method, path);
    if upgrade {
        request.push_str("Connection: Upgrade\r\nUpgrade: tcp\r\n");
    } else {
        // One connection per operation; close-delimited bodies then
        // terminate instead of waiting out the engine's keep-alive.
        request.push_str("Connection: close\r\n");
    }
    match body {
        Some(value) => {
            let json = value.to_string();
            request.push_str(&format!(
                "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
                json.len(),
                json
            ));
        }
        None => request.push_str("\r\n"),
    }
    request
}

/// Read and parse a response status line plus headers.
async fn read_head<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<ResponseHead, RuntimeError> {
    let mut status_line = String::new();
    reader.read_line(&mut status_line).await?;

    let status =
        status_line.split_whitespace().nth(1).and_then(|s| s.parse::<u16>().ok()).unwrap_or(0);

    let mut content_length = None;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await?;
        if line == "\r\n" || line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().ok();
        } else if let Some(value) = lower.strip_prefix("transfer-encoding:") {
            chunked = value.trim() == "chunked";
        }
    }

    Ok(ResponseHead { status, content_length, chunked })
}

/// Read a response body honoring its framing: Content-Length, chunked,
/// or everything until the engine closes the connection.
async fn read_body<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
    head: &ResponseHead,
) -> Result<Vec<u8>, RuntimeError> {
    if head.status == 204 || head.status == 304 {
        return Ok(Vec::new());
    }
    if head.chunked {
        return read_chunked(reader).await;
    }
    match head.content_length {
        Some(length) => {
            let mut body = vec![0u8; length];
            reader.read_exact(&mut body).await?;
            Ok(body)
        }
        None => {
            let mut body = Vec::new();
            reader.read_to_end(&mut body).await?;
            Ok(body)
        }
    }
}

async fn read_chunked<R: AsyncRead + Unpin>(
    reader: &mut BufReader<R>,
) -> Result<Vec<u8>, RuntimeError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await?;
        let size_field = size_line.trim().split(';').next().unwrap_or("");
        let size = usize::from_str_radix(size_field, 16).map_err(|_| RuntimeError::Api {
            status: 0,
            message: format!("bad chunk size line {:?}", size_line.trim()),
        })?;
        if size == 0 {
            // trailer section ends with a blank line
            loop {
                let mut trailer = String::new();
                reader.read_line(&mut trailer).await?;
                if trailer == "\r\n" || trailer.is_empty() {
                    break;
                }
            }
            return Ok(body);
        }
        let start = body.len();
        body.resize(start + size, 0);
        reader.read_exact(&mut body[start..]).await?;
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf).await?;
    }
}

/// Map a non-2xx engine response to a [`RuntimeError`].
///
/// Engine errors arrive as `{"message": "..."}` JSON; fall back to the
/// raw body text.
pub(crate) fn api_error(status: u16, body: &[u8]) -> RuntimeError {
    let text = String::from_utf8_lossy(body);
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| text.trim().to_string());
    if status == 404 {
        RuntimeError::NotFound(message)
    } else {
        RuntimeError::Api { status, message }
    }
}

/// Percent-encode a path or query segment (image refs carry `/` and `:`).
pub(crate) fn encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
