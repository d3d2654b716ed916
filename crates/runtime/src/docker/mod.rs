// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker Engine API runtime over the local Unix socket.
//!
//! Every operation opens a fresh connection; attach and exec-start
//! hijack theirs into a raw stream. No operation is retried — failures
//! surface immediately with the engine's diagnostic text.

pub(crate) mod http;

use crate::error::RuntimeError;
use crate::runtime::ContainerRuntime;
use crate::spec::{AttachedStream, ContainerSpec, ExecSpec, LogOptions};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncRead;

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
const API_PREFIX: &str = "/v1.41";

/// Exec inspect may briefly report `Running` after the hijacked stream
/// closes; poll a few times before giving up.
const EXEC_INSPECT_ATTEMPTS: u32 = 20;
const EXEC_INSPECT_DELAY: Duration = Duration::from_millis(50);

#[derive(Deserialize)]
struct IdResponse {
    #[serde(rename = "Id")]
    id: String,
}

#[derive(Deserialize)]
struct WaitResponse {
    #[serde(rename = "StatusCode")]
    status_code: i64,
}

#[derive(Deserialize)]
struct ExecInspect {
    #[serde(rename = "Running")]
    running: bool,
    #[serde(rename = "ExitCode")]
    exit_code: Option<i64>,
}

/// [`ContainerRuntime`] backed by the Docker Engine HTTP API.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    socket: PathBuf,
    api_prefix: String,
}

impl Default for DockerRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_SOCKET)
    }
}

impl DockerRuntime {
    pub fn new(socket: impl Into<PathBuf>) -> Self {
        Self { socket: socket.into(), api_prefix: API_PREFIX.to_string() }
    }

    /// Override the negotiated API version (e.g. `"v1.43"`).
    pub fn with_api_version(mut self, version: &str) -> Self {
        self.api_prefix = format!("/{}", version.trim_start_matches('/'));
        self
    }

    fn path(&self, rest: impl AsRef<str>) -> String {
        format!("{}{}", self.api_prefix, rest.as_ref())
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn image_present(&self, image: &str) -> Result<bool, RuntimeError> {
        let path = self.path(format!("/images/{}/json", http::encode_segment(image)));
        let resp = http::request(&self.socket, "GET", &path, None).await?;
        match resp.status {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(http::api_error(status, &resp.body)),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        tracing::info!(%image, "pulling image");
        let path = self.path(format!("/images/create?fromImage={}", http::encode_segment(image)));
        let resp = http::request(&self.socket, "POST", &path, None).await?;
        if resp.status != 200 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        // Pull failures can arrive as error records inside a 200 body.
        for line in resp.body.split(|b| *b == b'\n') {
            if line.is_empty() {
                continue;
            }
            if let Ok(value) = serde_json::from_slice::<serde_json::Value>(line) {
                if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
                    return Err(RuntimeError::Api { status: 200, message: message.to_string() });
                }
            }
        }
        Ok(())
    }

    async fn create_container(
        &self,
        name: &str,
        spec: &ContainerSpec,
    ) -> Result<String, RuntimeError> {
        let body = serde_json::json!({
            "Image": spec.image,
            "Cmd": spec.command,
            "AttachStdin": spec.stdin,
            "AttachStdout": true,
            "AttachStderr": true,
            "OpenStdin": spec.stdin,
            "StdinOnce": spec.stdin,
            "HostConfig": {
                "Binds": spec.binds.iter().map(|b| b.to_bind()).collect::<Vec<_>>(),
            },
        });
        let path =
            self.path(format!("/containers/create?name={}", http::encode_segment(name)));
        let resp = http::request(&self.socket, "POST", &path, Some(&body)).await?;
        if resp.status != 201 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        let created: IdResponse = serde_json::from_slice(&resp.body).map_err(|e| {
            RuntimeError::Api { status: resp.status, message: format!("bad create response: {}", e) }
        })?;
        tracing::debug!(id = %created.id, image = %spec.image, "container created");
        Ok(created.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        let path = self.path(format!("/containers/{}/start", http::encode_segment(id)));
        let resp = http::request(&self.socket, "POST", &path, None).await?;
        match resp.status {
            204 | 304 => Ok(()),
            status => Err(http::api_error(status, &resp.body)),
        }
    }

    async fn attach_container(
        &self,
        id: &str,
        stdin: bool,
    ) -> Result<AttachedStream, RuntimeError> {
        let mut query = String::from("stream=1&stdout=1&stderr=1");
        if stdin {
            query.push_str("&stdin=1");
        }
        let path =
            self.path(format!("/containers/{}/attach?{}", http::encode_segment(id), query));
        let mut attached = http::hijack(&self.socket, "POST", &path, None).await?;
        if !stdin {
            attached.stdin = None;
        }
        Ok(attached)
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError> {
        let path = self.path(format!("/containers/{}/wait", http::encode_segment(id)));
        let resp = http::request(&self.socket, "POST", &path, None).await?;
        if resp.status != 200 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        let wait: WaitResponse = serde_json::from_slice(&resp.body).map_err(|e| {
            RuntimeError::Api { status: resp.status, message: format!("bad wait response: {}", e) }
        })?;
        Ok(wait.status_code)
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        let path = self.path(format!("/containers/{}?force=1", http::encode_segment(id)));
        let resp = http::request(&self.socket, "DELETE", &path, None).await?;
        match resp.status {
            // An already-gone container counts as removed.
            204 | 404 => Ok(()),
            status => Err(http::api_error(status, &resp.body)),
        }
    }

    async fn container_uses_tty(&self, id: &str) -> Result<bool, RuntimeError> {
        let path = self.path(format!("/containers/{}/json", http::encode_segment(id)));
        let resp = http::request(&self.socket, "GET", &path, None).await?;
        if resp.status != 200 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        let inspect: serde_json::Value = serde_json::from_slice(&resp.body).map_err(|e| {
            RuntimeError::Api {
                status: resp.status,
                message: format!("bad inspect response: {}", e),
            }
        })?;
        Ok(inspect.pointer("/Config/Tty").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    async fn create_exec(&self, container: &str, spec: &ExecSpec) -> Result<String, RuntimeError> {
        let body = serde_json::json!({
            "Cmd": spec.command,
            "AttachStdin": spec.stdin,
            "AttachStdout": true,
            "AttachStderr": true,
        });
        let path = self.path(format!("/containers/{}/exec", http::encode_segment(container)));
        let resp = http::request(&self.socket, "POST", &path, Some(&body)).await?;
        if resp.status != 201 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        let created: IdResponse = serde_json::from_slice(&resp.body).map_err(|e| {
            RuntimeError::Api { status: resp.status, message: format!("bad exec response: {}", e) }
        })?;
        Ok(created.id)
    }

    async fn start_exec(
        &self,
        exec_id: &str,
        stdin: bool,
    ) -> Result<AttachedStream, RuntimeError> {
        let body = serde_json::json!({ "Detach": false, "Tty": false });
        let path = self.path(format!("/exec/{}/start", http::encode_segment(exec_id)));
        let mut attached = http::hijack(&self.socket, "POST", &path, Some(&body)).await?;
        if !stdin {
            attached.stdin = None;
        }
        Ok(attached)
    }

    async fn exec_exit_code(&self, exec_id: &str) -> Result<i64, RuntimeError> {
        let path = self.path(format!("/exec/{}/json", http::encode_segment(exec_id)));
        for _ in 0..EXEC_INSPECT_ATTEMPTS {
            let resp = http::request(&self.socket, "GET", &path, None).await?;
            if resp.status != 200 {
                return Err(http::api_error(resp.status, &resp.body));
            }
            let inspect: ExecInspect = serde_json::from_slice(&resp.body).map_err(|e| {
                RuntimeError::Api {
                    status: resp.status,
                    message: format!("bad exec inspect response: {}", e),
                }
            })?;
            if !inspect.running {
                if let Some(code) = inspect.exit_code {
                    return Ok(code);
                }
            }
            tokio::time::sleep(EXEC_INSPECT_DELAY).await;
        }
        Err(RuntimeError::Timeout(format!("exec {} completion", exec_id)))
    }

    async fn container_logs(
        &self,
        id: &str,
        opts: &LogOptions,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, RuntimeError> {
        let mut query = String::from("stdout=1&stderr=1");
        if let Some(tail) = opts.tail {
            query.push_str(&format!("&tail={}", tail));
        }
        if opts.timestamps {
            query.push_str("&timestamps=1");
        }
        let path = self.path(format!("/containers/{}/logs?{}", http::encode_segment(id), query));
        let resp = http::request(&self.socket, "GET", &path, None).await?;
        if resp.status != 200 {
            return Err(http::api_error(resp.status, &resp.body));
        }
        Ok(Box::new(Cursor::new(resp.body)))
    }
}
