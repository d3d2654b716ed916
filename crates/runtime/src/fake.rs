// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scripted fake runtime for tests.
//!
//! Records every lifecycle call, serves canned multiplexed output on
//! attach/exec streams, captures pumped stdin, and injects failures at
//! scripted steps.

use crate::error::RuntimeError;
use crate::runtime::ContainerRuntime;
use crate::spec::{AttachedStream, ContainerSpec, ExecSpec, LogOptions};
use async_trait::async_trait;
use dockhand_mux::{encode_frame, StreamChannel};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::io::Cursor;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite};

/// One recorded lifecycle call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    ImagePresent(String),
    PullImage(String),
    Created(String),
    Attached(String),
    Started(String),
    Waited(String),
    Removed(String),
    TtyInspected(String),
    ExecCreated(String),
    ExecStarted(String),
    ExecInspected(String),
    Logs(String),
}

/// Step at which a scripted failure fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Pull,
    Create,
    Attach,
    Start,
    Wait,
    Remove,
    ExecCreate,
    ExecStart,
    ExecInspect,
    Logs,
}

#[derive(Default)]
struct SharedState {
    calls: Vec<RuntimeCall>,
    created: Vec<(String, ContainerSpec)>,
    stdin: Vec<u8>,
    stdin_closed: bool,
    seq: u32,
}

/// Scripted fake [`ContainerRuntime`].
#[derive(Clone)]
pub struct FakeRuntime {
    state: Arc<Mutex<SharedState>>,
    fail_at: Arc<HashSet<FailPoint>>,
    output: Arc<Vec<u8>>,
    logs: Arc<Vec<u8>>,
    exit_code: i64,
    tty: bool,
    image_present: bool,
    wait_hang: bool,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SharedState::default())),
            fail_at: Arc::new(HashSet::new()),
            output: Arc::new(Vec::new()),
            logs: Arc::new(Vec::new()),
            exit_code: 0,
            tty: false,
            image_present: true,
            wait_hang: false,
        }
    }

    /// Raw multiplexed bytes served on attach/exec output streams.
    pub fn with_output(mut self, bytes: Vec<u8>) -> Self {
        self.output = Arc::new(bytes);
        self
    }

    /// Convenience: encode `(channel, payload)` pairs as the output stream.
    pub fn with_frames(self, frames: &[(StreamChannel, &[u8])]) -> Self {
        let mut out = Vec::new();
        for (channel, payload) in frames {
            out.extend_from_slice(&encode_frame(*channel, payload));
        }
        self.with_output(out)
    }

    pub fn with_exit_code(mut self, code: i64) -> Self {
        self.exit_code = code;
        self
    }

    pub fn with_tty(mut self, tty: bool) -> Self {
        self.tty = tty;
        self
    }

    pub fn with_image_absent(mut self) -> Self {
        self.image_present = false;
        self
    }

    pub fn with_logs(mut self, bytes: Vec<u8>) -> Self {
        self.logs = Arc::new(bytes);
        self
    }

    /// Make `wait_container` sleep for an hour before resolving.
    pub fn with_wait_hang(mut self) -> Self {
        self.wait_hang = true;
        self
    }

    pub fn failing_at(mut self, points: impl IntoIterator<Item = FailPoint>) -> Self {
        self.fail_at = Arc::new(points.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().calls.clone()
    }

    pub fn created_specs(&self) -> Vec<(String, ContainerSpec)> {
        self.state.lock().created.clone()
    }

    pub fn stdin_bytes(&self) -> Vec<u8> {
        self.state.lock().stdin.clone()
    }

    pub fn stdin_closed(&self) -> bool {
        self.state.lock().stdin_closed
    }

    /// Container ids with a `Created` call but no matching `Removed`.
    pub fn leaked_containers(&self) -> Vec<String> {
        let calls = self.calls();
        calls
            .iter()
            .filter_map(|call| match call {
                RuntimeCall::Created(id) => Some(id.clone()),
                _ => None,
            })
            .filter(|id| {
                !calls.iter().any(|c| matches!(c, RuntimeCall::Removed(r) if r == id))
            })
            .collect()
    }

    fn step(&self, call: RuntimeCall, point: FailPoint) -> Result<(), RuntimeError> {
        self.state.lock().calls.push(call);
        self.check(point)
    }

    fn check(&self, point: FailPoint) -> Result<(), RuntimeError> {
        if self.fail_at.contains(&point) {
            return Err(RuntimeError::Api {
                status: 500,
                message: format!("scripted failure at {:?}", point),
            });
        }
        Ok(())
    }

    fn attach_stream(&self, stdin: bool) -> AttachedStream {
        let stdin_sink: Option<Box<dyn AsyncWrite + Send + Unpin>> = if stdin {
            Some(Box::new(StdinSink { state: self.state.clone() }))
        } else {
            None
        };
        AttachedStream {
            stdin: stdin_sink,
            output: Box::new(Cursor::new(self.output.as_ref().clone())),
        }
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn image_present(&self, image: &str) -> Result<bool, RuntimeError> {
        self.state.lock().calls.push(RuntimeCall::ImagePresent(image.to_string()));
        Ok(self.image_present)
    }

    async fn pull_image(&self, image: &str) -> Result<(), RuntimeError> {
        self.step(RuntimeCall::PullImage(image.to_string()), FailPoint::Pull)
    }

    async fn create_container(
        &self,
        name: &str,
        spec: &ContainerSpec,
    ) -> Result<String, RuntimeError> {
        // A failed create yields no handle, so nothing is recorded.
        self.check(FailPoint::Create)?;
        let mut state = self.state.lock();
        state.seq += 1;
        let id = format!("{}-{}", name, state.seq);
        state.calls.push(RuntimeCall::Created(id.clone()));
        state.created.push((id.clone(), spec.clone()));
        Ok(id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.step(RuntimeCall::Started(id.to_string()), FailPoint::Start)
    }

    async fn attach_container(
        &self,
        id: &str,
        stdin: bool,
    ) -> Result<AttachedStream, RuntimeError> {
        self.step(RuntimeCall::Attached(id.to_string()), FailPoint::Attach)?;
        Ok(self.attach_stream(stdin))
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError> {
        if self.wait_hang {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        }
        self.step(RuntimeCall::Waited(id.to_string()), FailPoint::Wait)?;
        Ok(self.exit_code)
    }

    async fn remove_container(&self, id: &str) -> Result<(), RuntimeError> {
        // A failed removal leaves the container behind, so only record
        // the removal when it goes through.
        self.check(FailPoint::Remove)?;
        self.state.lock().calls.push(RuntimeCall::Removed(id.to_string()));
        Ok(())
    }

    async fn container_uses_tty(&self, id: &str) -> Result<bool, RuntimeError> {
        self.state.lock().calls.push(RuntimeCall::TtyInspected(id.to_string()));
        Ok(self.tty)
    }

    async fn create_exec(&self, container: &str, _spec: &ExecSpec) -> Result<String, RuntimeError> {
        self.check(FailPoint::ExecCreate)?;
        let mut state = self.state.lock();
        state.seq += 1;
        let id = format!("exec-{}-{}", container, state.seq);
        state.calls.push(RuntimeCall::ExecCreated(id.clone()));
        Ok(id)
    }

    async fn start_exec(
        &self,
        exec_id: &str,
        stdin: bool,
    ) -> Result<AttachedStream, RuntimeError> {
        self.step(RuntimeCall::ExecStarted(exec_id.to_string()), FailPoint::ExecStart)?;
        Ok(self.attach_stream(stdin))
    }

    async fn exec_exit_code(&self, exec_id: &str) -> Result<i64, RuntimeError> {
        self.step(RuntimeCall::ExecInspected(exec_id.to_string()), FailPoint::ExecInspect)?;
        Ok(self.exit_code)
    }

    async fn container_logs(
        &self,
        id: &str,
        _opts: &LogOptions,
    ) -> Result<Box<dyn AsyncRead + Send + Unpin>, RuntimeError> {
        self.step(RuntimeCall::Logs(id.to_string()), FailPoint::Logs)?;
        Ok(Box::new(Cursor::new(self.logs.as_ref().clone())))
    }
}

/// Write half handed out for stdin; appends into the shared state and
/// flags the EOF shutdown.
struct StdinSink {
    state: Arc<Mutex<SharedState>>,
}

impl AsyncWrite for StdinSink {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.state.lock().stdin.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.state.lock().stdin_closed = true;
        Poll::Ready(Ok(()))
    }
}
