// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dockhand-runtime: the container runtime seam and its Docker Engine
//! implementation, plus the two stream-session orchestrators — ephemeral
//! helper containers and exec channels.

pub mod docker;
mod error;
mod exec;
mod helper;
mod runtime;
mod spec;
mod stdio;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FailPoint, FakeRuntime, RuntimeCall};

pub use docker::DockerRuntime;
pub use error::{RunError, RuntimeError};
pub use exec::{ExecChannel, ExecRun};
pub use helper::{EphemeralContainerRunner, HelperRun};
pub use runtime::ContainerRuntime;
pub use spec::{AttachedStream, BindMount, ContainerSpec, ExecSpec, LogOptions};
