// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    read_write   = { "data", "/mnt/volume", false, "data:/mnt/volume" },
    read_only    = { "data", "/mnt/volume", true,  "data:/mnt/volume:ro" },
    host_path    = { "/srv/backups", "/backups", false, "/srv/backups:/backups" },
)]
fn bind_rendering(source: &str, target: &str, read_only: bool, expected: &str) {
    assert_eq!(BindMount::new(source, target, read_only).to_bind(), expected);
}

#[test]
fn container_spec_defaults() {
    let spec = ContainerSpec::new("busybox:stable", vec!["ls".to_string()]);
    assert!(spec.binds.is_empty());
    assert!(!spec.stdin);
}

#[test]
fn container_spec_setters_chain() {
    let spec = ContainerSpec::new("busybox:stable", vec!["tar".to_string()])
        .binds(vec![BindMount::new("data", "/mnt/volume", true)])
        .stdin(true);
    assert_eq!(spec.binds.len(), 1);
    assert!(spec.stdin);
}

#[test]
fn exec_spec_defaults_to_no_stdin() {
    let spec = ExecSpec::new(vec!["pg_dump".to_string()]);
    assert!(!spec.stdin);
    assert!(ExecSpec::new(vec![]).stdin(true).stdin);
}
