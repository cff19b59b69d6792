// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use super::{rotate_log_if_needed, write_startup_marker, MAX_LOG_SIZE, STARTUP_MARKER_PREFIX};

fn write_bytes(path: &std::path::Path, size: u64) {
    let mut f = std::fs::File::create(path).unwrap();
    let buf = vec![b'x'; size as usize];
    f.write_all(&buf).unwrap();
}

#[test]
fn rotate_skips_small_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("owbd.log");
    write_bytes(&log, 1024);

    rotate_log_if_needed(&log);

    assert!(log.exists(), "small log should not be rotated");
    assert!(!dir.path().join("owbd.log.1").exists());
}

#[test]
fn rotate_moves_large_file() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("owbd.log");
    write_bytes(&log, MAX_LOG_SIZE + 1);

    rotate_log_if_needed(&log);

    assert!(!log.exists(), "original should be renamed");
    assert!(dir.path().join("owbd.log.1").exists());
}

#[test]
fn rotate_shifts_existing_rotations() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("owbd.log");
    write_bytes(&dir.path().join("owbd.log.1"), 100);
    write_bytes(&dir.path().join("owbd.log.2"), 200);
    write_bytes(&log, MAX_LOG_SIZE + 1);

    rotate_log_if_needed(&log);

    assert!(dir.path().join("owbd.log.2").exists());
    assert!(dir.path().join("owbd.log.3").exists());
}

#[test]
fn write_startup_marker_appends_pid_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("owbd.log");

    write_startup_marker(&log).unwrap();

    let contents = std::fs::read_to_string(&log).unwrap();
    assert!(contents.starts_with(STARTUP_MARKER_PREFIX));
    assert!(contents.contains(&std::process::id().to_string()));
}

#[test]
fn write_startup_marker_creates_parent_dir() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("nested/owbd.log");

    write_startup_marker(&log).unwrap();

    assert!(log.is_file());
}
