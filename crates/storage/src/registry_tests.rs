// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use owb_core::{Artifact, ArtifactRole, ArtifactType, BuildResult, FakeClock, OutputImage};
use std::collections::HashSet;
use tempfile::tempdir;

fn profiles() -> Arc<dyn ProfileLookup> {
    let mut set = HashSet::new();
    set.insert("home-ap".to_string());
    Arc::new(set)
}

fn request() -> BuildRequest {
    BuildRequest {
        profile_id: "home-ap".into(),
        platform: "tl-wdr4300".into(),
        target: "ath79".into(),
        subtarget: "generic".into(),
        version: "23.05.4".into(),
        options: BuildOptions::default(),
    }
}

fn registry() -> (tempfile::TempDir, BuildRegistry<FakeClock>) {
    let dir = tempdir().unwrap();
    let clock = FakeClock::default();
    let reg = BuildRegistry::with_clock(dir.path(), profiles(), clock);
    (dir, reg)
}

#[test]
fn create_build_unknown_profile_fails() {
    let (_dir, reg) = registry();
    let mut req = request();
    req.profile_id = "missing".into();
    let err = reg.create_build(req).unwrap_err();
    assert_eq!(err.code(), "profile_not_found");
}

#[test]
fn create_build_enqueues_and_persists() {
    let (_dir, reg) = registry();
    let (record, created) = reg.create_build(request()).unwrap();
    assert!(created);
    assert_eq!(record.state, BuildState::Queued);
    assert_eq!(reg.queue().list().unwrap(), vec![record.build_id.clone()]);
    assert_eq!(reg.get_build(&record.build_id).unwrap().build_id, record.build_id);
}

#[test]
fn dedup_cache_hit_on_done_record() {
    let (_dir, reg) = registry();
    let (first, created) = reg.create_build(request()).unwrap();
    assert!(created);

    reg.update_build(&first.build_id, |r| {
        r.state = BuildState::Done;
        r.progress = 100;
        r.result = Some(BuildResult {
            artifacts: vec![Artifact {
                id: "sysupgrade".into(),
                name: "a.bin".into(),
                path: "/tmp/a.bin".into(),
                size: 1,
                kind: ArtifactType::Firmware,
                role: ArtifactRole::Primary,
            }],
        });
    })
    .unwrap();

    let (second, created2) = reg.create_build(request()).unwrap();
    assert!(!created2);
    assert_eq!(second.build_id, first.build_id);
}

#[test]
fn force_rebuild_bypasses_dedup() {
    let (_dir, reg) = registry();
    let (first, _) = reg.create_build(request()).unwrap();
    reg.update_build(&first.build_id, |r| {
        r.state = BuildState::Done;
        r.progress = 100;
        r.result = Some(BuildResult {
            artifacts: vec![Artifact {
                id: "sysupgrade".into(),
                name: "a.bin".into(),
                path: "/tmp/a.bin".into(),
                size: 1,
                kind: ArtifactType::Firmware,
                role: ArtifactRole::Primary,
            }],
        });
    })
    .unwrap();

    let mut forced = request();
    forced.options.force_rebuild = true;
    let (second, created) = reg.create_build(forced).unwrap();
    assert!(created);
    assert_ne!(second.build_id, first.build_id);
}

#[test]
fn cancel_while_queued_removes_from_queue() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    assert!(reg.cancel_build(&record.build_id).unwrap());
    let after = reg.get_build(&record.build_id).unwrap();
    assert_eq!(after.state, BuildState::Canceled);
    assert!(reg.queue().list().unwrap().is_empty());
    // idempotent: second cancel on a terminal build is a no-op
    assert!(!reg.cancel_build(&record.build_id).unwrap());
}

#[test]
fn cancel_while_running_sets_flag_without_state_change() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    reg.update_build(&record.build_id, |r| {
        r.state = BuildState::Running;
        r.runner_pid = Some(1234);
    })
    .unwrap();

    assert!(reg.cancel_build(&record.build_id).unwrap());
    let after = reg.get_build(&record.build_id).unwrap();
    assert_eq!(after.state, BuildState::Running);
    assert!(after.cancel_requested);
}

#[test]
fn delete_build_fails_while_running() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    reg.update_build(&record.build_id, |r| r.state = BuildState::Running).unwrap();
    let err = reg.delete_build(&record.build_id).unwrap_err();
    assert_eq!(err.code(), "build_running");
}

#[test]
fn delete_build_removes_record_and_artifacts() {
    let (dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    let artifact_path = dir.path().join("artifact.bin");
    std::fs::write(&artifact_path, b"data").unwrap();
    reg.update_build(&record.build_id, |r| {
        r.state = BuildState::Done;
        r.progress = 100;
        r.result = Some(BuildResult {
            artifacts: vec![Artifact {
                id: "sysupgrade".into(),
                name: "artifact.bin".into(),
                path: artifact_path.to_string_lossy().to_string(),
                size: 4,
                kind: ArtifactType::Firmware,
                role: ArtifactRole::Primary,
            }],
        });
    })
    .unwrap();

    assert!(reg.delete_build(&record.build_id).unwrap());
    assert!(reg.get_build(&record.build_id).is_err());
    assert!(!artifact_path.exists());
}

#[test]
fn list_build_artifacts_requires_done_state() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    let err = reg.list_build_artifacts(&record.build_id).unwrap_err();
    assert_eq!(err.code(), "not_ready");
}

#[test]
fn get_build_download_missing_artifact_not_found() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    reg.update_build(&record.build_id, |r| {
        r.state = BuildState::Done;
        r.progress = 100;
        r.result = Some(BuildResult {
            artifacts: vec![Artifact {
                id: "sysupgrade".into(),
                name: "a.bin".into(),
                path: "/nonexistent/a.bin".into(),
                size: 1,
                kind: ArtifactType::Firmware,
                role: ArtifactRole::Primary,
            }],
        });
    })
    .unwrap();
    let err = reg.get_build_download(&record.build_id, "sysupgrade").unwrap_err();
    assert_eq!(err.code(), "artifact_not_found");
}

#[test]
fn get_build_logs_truncates_to_limit() {
    let (_dir, reg) = registry();
    let (record, _) = reg.create_build(request()).unwrap();
    reg.update_build(&record.build_id, |r| {
        let mut logs = BuildLogs::default();
        logs.push_stdout(&"x".repeat(100));
        r.logs = Some(logs);
    })
    .unwrap();

    let view = reg.get_build_logs(&record.build_id, Some(10)).unwrap();
    assert_eq!(view.stdout.len(), 10);
    assert!(view.stdout_truncated);
    assert!(!view.stderr_truncated);
}

#[test]
fn list_builds_skips_malformed_files() {
    let (dir, reg) = registry();
    let (_record, _) = reg.create_build(request()).unwrap();
    std::fs::write(dir.path().join("garbage.json"), b"not json").unwrap();
    let all = reg.list_builds().unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn create_build_rejects_invalid_token() {
    let (_dir, reg) = registry();
    let mut req = request();
    req.platform = "has spaces".into();
    let err = reg.create_build(req).unwrap_err();
    assert_eq!(err.code(), "invalid_request");
}

#[test]
fn create_build_rejects_empty_output_images() {
    let (_dir, reg) = registry();
    let mut req = request();
    req.options.output_images = vec![];
    let err = reg.create_build(req).unwrap_err();
    assert_eq!(err.code(), "invalid_request");
}

#[test]
fn create_build_rejects_duplicate_output_images() {
    let (_dir, reg) = registry();
    let mut req = request();
    req.options.output_images = vec![OutputImage::Sysupgrade, OutputImage::Sysupgrade];
    let err = reg.create_build(req).unwrap_err();
    assert_eq!(err.code(), "invalid_request");
}

#[test]
fn now_rfc3339_reflects_the_configured_clock() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::default();
    let reg = BuildRegistry::with_clock(dir.path(), profiles(), clock.clone());
    assert_eq!(reg.now_rfc3339(), clock.now_rfc3339());
    clock.advance_secs(5);
    assert_eq!(reg.now_rfc3339(), clock.now_rfc3339());
}
