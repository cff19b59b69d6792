// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level executor entry point (C5, §4.5): turns a validated build
//! record into artifacts by driving the external `make`-based toolchain.

use std::path::PathBuf;
use std::time::Instant;

use owb_core::{
    validate, Artifact, ArtifactRole, ArtifactType, BuildRecord, BuildResult, Phase, PhaseEvent,
};
use owb_profile::{resolve_profile, ListStore, ProfileStore};
use tracing::{info, warn};

use crate::classify::classify_failure;
use crate::error::ExecuteError;
use crate::monitor::{LogTailer, ProgressTicker, POLL_INTERVAL, PROGRESS_BUILDING_CAP};
use crate::spawn::{spawn_build, DEFAULT_MAKE_BIN};
use crate::workspace::{self, BuildWorkspace};

/// Environment the executor needs beyond the build record itself: the
/// directory roots named in §6 "Environment", plus an overridable `make`
/// binary so tests can point at a scripted fake toolchain.
#[derive(Debug, Clone)]
pub struct ExecutorEnv {
    pub builds_dir: PathBuf,
    pub files_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub wrapper_dir: PathBuf,
    pub make_bin: String,
}

impl ExecutorEnv {
    pub fn new(
        builds_dir: impl Into<PathBuf>,
        files_dir: impl Into<PathBuf>,
        cache_dir: impl Into<PathBuf>,
        wrapper_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            builds_dir: builds_dir.into(),
            files_dir: files_dir.into(),
            cache_dir: cache_dir.into(),
            wrapper_dir: wrapper_dir.into(),
            make_bin: DEFAULT_MAKE_BIN.to_string(),
        }
    }

    pub fn with_make_bin(mut self, make_bin: impl Into<String>) -> Self {
        self.make_bin = make_bin.into();
        self
    }
}

/// One progress update emitted to the runner's `on_update` sink (§4.5, §4.6
/// point 8). Populated fields are merged onto the durable record; absent
/// fields are left unchanged. Invoked on every ~200ms poll tick so the
/// runner can also observe `cancel_requested` promptly, even on ticks where
/// nothing else changed.
#[derive(Debug, Clone, Default)]
pub struct ExecutorUpdate {
    pub progress: Option<u8>,
    pub phase: Option<Phase>,
    pub message: Option<String>,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
    pub stdout_chunk: Option<String>,
    pub stderr_chunk: Option<String>,
    pub phase_event: Option<PhaseEvent>,
}

impl ExecutorUpdate {
    pub fn is_empty(&self) -> bool {
        self.progress.is_none()
            && self.phase.is_none()
            && self.message.is_none()
            && self.stdout_chunk.is_none()
            && self.stderr_chunk.is_none()
            && self.phase_event.is_none()
    }

    fn phase_only(phase: Phase, progress: u8, message: &str) -> Self {
        Self {
            progress: Some(progress),
            phase: Some(phase),
            message: Some(message.to_string()),
            phase_event: Some(PhaseEvent {
                at: String::new(), // stamped by the runner, which owns the clock
                phase,
                progress,
                message: Some(message.to_string()),
            }),
            ..Default::default()
        }
    }
}

/// `on_update` returns `true` once it observes `cancel_requested = true` on
/// the durable record (§4.6 point 8); the executor treats that as
/// [`ExecuteError::Canceled`] at the next poll boundary.
pub type OnUpdate<'a> = dyn FnMut(ExecutorUpdate) -> bool + 'a;

/// Drives a single build to completion (§4.5). Returns the produced
/// artifacts on success, or an [`ExecuteError`] — `Canceled` is cooperative
/// cancellation, not a failure; any other variant becomes the terminal
/// record's classified `message`.
pub fn execute(
    build: &BuildRecord,
    env: &ExecutorEnv,
    profiles: &ProfileStore,
    lists: &ListStore,
    on_update: &mut OnUpdate<'_>,
) -> Result<BuildResult, ExecuteError> {
    let request = &build.request;

    // --- Pre-execution validation (progress = 6, phase = "validating") ---
    validate_pre_execution(env, request)?;
    if on_update(ExecutorUpdate::phase_only(Phase::Validating, 6, "validating")) {
        return Err(ExecuteError::Canceled);
    }

    // --- Resolve profile (phase "resolving_profile", progress 12) ---
    let resolved = resolve_profile(&request.profile_id, profiles, lists).map_err(|e| {
        ExecuteError::Failed(format!("invalid_profile:{}", e.code()))
    })?;
    if on_update(ExecutorUpdate::phase_only(Phase::ResolvingProfile, 12, "resolving_profile")) {
        return Err(ExecuteError::Canceled);
    }

    // --- Workspace preparation (phase "preparing", progress 20) ---
    let ws = BuildWorkspace::new(&env.builds_dir, build.build_id.as_str());
    workspace::prepare(&ws, &env.files_dir, request, &resolved)?;
    if on_update(ExecutorUpdate::phase_only(Phase::Preparing, 20, "preparing")) {
        cleanup(&ws);
        return Err(ExecuteError::Canceled);
    }

    // --- Build invocation (phase "building", progress starts at 24) ---
    let result = run_build(&ws, env, request, on_update);

    // --- Cleanup (always) ---
    cleanup(&ws);

    result
}

fn validate_pre_execution(
    env: &ExecutorEnv,
    request: &owb_core::BuildRequest,
) -> Result<(), ExecuteError> {
    let arch = std::env::consts::ARCH;
    if arch != "x86_64" && arch != "amd64" {
        return Err(ExecuteError::unsupported_host_arch(arch));
    }
    for (field, value) in [
        ("version", request.version.as_str()),
        ("platform", request.platform.as_str()),
        ("target", request.target.as_str()),
        ("subtarget", request.subtarget.as_str()),
        ("profile_id", request.profile_id.as_str()),
    ] {
        if !validate::is_valid_token(value) {
            return Err(ExecuteError::Failed(format!("invalid_{field}:{value}")));
        }
    }
    if request.options.output_images.is_empty() {
        return Err(ExecuteError::Failed("invalid_output_images".into()));
    }
    if !env.wrapper_dir.join("Makefile").is_file() {
        return Err(ExecuteError::wrapper_makefile_missing());
    }
    Ok(())
}

fn run_build(
    ws: &BuildWorkspace,
    env: &ExecutorEnv,
    request: &owb_core::BuildRequest,
    on_update: &mut OnUpdate<'_>,
) -> Result<BuildResult, ExecuteError> {
    let mut child = spawn_build(&env.make_bin, &env.wrapper_dir, &env.cache_dir, ws, request)?;
    info!(build_dir = %ws.build_dir.display(), pid = child.id(), "make child spawned");

    let stdout_path = ws.stdout_log();
    let stderr_path = ws.stderr_log();
    let mut stdout_tailer = LogTailer::new(&stdout_path);
    let mut stderr_tailer = LogTailer::new(&stderr_path);
    let mut ticker = ProgressTicker::new(Instant::now());
    let mut progress: u8 = 24;

    if on_update(ExecutorUpdate {
        progress: Some(progress),
        phase: Some(Phase::Building),
        message: Some("building".into()),
        stdout_path: Some(stdout_path.display().to_string()),
        stderr_path: Some(stderr_path.display().to_string()),
        phase_event: Some(PhaseEvent {
            at: String::new(),
            phase: Phase::Building,
            progress,
            message: Some("building".into()),
        }),
        ..Default::default()
    }) {
        terminate_child(&mut child);
        return Err(ExecuteError::Canceled);
    }

    let status = loop {
        let wait = match child.try_wait() {
            Ok(wait) => wait,
            Err(e) => {
                terminate_child(&mut child);
                return Err(e.into());
            }
        };
        if let Some(status) = wait {
            break status;
        }

        let stdout_chunk = match stdout_tailer.read_new() {
            Ok(chunk) => chunk,
            Err(e) => {
                terminate_child(&mut child);
                return Err(e.into());
            }
        };
        let stderr_chunk = match stderr_tailer.read_new() {
            Ok(chunk) => chunk,
            Err(e) => {
                terminate_child(&mut child);
                return Err(e.into());
            }
        };
        let bumped = ticker.maybe_bump(Instant::now(), progress);
        if let Some(p) = bumped {
            progress = p;
        }

        let mut update = ExecutorUpdate::default();
        if stdout_chunk.is_some() || stderr_chunk.is_some() || bumped.is_some() {
            update.stdout_chunk = stdout_chunk;
            update.stderr_chunk = stderr_chunk;
            update.progress = bumped;
            update.phase = Some(Phase::Building);
            update.message = Some("building".into());
        }
        if on_update(update) {
            terminate_child(&mut child);
            return Err(ExecuteError::Canceled);
        }

        std::thread::sleep(POLL_INTERVAL);
    };

    // Drain any final chunk written right before exit.
    let stdout_chunk = stdout_tailer.read_new()?;
    let stderr_chunk = stderr_tailer.read_new()?;
    on_update(ExecutorUpdate {
        progress: Some(93),
        stdout_chunk,
        stderr_chunk,
        ..Default::default()
    });

    if !status.success() {
        let stdout_all = std::fs::read_to_string(&stdout_path).unwrap_or_default();
        let stderr_all = std::fs::read_to_string(&stderr_path).unwrap_or_default();
        let returncode = status.code().unwrap_or(-1);
        let message = classify_failure(&stdout_all, &stderr_all, returncode);
        warn!(returncode, message = %message, "make child exited unsuccessfully");
        on_update(ExecutorUpdate::phase_only(Phase::Failed, 93, &message));
        return Err(ExecuteError::Failed(message));
    }
    info!("make child exited successfully");

    debug_assert!(PROGRESS_BUILDING_CAP <= 92);

    // --- Artifact collection (phase "collecting_artifacts", progress 95->99) ---
    if on_update(ExecutorUpdate::phase_only(Phase::CollectingArtifacts, 95, "collecting_artifacts")) {
        return Err(ExecuteError::Canceled);
    }
    let artifacts = collect_artifacts(ws, request)?;

    on_update(ExecutorUpdate::phase_only(Phase::Finalizing, 99, "finalizing"));

    Ok(BuildResult { artifacts })
}

fn terminate_child(child: &mut std::process::Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pid = child.id();
    let pgid = Pid::from_raw(pid as i32);
    let _ = killpg(pgid, Signal::SIGTERM);
    std::thread::sleep(std::time::Duration::from_secs(5));
    if child.try_wait().ok().flatten().is_none() {
        warn!(pid, "make child still alive after SIGTERM grace, sending SIGKILL");
        let _ = killpg(pgid, Signal::SIGKILL);
    }
    let _ = child.wait();
}

fn cleanup(ws: &BuildWorkspace) {
    tracing::debug!(build_dir = %ws.build_dir.display(), "cleaning up build workspace");
    workspace::remove_builddir_hint(ws);
    workspace::remove_wrapper_config(ws);
}

fn collect_artifacts(
    ws: &BuildWorkspace,
    request: &owb_core::BuildRequest,
) -> Result<Vec<Artifact>, ExecuteError> {
    let mut artifacts = Vec::new();
    for image in &request.options.output_images {
        let kind = image.as_str();
        let name = format!(
            "openwrt-{}-{}-{}-{}-squashfs-{}.bin",
            request.version, request.target, request.subtarget, request.platform, kind
        );
        let src = ws.wrapper_config.join(&name);
        if !src.is_file() {
            return Err(ExecuteError::requested_image_not_built(kind));
        }
        let dest = ws.build_dir.join(&name);
        std::fs::copy(&src, &dest)?;
        let size = std::fs::metadata(&dest)?.len();
        artifacts.push(Artifact {
            id: kind.to_string(),
            name: name.clone(),
            path: dest.display().to_string(),
            size,
            kind: ArtifactType::Firmware,
            role: if kind == "sysupgrade" {
                ArtifactRole::Primary
            } else {
                ArtifactRole::Optional
            },
        });
    }
    if !artifacts.iter().any(|a| a.role == ArtifactRole::Primary) {
        if let Some(first) = artifacts.first_mut() {
            first.role = ArtifactRole::Primary;
        }
    }
    Ok(artifacts)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
