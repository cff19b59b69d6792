// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-build record store (C3): create/dedup, list, read, update,
//! delete, artifact lookup, and log tail views.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use owb_core::{
    validate, Artifact, BuildId, BuildLogs, BuildOptions, BuildRecord, BuildRequest, BuildState,
    Clock, ContractError, Phase, ProfileLookup, SystemClock, DEFAULT_LOG_VIEW_LIMIT,
};

use tracing::{debug, info};

use crate::atomic::{read_json, write_json_atomic};
use crate::queue::{BuildQueue, QueueError};

impl From<QueueError> for ContractError {
    fn from(err: QueueError) -> Self {
        ContractError::Io(std::io::Error::other(err.to_string()))
    }
}

/// View returned by [`BuildRegistry::get_build_logs`] (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLogsView {
    pub build_id: BuildId,
    pub state: BuildState,
    pub phase: Option<Phase>,
    pub updated_at: String,
    pub stdout_path: Option<String>,
    pub stderr_path: Option<String>,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

pub struct BuildRegistry<C: Clock = SystemClock> {
    builds_dir: PathBuf,
    queue: BuildQueue,
    profiles: Arc<dyn ProfileLookup>,
    clock: C,
}

impl BuildRegistry<SystemClock> {
    pub fn new(builds_dir: impl Into<PathBuf>, profiles: Arc<dyn ProfileLookup>) -> Self {
        Self::with_clock(builds_dir, profiles, SystemClock)
    }
}

impl<C: Clock> BuildRegistry<C> {
    pub fn with_clock(builds_dir: impl Into<PathBuf>, profiles: Arc<dyn ProfileLookup>, clock: C) -> Self {
        let builds_dir = builds_dir.into();
        Self {
            queue: BuildQueue::new(&builds_dir),
            builds_dir,
            profiles,
            clock,
        }
    }

    pub fn builds_dir(&self) -> &Path {
        &self.builds_dir
    }

    /// The registry's own clock, so callers that need to stamp records with
    /// a timestamp consistent with `updated_at` (e.g. the runner's
    /// `phase_events`) don't need a second clock instance.
    pub fn now_rfc3339(&self) -> String {
        self.clock.now_rfc3339()
    }

    /// The artifact/log workspace directory for a build: `builds_dir/<build_id>/`.
    pub fn build_dir(&self, build_id: &BuildId) -> PathBuf {
        self.builds_dir.join(build_id.as_str())
    }

    fn record_path(&self, build_id: &BuildId) -> PathBuf {
        self.builds_dir.join(format!("{}.json", build_id.as_str()))
    }

    /// Validates and enqueues a new build, or returns the cached `done`
    /// record for an identical normalized request (§4.3).
    pub fn create_build(&self, request: BuildRequest) -> Result<(BuildRecord, bool), ContractError> {
        validate_request(&request)?;
        if !self.profiles.profile_exists(&request.profile_id) {
            return Err(ContractError::ProfileNotFound(request.profile_id.clone()));
        }

        if !request.options.force_rebuild {
            let fingerprint = request.normalized_fingerprint();
            for existing in self.list_builds()? {
                if existing.state == BuildState::Done
                    && existing.request.normalized_fingerprint() == fingerprint
                {
                    debug!(build_id = %existing.build_id, "reusing cached build for identical request");
                    return Ok((existing, false));
                }
            }
        }

        let now = self.clock.now_rfc3339();
        let build_id = self.generate_build_id(&request.profile_id, &now);
        let record = BuildRecord {
            build_id: build_id.clone(),
            state: BuildState::Queued,
            created_at: now.clone(),
            updated_at: now,
            progress: 0,
            message: None,
            phase: None,
            phase_events: Vec::new(),
            logs: None,
            request,
            result: None,
            cancel_requested: false,
            runner_pid: None,
        };
        self.persist(&record)?;
        self.queue.enqueue(&build_id)?;
        info!(build_id = %build_id, profile_id = %record.request.profile_id, "build queued");
        Ok((record, true))
    }

    fn generate_build_id(&self, profile_id: &str, created_at: &str) -> BuildId {
        let base = validate::slugify(&format!("{profile_id}-{created_at}"));
        let mut candidate = base.clone();
        let mut suffix = 1u32;
        while self.record_path(&BuildId::new(candidate.clone())).exists() {
            suffix += 1;
            candidate = format!("{base}-{suffix}");
        }
        BuildId::new(candidate)
    }

    /// All build records, sorted by `updated_at` ascending. Records that
    /// fail to parse or fail the in-process well-formedness check are
    /// skipped silently (§4.3, §7).
    pub fn list_builds(&self) -> Result<Vec<BuildRecord>, ContractError> {
        let mut records = Vec::new();
        if !self.builds_dir.exists() {
            return Ok(records);
        }
        for entry in std::fs::read_dir(&self.builds_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some("queue.json") {
                continue;
            }
            let Ok(Some(record)) = read_json::<BuildRecord>(&path) else {
                continue;
            };
            if !record.is_well_formed() {
                continue;
            }
            records.push(record);
        }
        records.sort_by(|a, b| a.updated_at.cmp(&b.updated_at));
        Ok(records)
    }

    pub fn get_build(&self, build_id: &BuildId) -> Result<BuildRecord, ContractError> {
        read_json::<BuildRecord>(&self.record_path(build_id))
            .ok()
            .flatten()
            .ok_or_else(|| ContractError::BuildNotFound(build_id.to_string()))
    }

    /// `queued|running → canceled`, or a no-op on an already-terminal build
    /// (§4.3).
    pub fn cancel_build(&self, build_id: &BuildId) -> Result<bool, ContractError> {
        let mut record = self.get_build(build_id)?;
        match record.state {
            BuildState::Done | BuildState::Failed | BuildState::Canceled => Ok(false),
            BuildState::Queued => {
                record.state = BuildState::Canceled;
                record.message = Some("canceled".into());
                record.updated_at = self.clock.now_rfc3339();
                self.persist(&record)?;
                self.queue.remove(build_id)?;
                info!(build_id = %build_id, "queued build canceled");
                Ok(true)
            }
            BuildState::Running => {
                record.cancel_requested = true;
                record.message = Some("cancel_requested".into());
                record.updated_at = self.clock.now_rfc3339();
                self.persist(&record)?;
                info!(build_id = %build_id, "cancel requested for running build");
                Ok(true)
            }
        }
    }

    /// Deletes a build record and best-effort cleans its artifacts. Fails
    /// `Running` if a cancel hasn't been awaited to completion yet (§4.3).
    pub fn delete_build(&self, build_id: &BuildId) -> Result<bool, ContractError> {
        let record = self.get_build(build_id)?;
        if record.state == BuildState::Running {
            return Err(ContractError::Running(build_id.to_string()));
        }

        let _ = self.queue.remove(build_id);

        if let Some(result) = &record.result {
            for artifact in &result.artifacts {
                let _ = std::fs::remove_file(&artifact.path);
            }
        }
        let artifact_dir = self.build_dir(build_id);
        if artifact_dir.is_dir() {
            let _ = std::fs::remove_dir_all(&artifact_dir);
        }

        std::fs::remove_file(self.record_path(build_id))?;
        info!(build_id = %build_id, "build record deleted");
        Ok(true)
    }

    pub fn list_build_artifacts(&self, build_id: &BuildId) -> Result<Vec<Artifact>, ContractError> {
        let record = self.get_build(build_id)?;
        if record.state != BuildState::Done {
            return Err(ContractError::NotReady(build_id.to_string()));
        }
        match record.result {
            Some(result) if !result.artifacts.is_empty() => Ok(result.artifacts),
            _ => Err(ContractError::ArtifactNotFound(build_id.to_string())),
        }
    }

    pub fn get_build_download(
        &self,
        build_id: &BuildId,
        artifact_id: &str,
    ) -> Result<PathBuf, ContractError> {
        let record = self.get_build(build_id)?;
        if record.state != BuildState::Done {
            return Err(ContractError::NotReady(build_id.to_string()));
        }
        let artifact = record
            .result
            .as_ref()
            .and_then(|r| r.artifacts.iter().find(|a| a.id == artifact_id))
            .ok_or_else(|| ContractError::ArtifactNotFound(artifact_id.to_string()))?;
        let path = PathBuf::from(&artifact.path);
        if !path.is_file() {
            return Err(ContractError::ArtifactNotFound(artifact_id.to_string()));
        }
        Ok(path)
    }

    pub fn get_build_logs(
        &self,
        build_id: &BuildId,
        limit: Option<usize>,
    ) -> Result<BuildLogsView, ContractError> {
        let record = self.get_build(build_id)?;
        let limit = limit.unwrap_or(DEFAULT_LOG_VIEW_LIMIT);
        let logs = record.logs.unwrap_or_default();
        let (stdout, stdout_truncated) = tail_chars(&logs.stdout_tail, limit);
        let (stderr, stderr_truncated) = tail_chars(&logs.stderr_tail, limit);
        Ok(BuildLogsView {
            build_id: record.build_id,
            state: record.state,
            phase: record.phase,
            updated_at: record.updated_at,
            stdout_path: logs.stdout_path,
            stderr_path: logs.stderr_path,
            stdout,
            stderr,
            stdout_truncated,
            stderr_truncated,
        })
    }

    /// Read-modify-write a build record: `f` mutates an in-memory copy,
    /// which is then persisted. `updated_at` is refreshed automatically
    /// unless `f` itself sets a new value (§4.3's "merges partial fields").
    pub fn update_build(
        &self,
        build_id: &BuildId,
        f: impl FnOnce(&mut BuildRecord),
    ) -> Result<BuildRecord, ContractError> {
        let mut record = self.get_build(build_id)?;
        let before = record.updated_at.clone();
        let state_before = record.state;
        f(&mut record);
        if record.updated_at == before {
            record.updated_at = self.clock.now_rfc3339();
        }
        self.persist(&record)?;
        if record.state != state_before {
            debug!(build_id = %build_id, from = ?state_before, to = ?record.state, "build state transition");
        }
        Ok(record)
    }

    /// Direct access to the queue this registry enqueues into, used by the
    /// runner to dequeue and by startup recovery to re-enqueue.
    pub fn queue(&self) -> &BuildQueue {
        &self.queue
    }

    fn persist(&self, record: &BuildRecord) -> Result<(), ContractError> {
        write_json_atomic(&self.record_path(&record.build_id), record)
            .map_err(|e| ContractError::Io(std::io::Error::other(e.to_string())))
    }
}

fn validate_request(request: &BuildRequest) -> Result<(), ContractError> {
    for (field, value) in [
        ("platform", &request.platform),
        ("target", &request.target),
        ("subtarget", &request.subtarget),
        ("version", &request.version),
    ] {
        if !validate::is_valid_token(value) {
            return Err(ContractError::InvalidRequest(format!("invalid {field}: {value}")));
        }
    }
    if request.profile_id.trim().is_empty() {
        return Err(ContractError::InvalidRequest("profile_id is required".into()));
    }
    validate_options(&request.options)
}

fn validate_options(options: &BuildOptions) -> Result<(), ContractError> {
    if options.output_images.is_empty() {
        return Err(ContractError::InvalidRequest(
            "options.output_images must be non-empty".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for image in &options.output_images {
        if !seen.insert(*image) {
            return Err(ContractError::InvalidRequest(
                "options.output_images must not contain duplicates".into(),
            ));
        }
    }
    Ok(())
}

/// Returns the last `limit` characters of `s` and whether truncation occurred.
fn tail_chars(s: &str, limit: usize) -> (String, bool) {
    let total = s.chars().count();
    if total <= limit {
        return (s.to_string(), false);
    }
    let skip = total - limit;
    (s.chars().skip(skip).collect(), true)
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
