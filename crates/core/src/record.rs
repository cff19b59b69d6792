// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The build record and its nested types (§3).

use serde::{Deserialize, Serialize};

use crate::id::BuildId;

/// `R.state` (§3). `{done, failed, canceled}` is the terminal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Queued,
    Running,
    Done,
    Failed,
    Canceled,
}

impl BuildState {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildState::Done | BuildState::Failed | BuildState::Canceled)
    }
}

/// Step label recorded on the build and in each `phase_events` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Queued,
    Starting,
    Validating,
    ResolvingProfile,
    Preparing,
    Building,
    CollectingArtifacts,
    Finalizing,
    Done,
    Failed,
    Canceled,
}

/// One entry of the append-only, 64-capped `phase_events` history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    pub at: String,
    pub phase: Phase,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Maximum number of retained `phase_events` entries (§3).
pub const PHASE_EVENTS_CAP: usize = 64;

/// Maximum number of characters retained in each log tail (§3).
pub const LOG_TAIL_CAP: usize = 32_000;

/// Default `limit` for `get_build_logs` (§4.3).
pub const DEFAULT_LOG_VIEW_LIMIT: usize = 20_000;

/// `R.logs` (§3): bounded tails plus the paths of the full log files on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildLogs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_path: Option<String>,
    #[serde(default)]
    pub stdout_tail: String,
    #[serde(default)]
    pub stderr_tail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl BuildLogs {
    /// Appends to a tail, keeping only the last [`LOG_TAIL_CAP`] characters.
    pub fn push_stdout(&mut self, chunk: &str) {
        push_capped(&mut self.stdout_tail, chunk);
    }

    /// Appends to a tail, keeping only the last [`LOG_TAIL_CAP`] characters.
    pub fn push_stderr(&mut self, chunk: &str) {
        push_capped(&mut self.stderr_tail, chunk);
    }
}

fn push_capped(tail: &mut String, chunk: &str) {
    tail.push_str(chunk);
    if tail.chars().count() > LOG_TAIL_CAP {
        let drop = tail.chars().count() - LOG_TAIL_CAP;
        let byte_idx = tail
            .char_indices()
            .nth(drop)
            .map(|(i, _)| i)
            .unwrap_or(tail.len());
        tail.drain(..byte_idx);
    }
}

/// Kind of artifact produced by a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Firmware,
    Metadata,
}

/// Role of an artifact within `result.artifacts`; exactly one must be `Primary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactRole {
    Primary,
    Optional,
    Checksum,
    Manifest,
}

/// One produced file, as recorded under `result.artifacts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub kind: ArtifactType,
    pub role: ArtifactRole,
}

/// `R.result`: present iff `state = done`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResult {
    pub artifacts: Vec<Artifact>,
}

impl BuildResult {
    /// `len(artifacts) >= 1` and exactly one `role = primary` (§3 invariant).
    pub fn is_well_formed(&self) -> bool {
        !self.artifacts.is_empty()
            && self
                .artifacts
                .iter()
                .filter(|a| a.role == ArtifactRole::Primary)
                .count()
                == 1
    }
}

fn default_output_images() -> Vec<OutputImage> {
    vec![OutputImage::Sysupgrade]
}

/// `sysupgrade` or `factory` image kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputImage {
    Sysupgrade,
    Factory,
}

impl OutputImage {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputImage::Sysupgrade => "sysupgrade",
            OutputImage::Factory => "factory",
        }
    }
}

/// `request.options` (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOptions {
    #[serde(default)]
    pub force_rebuild: bool,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_output_images")]
    pub output_images: Vec<OutputImage>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force_rebuild: false,
            debug: false,
            output_images: default_output_images(),
        }
    }
}

/// The original build request (§6), embedded verbatim in the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    pub profile_id: String,
    pub platform: String,
    pub target: String,
    pub subtarget: String,
    pub version: String,
    #[serde(default)]
    pub options: BuildOptions,
}

impl BuildRequest {
    /// A deep copy with `options.force_rebuild` forced to `false`, used as
    /// the cache-identity fingerprint (§4.3). `force_rebuild` itself is not
    /// part of cache identity.
    pub fn normalized_fingerprint(&self) -> BuildRequest {
        let mut copy = self.clone();
        copy.options.force_rebuild = false;
        copy
    }
}

/// One persisted build document (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    pub build_id: BuildId,
    pub state: BuildState,
    pub created_at: String,
    pub updated_at: String,
    pub progress: u8,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub phase: Option<Phase>,
    #[serde(default)]
    pub phase_events: Vec<PhaseEvent>,
    #[serde(default)]
    pub logs: Option<BuildLogs>,
    pub request: BuildRequest,
    #[serde(default)]
    pub result: Option<BuildResult>,
    #[serde(default)]
    pub cancel_requested: bool,
    #[serde(default)]
    pub runner_pid: Option<u32>,
}

impl BuildRecord {
    /// Appends a phase event, dropping the oldest entry if it would exceed
    /// [`PHASE_EVENTS_CAP`] (§4.6 step 8, §8 invariant 5).
    pub fn push_phase_event(&mut self, event: PhaseEvent) {
        self.phase_events.push(event);
        if self.phase_events.len() > PHASE_EVENTS_CAP {
            let drop = self.phase_events.len() - PHASE_EVENTS_CAP;
            self.phase_events.drain(..drop);
        }
    }

    /// Whether this record currently satisfies the invariants in §8 that are
    /// cheap to check in-process (used defensively by registry list/get).
    pub fn is_well_formed(&self) -> bool {
        if self.state == BuildState::Done {
            let Some(result) = &self.result else {
                return false;
            };
            if !result.is_well_formed() || self.progress != 100 {
                return false;
            }
        }
        if matches!(
            self.state,
            BuildState::Done | BuildState::Failed | BuildState::Canceled | BuildState::Queued
        ) && self.runner_pid.is_some()
        {
            return false;
        }
        self.phase_events.len() <= PHASE_EVENTS_CAP
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
