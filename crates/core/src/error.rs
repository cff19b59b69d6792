// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract errors raised by the registry and resolver.
//!
//! These map 1:1 onto the boundary error codes; operational (executor)
//! failures are a separate, free-form classified message rather than a
//! typed variant (see `owb_engine::error`).

use thiserror::Error;

/// Errors raised by build/profile/list operations that callers are expected
/// to map onto a stable machine-readable code.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("list not found: {0}")]
    ListNotFound(String),

    #[error("build not found: {0}")]
    BuildNotFound(String),

    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    #[error("build not ready: {0}")]
    NotReady(String),

    #[error("build is running: {0}")]
    Running(String),

    #[error("build already finished: {0}")]
    AlreadyFinished(String),

    #[error("runner already running")]
    RunnerAlreadyRunning,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid profile payload: {0}")]
    InvalidProfilePayload(String),

    #[error("invalid list payload: {0}")]
    InvalidListPayload(String),

    #[error("invalid package name: {0}")]
    InvalidPackageName(String),

    #[error("invalid file path: {0}")]
    InvalidFilePath(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// The stable machine-readable code surfaced at the boundary (§6).
    pub fn code(&self) -> &'static str {
        match self {
            ContractError::ProfileNotFound(_) => "profile_not_found",
            ContractError::ListNotFound(_) => "list_not_found",
            ContractError::BuildNotFound(_) => "build_not_found",
            ContractError::ArtifactNotFound(_) => "artifact_not_found",
            ContractError::NotReady(_) => "not_ready",
            ContractError::Running(_) => "build_running",
            ContractError::AlreadyFinished(_) => "already_finished",
            ContractError::RunnerAlreadyRunning => "runner_already_running",
            ContractError::InvalidRequest(_) => "invalid_request",
            ContractError::InvalidProfilePayload(_) => "invalid_request",
            ContractError::InvalidListPayload(_) => "invalid_request",
            ContractError::InvalidPackageName(_) => "invalid_request",
            ContractError::InvalidFilePath(_) => "invalid_request",
            ContractError::Io(_) => "invalid_request",
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
