// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the runner binary.
//!
//! Unlike the optional/fallback style used elsewhere, every path here is
//! required: a build runner with a silently-defaulted directory is the kind
//! of thing that corrupts state quietly, so `load()` fails fast and names
//! exactly which variable is missing (spec.md §6 "Environment").

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Resolved process configuration for `owbd`, read once at startup.
#[derive(Debug, Clone)]
pub struct RunnerEnv {
    pub builds_dir: PathBuf,
    pub files_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub wrapper_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub lists_dir: PathBuf,
    pub runtime_dir: PathBuf,
}

impl RunnerEnv {
    /// Reads the `OPENWRT_BUILDER_*` variable family, failing on the first
    /// unset one.
    pub fn load() -> Result<Self, EnvError> {
        Ok(Self {
            builds_dir: required("OPENWRT_BUILDER_BUILDS_DIR")?,
            files_dir: required("OPENWRT_BUILDER_FILES_DIR")?,
            cache_dir: required("OPENWRT_BUILDER_CACHE_DIR")?,
            wrapper_dir: required("OPENWRT_BUILDER_WRAPPER_DIR")?,
            profiles_dir: required("OPENWRT_BUILDER_PROFILES_DIR")?,
            lists_dir: required("OPENWRT_BUILDER_LISTS_DIR")?,
            runtime_dir: required("OPENWRT_BUILDER_RUNTIME_DIR")?,
        })
    }

    /// The single-runner lock file lives under the runtime directory (§4.7).
    pub fn lock_path(&self) -> PathBuf {
        self.runtime_dir.join("runner.lock")
    }
}

fn required(var: &'static str) -> Result<PathBuf, EnvError> {
    std::env::var(var)
        .map(PathBuf::from)
        .map_err(|_| EnvError::MissingVar(var))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
