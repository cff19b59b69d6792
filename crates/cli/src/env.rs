// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the `owb` CLI.
//!
//! Narrower than the runner's: the CLI never executes a build, so it only
//! needs the record roots, not the toolchain/workspace directories.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Resolved process configuration for `owb`, read once at startup.
#[derive(Debug, Clone)]
pub struct CliEnv {
    pub builds_dir: PathBuf,
    pub profiles_dir: PathBuf,
    pub lists_dir: PathBuf,
}

impl CliEnv {
    /// Reads the `OPENWRT_BUILDER_*` variable family, failing on the first
    /// unset one.
    pub fn load() -> Result<Self, EnvError> {
        Ok(Self {
            builds_dir: required("OPENWRT_BUILDER_BUILDS_DIR")?,
            profiles_dir: required("OPENWRT_BUILDER_PROFILES_DIR")?,
            lists_dir: required("OPENWRT_BUILDER_LISTS_DIR")?,
        })
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
