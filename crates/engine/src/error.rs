// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operational errors raised by the executor (§4.5, §7).
//!
//! Unlike `owb_core::ContractError`, these are not a closed, stable set:
//! [`ExecuteError::Failed`] carries the free-form classified message that
//! becomes the terminal record's `message` field directly (e.g.
//! `"no_space_left"`, `"make_failed:2"`). [`ExecuteError::Canceled`] is
//! cooperative cancellation, a first-class outcome rather than a failure
//! (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Cooperative cancellation observed mid-build; not a failure (§7).
    #[error("build canceled")]
    Canceled,

    /// A classified, machine-readable failure message (§4.5, §6 error table).
    #[error("{0}")]
    Failed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExecuteError {
    /// Shorthand for the common `unsupported_host_arch:<arch>:requires_x86_64` case.
    pub fn unsupported_host_arch(arch: &str) -> Self {
        ExecuteError::Failed(format!("unsupported_host_arch:{arch}:requires_x86_64"))
    }

    pub fn wrapper_makefile_missing() -> Self {
        ExecuteError::Failed("wrapper_makefile_missing".into())
    }

    pub fn selected_file_not_found(rel: &str) -> Self {
        ExecuteError::Failed(format!("selected_file_not_found:{rel}"))
    }

    pub fn requested_image_not_built(kind: &str) -> Self {
        ExecuteError::Failed(format!("requested_image_not_built:{kind}"))
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
