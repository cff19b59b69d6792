// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! owb-engine: the ImageBuilder executor (C5).
//!
//! Turns a validated, queued [`owb_core::BuildRecord`] into concrete
//! artifacts by driving the external `make`-based image builder: workspace
//! preparation, subprocess spawn in its own process group, progress/log
//! monitoring, failure classification, artifact collection, and cleanup
//! (§4.5). Stateless between invocations aside from the files it produces.

mod classify;
mod error;
mod executor;
mod monitor;
mod spawn;
mod workspace;

pub use error::ExecuteError;
pub use executor::{execute, ExecutorEnv, ExecutorUpdate, OnUpdate};
