// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! owb-runner: the build runner loop (C6) and single-runner lock (C7).
//!
//! Ties the durable registry (`owb_storage`) to the executor (`owb_engine`)
//! behind a single cooperative loop, under an exclusive process-wide lock.

pub mod env;
pub mod lock;
pub mod recovery;
pub mod runner;

pub use env::{EnvError, RunnerEnv};
pub use lock::RunnerLock;
pub use recovery::requeue_running_on_startup;
pub use runner::{run_forever, step, BuildExecutor, EngineExecutor, DEFAULT_POLL_INTERVAL};
