// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! owb-storage: durable persistence for the build orchestration service.
//!
//! C1 (atomic JSON write-rename), C2 (persistent FIFO queue), and C3 (the
//! build registry) live here. No subprocess or HTTP concerns.

pub mod atomic;
pub mod queue;
pub mod registry;

pub use atomic::{read_json, write_json_atomic, AtomicWriteError};
pub use queue::{BuildQueue, QueueError};
pub use registry::{BuildLogsView, BuildRegistry};

/// Current UTC timestamp, RFC3339 with a trailing `Z`, second precision.
/// Used for document-level metadata (e.g. the queue's `updated_at`) that
/// isn't part of any tested invariant and so doesn't need to run through an
/// injectable `Clock`.
pub fn now_rfc3339() -> String {
    use chrono::SecondsFormat;
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
