// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! owb-core: shared domain types for the OpenWrt build-orchestration service.
//!
//! Holds the build record and its nested types (§3), the profile/list
//! collaborator shapes (§6), ID newtypes, the `Clock` abstraction, and the
//! contract error enum. Has no knowledge of the filesystem, the queue, or
//! the executor — those live in `owb-storage`, `owb-profile`, and
//! `owb-engine`.

pub mod clock;
pub mod collab;
pub mod error;
pub mod id;
pub mod profile_lookup;
pub mod record;
pub mod time_fmt;
pub mod validate;

pub use clock::{Clock, FakeClock, SystemClock};
pub use collab::{ListBody, ListRecord, ProfileBody, ProfileRecord};
pub use error::ContractError;
pub use profile_lookup::ProfileLookup;
pub use id::{ArtifactId, BuildId, ListId, ProfileId, ShortId};
pub use record::{
    Artifact, ArtifactRole, ArtifactType, BuildLogs, BuildOptions, BuildRecord, BuildRequest,
    BuildResult, BuildState, OutputImage, Phase, PhaseEvent, DEFAULT_LOG_VIEW_LIMIT, LOG_TAIL_CAP,
    PHASE_EVENTS_CAP,
};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
