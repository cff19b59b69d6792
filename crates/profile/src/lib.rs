// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! owb-profile: the profile resolver (C4) and the profile/list collaborator
//! store it reads from.

pub mod collab;
pub mod resolve;

pub use collab::{ListStore, ProfileStore};
pub use resolve::{resolve_profile, ResolvedProfile};
