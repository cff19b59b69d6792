// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shapes of the profile/list collaborator records (§6). These are owned by
//! an external generic JSON registry; the core only reads them (C4) and,
//! for local seeding/testing, writes them via `owb_profile::collab`.

use serde::{Deserialize, Serialize};

use crate::id::{ListId, ProfileId};

/// `{profile: {...}}` (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile: ProfileBody,
    /// Present on records read back from storage; absent when constructing
    /// a new one prior to `create`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<ProfileId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBody {
    #[serde(default)]
    pub lists: Vec<ListId>,
    #[serde(default)]
    pub extra_include: Vec<String>,
    #[serde(default)]
    pub extra_exclude: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// `{list: {...}}` (§6).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub list: ListBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<ListId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBody {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[cfg(test)]
#[path = "collab_tests.rs"]
mod tests;
