// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Profile resolver (C4): composes a profile's referenced lists into an
//! effective include/exclude package set and selected-file list (§4.4).

use owb_core::{
    validate::{dedup_preserve_order, is_valid_package_name, normalize_rel_path},
    ContractError,
};

use crate::collab::{ListStore, ProfileStore};

/// Output of [`resolve_profile`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub selected_files: Vec<String>,
}

/// Loads `profile_id`, expands its `lists` plus `extra_include`/
/// `extra_exclude`/`files`, and deduplicates each set preserving first
/// occurrence. `include` and `exclude` are not reconciled against each
/// other (§4.4, §9): a package appearing in both is passed through as-is.
pub fn resolve_profile(
    profile_id: &str,
    profiles: &ProfileStore,
    lists: &ListStore,
) -> Result<ResolvedProfile, ContractError> {
    let profile = profiles.get(profile_id)?;

    let mut include = Vec::new();
    let mut exclude = Vec::new();
    let mut files = profile.profile.files.clone();

    for list_id in &profile.profile.lists {
        let list = lists.get(list_id.as_str())?;
        include.extend(list.list.include);
        exclude.extend(list.list.exclude);
    }
    include.extend(profile.profile.extra_include);
    exclude.extend(profile.profile.extra_exclude);

    let include = dedup_preserve_order(include);
    let exclude = dedup_preserve_order(exclude);
    files = dedup_preserve_order(std::mem::take(&mut files));

    for pkg in include.iter().chain(exclude.iter()) {
        if !is_valid_package_name(pkg) {
            return Err(ContractError::InvalidPackageName(pkg.clone()));
        }
    }

    let mut selected_files = Vec::with_capacity(files.len());
    for rel in &files {
        match normalize_rel_path(rel) {
            Some(normalized) => selected_files.push(normalized),
            None => return Err(ContractError::InvalidFilePath(rel.clone())),
        }
    }

    Ok(ResolvedProfile {
        include,
        exclude,
        selected_files,
    })
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
