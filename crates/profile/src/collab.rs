// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generic JSON-backed registry for the profile/list collaborators (§1, §6).
//!
//! This is ambient infrastructure: the core itself only *reads* profiles and
//! lists (C4), but a read-only collaborator with no way to create a fixture
//! would make the resolver untestable and leave the CLI with nothing to
//! seed. `ProfileStore`/`ListStore` implement the same `list/get/create/
//! delete` shape as the out-of-scope production registry.

use std::path::{Path, PathBuf};

use owb_core::{validate, ContractError, ListBody, ListRecord, ProfileBody, ProfileRecord};
use owb_storage::{read_json, write_json_atomic};
use tracing::info;

/// Read-mostly JSON store for profile records, rooted at `OPENWRT_BUILDER_PROFILES_DIR`.
pub struct ProfileStore {
    dir: PathBuf,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, profile_id: &str) -> PathBuf {
        self.dir.join(format!("{profile_id}.json"))
    }

    pub fn list(&self) -> Result<Vec<ProfileRecord>, ContractError> {
        list_records(&self.dir, |id, mut record: ProfileRecord| {
            record.profile_id = Some(owb_core::ProfileId::new(id));
            record
        })
    }

    pub fn get(&self, profile_id: &str) -> Result<ProfileRecord, ContractError> {
        let mut record: ProfileRecord = read_json(&self.path(profile_id))
            .map_err(|e| ContractError::Io(std::io::Error::other(e.to_string())))?
            .ok_or_else(|| ContractError::ProfileNotFound(profile_id.to_string()))?;
        record.profile_id = Some(owb_core::ProfileId::new(profile_id));
        Ok(record)
    }

    pub fn create(
        &self,
        profile_id: &str,
        body: ProfileBody,
        force: bool,
    ) -> Result<ProfileRecord, ContractError> {
        let id = validate_slug(profile_id)?;
        let path = self.path(&id);
        if path.exists() && !force {
            return Err(ContractError::InvalidRequest(format!("{id} already exists")));
        }
        let record = ProfileRecord {
            profile: body,
            profile_id: Some(owb_core::ProfileId::new(id.clone())),
            updated_at: Some(owb_storage::now_rfc3339()),
        };
        write_json_atomic(&path, &record)
            .map_err(|e| ContractError::Io(std::io::Error::other(e.to_string())))?;
        info!(profile_id = %id, "profile created");
        Ok(record)
    }

    pub fn delete(&self, profile_id: &str) -> Result<(), ContractError> {
        let path = self.path(profile_id);
        if !path.exists() {
            return Err(ContractError::ProfileNotFound(profile_id.to_string()));
        }
        std::fs::remove_file(path)?;
        info!(profile_id, "profile deleted");
        Ok(())
    }
}

impl owb_core::ProfileLookup for ProfileStore {
    fn profile_exists(&self, profile_id: &str) -> bool {
        self.get(profile_id).is_ok()
    }
}

/// Read-mostly JSON store for package-list records, rooted at `OPENWRT_BUILDER_LISTS_DIR`.
pub struct ListStore {
    dir: PathBuf,
}

impl ListStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, list_id: &str) -> PathBuf {
        self.dir.join(format!("{list_id}.json"))
    }

    pub fn list(&self) -> Result<Vec<ListRecord>, ContractError> {
        list_records(&self.dir, |id, mut record: ListRecord| {
            record.list_id = Some(owb_core::ListId::new(id));
            record
        })
    }

    pub fn get(&self, list_id: &str) -> Result<ListRecord, ContractError> {
        let mut record: ListRecord = read_json(&self.path(list_id))
            .map_err(|e| ContractError::Io(std::io::Error::other(e.to_string())))?
            .ok_or_else(|| ContractError::ListNotFound(list_id.to_string()))?;
        record.list_id = Some(owb_core::ListId::new(list_id));
        Ok(record)
    }

    pub fn create(&self, list_id: &str, body: ListBody, force: bool) -> Result<ListRecord, ContractError> {
        let id = validate_slug(list_id)?;
        let path = self.path(&id);
        if path.exists() && !force {
            return Err(ContractError::InvalidRequest(format!("{id} already exists")));
        }
        let record = ListRecord {
            list: body,
            list_id: Some(owb_core::ListId::new(id.clone())),
            updated_at: Some(owb_storage::now_rfc3339()),
        };
        write_json_atomic(&path, &record)
            .map_err(|e| ContractError::Io(std::io::Error::other(e.to_string())))?;
        info!(list_id = %id, "package list created");
        Ok(record)
    }

    pub fn delete(&self, list_id: &str) -> Result<(), ContractError> {
        let path = self.path(list_id);
        if !path.exists() {
            return Err(ContractError::ListNotFound(list_id.to_string()));
        }
        std::fs::remove_file(path)?;
        info!(list_id, "package list deleted");
        Ok(())
    }
}

fn validate_slug(id: &str) -> Result<String, ContractError> {
    let slug = validate::slugify(id);
    if slug.is_empty() {
        return Err(ContractError::InvalidRequest(format!("invalid id: {id}")));
    }
    Ok(slug)
}

fn list_records<T, F>(dir: &Path, attach_id: F) -> Result<Vec<T>, ContractError>
where
    T: serde::de::DeserializeOwned,
    F: Fn(String, T) -> T,
{
    let mut out = Vec::new();
    if !dir.exists() {
        return Ok(out);
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Ok(Some(record)) = read_json::<T>(&path) else {
            continue;
        };
        out.push(attach_id(stem.to_string(), record));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "collab_tests.rs"]
mod tests;
