// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic JSON write-rename persistence primitive (C1).
//!
//! Contract: after any crash, a file written through [`write_json_atomic`]
//! either contains the previous complete value or the new complete value,
//! never a partial one. Implementation: write to a sibling temp file on the
//! same filesystem, `fsync` it, rename over the destination, then `fsync`
//! the containing directory so the rename itself is durable. Never truncate
//! in place.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtomicWriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Write `value` as pretty JSON to `path`, atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AtomicWriteError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp_path = sibling_tmp_path(path);
    let json = serde_json::to_vec_pretty(value)?;

    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(&json)?;
    tmp_file.sync_all()?;
    drop(tmp_file);

    std::fs::rename(&tmp_path, path)?;

    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

/// Reads and deserializes a JSON document, returning `Ok(None)` when the
/// file does not exist and `Err` for I/O or parse failures. Callers that
/// want "malformed = absent" semantics (§7) should map `Err` to `None`
/// explicitly at the call site rather than relying on this function to
/// swallow parse errors, since direct lookups must distinguish the two.
pub fn read_json<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, AtomicWriteError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn sibling_tmp_path(path: &Path) -> std::path::PathBuf {
    let file_name = path
        .file_name()
        .map(|n| format!("{}.tmp", n.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    path.with_file_name(file_name)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;
