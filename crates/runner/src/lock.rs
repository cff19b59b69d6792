// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-runner lock (C7, §4.7): an exclusive, non-blocking advisory lock
//! that the OS releases automatically on process exit, so crash recovery
//! never has to clean it up by hand.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use owb_core::ContractError;

/// Holds the lock for the lifetime of the runner process. Dropping it
/// removes the PID marker file; the `flock` itself is released by the OS
/// when the underlying file descriptor closes.
pub struct RunnerLock {
    _file: std::fs::File,
    marker_path: PathBuf,
}

impl RunnerLock {
    /// Acquires the exclusive lock at `lock_path`. Writes the current PID
    /// both inside the lock file and into a sibling `.pid` marker file
    /// (`original_source/.../runner_lock.py` keeps both). A second
    /// acquisition attempt while the holder is alive fails
    /// [`ContractError::RunnerAlreadyRunning`].
    pub fn acquire(lock_path: &Path) -> Result<Self, ContractError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(lock_path)?;
        file.try_lock_exclusive()
            .map_err(|_| ContractError::RunnerAlreadyRunning)?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        let marker_path = marker_path(lock_path);
        std::fs::write(&marker_path, format!("{}\n", std::process::id()))?;

        Ok(Self {
            _file: file,
            marker_path,
        })
    }
}

impl Drop for RunnerLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.marker_path);
    }
}

fn marker_path(lock_path: &Path) -> PathBuf {
    let mut marker = lock_path.to_path_buf();
    let name = marker
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("runner.lock")
        .to_string();
    marker.set_file_name(format!("{name}.pid"));
    marker
}

/// Best-effort read of the PID recorded in an existing lock file, so the
/// binary can print a friendly "already running" message on failure.
pub fn read_holder_pid(lock_path: &Path) -> Option<u32> {
    std::fs::read_to_string(lock_path).ok()?.trim().parse().ok()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
