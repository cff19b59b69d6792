// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress monitoring loop helpers (§4.5 "Progress monitoring loop"):
//! incremental log tailing by byte offset, and the 2-second progress
//! ticker capped at 92.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Maximum bytes read from a log file per poll (§4.5).
pub const CHUNK_CAP: usize = 8 * 1024;

/// How often the monitoring loop polls `cancel_requested` and log growth.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// How often progress is bumped while the build runs.
pub const PROGRESS_TICK: Duration = Duration::from_secs(2);

/// Progress ceiling while the child is still running; 93 is reserved for
/// "child just exited" and 95-99 for artifact collection.
pub const PROGRESS_BUILDING_CAP: u8 = 92;

/// Tracks how much of a log file has already been read, so repeated polls
/// only return newly appended bytes.
pub struct LogTailer {
    path: PathBuf,
    offset: u64,
}

impl LogTailer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    /// Reads up to [`CHUNK_CAP`] newly appended bytes, UTF-8 decoded with
    /// replacement. Returns `None` if nothing new is available.
    pub fn read_new(&mut self) -> std::io::Result<Option<String>> {
        let mut file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let len = file.metadata()?.len();
        if len <= self.offset {
            return Ok(None);
        }
        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = vec![0u8; CHUNK_CAP];
        let n = file.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);
        self.offset += n as u64;
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Bumps `progress` by 1 every [`PROGRESS_TICK`], capped at
/// [`PROGRESS_BUILDING_CAP`] (§4.5 step 3).
pub struct ProgressTicker {
    last_bump: Instant,
}

impl ProgressTicker {
    pub fn new(now: Instant) -> Self {
        Self { last_bump: now }
    }

    /// Returns the new progress value if a tick elapsed, else `None`.
    pub fn maybe_bump(&mut self, now: Instant, current: u8) -> Option<u8> {
        if current >= PROGRESS_BUILDING_CAP {
            return None;
        }
        if now.duration_since(self.last_bump) < PROGRESS_TICK {
            return None;
        }
        self.last_bump = now;
        Some((current + 1).min(PROGRESS_BUILDING_CAP))
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
