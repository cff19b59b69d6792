// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent FIFO queue of pending build IDs (C2).
//!
//! Every operation takes a single exclusive inter-process advisory lock on a
//! sidecar `.lock` file for the duration of its read-modify-write cycle
//! (§4.2, §5). Malformed queue documents are treated as empty rather than
//! surfaced as errors, and get normalized on the next write.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use owb_core::BuildId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::atomic::{read_json, write_json_atomic, AtomicWriteError};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("write error: {0}")]
    Write(#[from] AtomicWriteError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct QueueDoc {
    items: Vec<BuildId>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Durable FIFO queue document at `builds_dir/queue.json`, guarded by a
/// sidecar `builds_dir/queue.json.lock`.
pub struct BuildQueue {
    doc_path: PathBuf,
    lock_path: PathBuf,
}

impl BuildQueue {
    pub fn new(builds_dir: impl Into<PathBuf>) -> Self {
        let builds_dir = builds_dir.into();
        Self {
            doc_path: builds_dir.join("queue.json"),
            lock_path: builds_dir.join("queue.json.lock"),
        }
    }

    /// Snapshot of pending build IDs in FIFO order.
    pub fn list(&self) -> Result<Vec<BuildId>, QueueError> {
        let _guard = self.lock()?;
        Ok(self.load()?.items)
    }

    /// Appends `build_id` if absent. Returns `false` if already present.
    pub fn enqueue(&self, build_id: &BuildId) -> Result<bool, QueueError> {
        let _guard = self.lock()?;
        let mut doc = self.load()?;
        if doc.items.contains(build_id) {
            return Ok(false);
        }
        doc.items.push(build_id.clone());
        self.save(&mut doc)?;
        debug!(build_id = %build_id, depth = doc.items.len(), "enqueued build");
        Ok(true)
    }

    /// Removes and returns the head of the queue, or `None` when empty.
    pub fn dequeue(&self) -> Result<Option<BuildId>, QueueError> {
        let _guard = self.lock()?;
        let mut doc = self.load()?;
        if doc.items.is_empty() {
            return Ok(None);
        }
        let head = doc.items.remove(0);
        self.save(&mut doc)?;
        debug!(build_id = %head, depth = doc.items.len(), "dequeued build");
        Ok(Some(head))
    }

    /// Removes any occurrence of `build_id`. Returns `true` if one was removed.
    pub fn remove(&self, build_id: &BuildId) -> Result<bool, QueueError> {
        let _guard = self.lock()?;
        let mut doc = self.load()?;
        let before = doc.items.len();
        doc.items.retain(|id| id != build_id);
        let removed = doc.items.len() != before;
        if removed {
            self.save(&mut doc)?;
            debug!(build_id = %build_id, "removed build from queue");
        }
        Ok(removed)
    }

    fn lock(&self) -> Result<QueueLockGuard, QueueError> {
        if let Some(parent) = self.lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(QueueLockGuard { file })
    }

    fn load(&self) -> Result<QueueDoc, QueueError> {
        Ok(read_json::<QueueDoc>(&self.doc_path)
            .unwrap_or(None)
            .unwrap_or_default())
    }

    fn save(&self, doc: &mut QueueDoc) -> Result<(), QueueError> {
        doc.updated_at = Some(crate::now_rfc3339());
        write_json_atomic(&self.doc_path, doc)?;
        Ok(())
    }
}

struct QueueLockGuard {
    file: std::fs::File,
}

impl Drop for QueueLockGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
