// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup recovery (§9 "Startup recovery"): any build left `running` by a
//! crashed runner is reset to `queued` and re-enqueued so it actually runs
//! again.

use owb_core::{BuildId, BuildState, Clock, ContractError, Phase};
use owb_storage::BuildRegistry;

/// Resets every `running` record to `queued` and re-enqueues it. Scans the
/// builds directory with a raw, unsorted `read_dir` rather than
/// [`BuildRegistry::list_builds`] (which sorts by `updated_at`): co-recovered
/// builds only need FIFO order among themselves, not a global sort, and a
/// plain directory scan is what delivers exactly that.
pub fn requeue_running_on_startup<C: Clock>(
    registry: &BuildRegistry<C>,
) -> Result<usize, ContractError> {
    let mut requeued = 0;
    let builds_dir = registry.builds_dir();
    if !builds_dir.exists() {
        return Ok(0);
    }

    for entry in std::fs::read_dir(builds_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == "queue" {
            continue;
        }
        let build_id = BuildId::new(stem);

        let record = match registry.get_build(&build_id) {
            Ok(record) => record,
            Err(_) => continue,
        };
        if record.state != BuildState::Running {
            continue;
        }

        registry.update_build(&build_id, |record| {
            record.state = BuildState::Queued;
            record.progress = 0;
            record.message = Some("runner_restart_requeued".into());
            record.phase = Some(Phase::Queued);
            record.runner_pid = None;
        })?;
        registry.queue().enqueue(&build_id)?;
        requeued += 1;
    }

    Ok(requeued)
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
