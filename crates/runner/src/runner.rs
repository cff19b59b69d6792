// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The C6 main loop: dequeue, drive state transitions, invoke the executor,
//! apply updates durably, honor cancellation (§4.6 "Main loop").

use std::time::Duration;

use owb_core::{
    BuildId, BuildRecord, BuildResult, BuildState, Clock, ContractError, Phase, PhaseEvent,
};
use owb_engine::{ExecuteError, ExecutorUpdate, OnUpdate};
use owb_storage::BuildRegistry;

/// Default poll interval between empty-queue checks (§4.6 step 1).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// The build-driving capability the loop needs from C5. Abstracted behind a
/// trait so tests can substitute a scripted fake instead of spawning a real
/// `make` subprocess.
pub trait BuildExecutor {
    fn execute(
        &self,
        build: &BuildRecord,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<BuildResult, ExecuteError>;
}

/// Real executor: wires the durable build record into [`owb_engine::execute`].
pub struct EngineExecutor {
    pub env: owb_engine::ExecutorEnv,
    pub profiles: owb_profile::ProfileStore,
    pub lists: owb_profile::ListStore,
}

impl BuildExecutor for EngineExecutor {
    fn execute(
        &self,
        build: &BuildRecord,
        on_update: &mut OnUpdate<'_>,
    ) -> Result<BuildResult, ExecuteError> {
        owb_engine::execute(build, &self.env, &self.profiles, &self.lists, on_update)
    }
}

/// Runs [`step`] forever, sleeping `poll_interval` whenever the queue was
/// empty. Intended for `owbd`'s `main`; tests drive `step` directly instead.
pub fn run_forever<C: Clock>(
    registry: &BuildRegistry<C>,
    executor: &dyn BuildExecutor,
    poll_interval: Duration,
) -> ! {
    loop {
        match step(registry, executor) {
            Ok(true) => {}
            Ok(false) => std::thread::sleep(poll_interval),
            Err(err) => {
                tracing::error!(error = %err, "runner loop iteration failed");
                std::thread::sleep(poll_interval);
            }
        }
    }
}

/// One iteration of the main loop (§4.6 steps 1-11). Returns `Ok(true)` if a
/// queue entry was dequeued (even if it turned out stale), `Ok(false)` if
/// the queue was empty.
pub fn step<C: Clock>(
    registry: &BuildRegistry<C>,
    executor: &dyn BuildExecutor,
) -> Result<bool, ContractError> {
    let Some(build_id) = registry.queue().dequeue()? else {
        return Ok(false);
    };

    let record = match registry.get_build(&build_id) {
        Ok(record) => record,
        Err(_) => return Ok(true), // missing or invalid: drop and continue
    };

    if record.state.is_terminal() || record.state != BuildState::Queued {
        return Ok(true); // stale queue entry
    }

    if record.cancel_requested {
        registry.update_build(&build_id, |r| {
            r.state = BuildState::Canceled;
            r.runner_pid = None;
            r.message = Some("canceled".into());
            r.phase = Some(Phase::Canceled);
        })?;
        return Ok(true);
    }

    let current_pid = std::process::id();
    let starting_at = registry.now_rfc3339();
    registry.update_build(&build_id, |r| {
        r.state = BuildState::Running;
        r.progress = 1;
        r.message = Some("starting".into());
        r.phase = Some(Phase::Starting);
        r.runner_pid = Some(current_pid);
        r.push_phase_event(PhaseEvent {
            at: starting_at.clone(),
            phase: Phase::Starting,
            progress: 1,
            message: Some("starting".into()),
        });
    })?;

    let preparing_at = registry.now_rfc3339();
    registry.update_build(&build_id, |r| {
        r.progress = 5;
        r.message = Some("preparing".into());
        r.phase = Some(Phase::Preparing);
        r.push_phase_event(PhaseEvent {
            at: preparing_at.clone(),
            phase: Phase::Preparing,
            progress: 5,
            message: Some("preparing".into()),
        });
    })?;

    // Re-read: a cancel may have arrived while we were transitioning.
    let record = registry.get_build(&build_id)?;
    if record.cancel_requested {
        transition_canceled(registry, &build_id)?;
        return Ok(true);
    }

    let mut on_update = make_on_update(registry, &build_id);
    let outcome = executor.execute(&record, &mut on_update);

    match outcome {
        Err(ExecuteError::Canceled) => {
            transition_canceled(registry, &build_id)?;
        }
        Err(other) => {
            let message = other.to_string();
            registry.update_build(&build_id, |r| {
                r.state = BuildState::Failed;
                r.message = Some(message.clone());
                r.phase = Some(Phase::Failed);
                r.runner_pid = None;
            })?;
        }
        Ok(result) => {
            let record = registry.get_build(&build_id)?;
            if record.cancel_requested {
                transition_canceled(registry, &build_id)?;
            } else {
                let done_at = registry.now_rfc3339();
                registry.update_build(&build_id, |r| {
                    r.state = BuildState::Done;
                    r.progress = 100;
                    r.message = Some("done".into());
                    r.phase = Some(Phase::Done);
                    r.result = Some(result.clone());
                    r.runner_pid = None;
                    r.push_phase_event(PhaseEvent {
                        at: done_at.clone(),
                        phase: Phase::Done,
                        progress: 100,
                        message: Some("done".into()),
                    });
                })?;
            }
        }
    }

    Ok(true)
}

fn transition_canceled<C: Clock>(
    registry: &BuildRegistry<C>,
    build_id: &BuildId,
) -> Result<BuildRecord, ContractError> {
    registry.update_build(build_id, |r| {
        r.state = BuildState::Canceled;
        r.message = Some("canceled".into());
        r.phase = Some(Phase::Canceled);
        r.runner_pid = None;
    })
}

/// Builds the `on_update` closure required by §4.6 step 8: every invocation
/// atomically re-reads the durable record, merges in whatever the executor
/// populated, and persists — so a concurrent cancel request from C3 is never
/// lost between polls.
fn make_on_update<'a, C: Clock>(
    registry: &'a BuildRegistry<C>,
    build_id: &'a BuildId,
) -> impl FnMut(ExecutorUpdate) -> bool + 'a {
    move |update: ExecutorUpdate| -> bool {
        let at = registry.now_rfc3339();
        let result = registry.update_build(build_id, |record| {
            if let Some(progress) = update.progress {
                record.progress = progress;
            }
            if let Some(phase) = update.phase {
                record.phase = Some(phase);
            }
            if let Some(message) = &update.message {
                record.message = Some(message.clone());
            }
            let logs = record.logs.get_or_insert_with(Default::default);
            if let Some(path) = &update.stdout_path {
                logs.stdout_path = Some(path.clone());
            }
            if let Some(path) = &update.stderr_path {
                logs.stderr_path = Some(path.clone());
            }
            if let Some(chunk) = &update.stdout_chunk {
                logs.push_stdout(chunk);
            }
            if let Some(chunk) = &update.stderr_chunk {
                logs.push_stderr(chunk);
            }
            if let Some(event) = &update.phase_event {
                let mut event = event.clone();
                if event.at.is_empty() {
                    event.at = at.clone();
                }
                record.push_phase_event(event);
            }
        });
        match result {
            Ok(record) => record.cancel_requested,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
