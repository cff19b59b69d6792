// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `owbd`: the build runner binary.
//!
//! Acquires the single-runner lock (C7), re-queues any build left `running`
//! by a crashed previous instance, then runs the C6 main loop forever.

use std::path::Path;
use std::sync::Arc;

use owb_engine::ExecutorEnv;
use owb_profile::{ListStore, ProfileStore};
use owb_runner::{
    lock, requeue_running_on_startup, run_forever, EngineExecutor, RunnerEnv, RunnerLock,
    DEFAULT_POLL_INTERVAL,
};
use owb_storage::BuildRegistry;
use tracing::{error, info};

fn main() {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("owbd {}", env!("CARGO_PKG_VERSION"));
                return;
            }
            "--help" | "-h" | "help" => {
                println!("owbd {}", env!("CARGO_PKG_VERSION"));
                println!("OpenWrt build runner. Dequeues and executes builds; run as a");
                println!("long-lived background process alongside the `owb` CLI.");
                return;
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: owbd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let env = match RunnerEnv::load() {
        Ok(env) => env,
        Err(err) => {
            eprintln!("owbd: {err}");
            std::process::exit(1);
        }
    };

    let log_path = env.runtime_dir.join("owbd.log");
    rotate_log_if_needed(&log_path);
    if let Err(err) = write_startup_marker(&log_path) {
        eprintln!("owbd: failed to write startup marker: {err}");
        std::process::exit(1);
    }
    let _log_guard = match setup_logging(&log_path) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("owbd: failed to set up logging: {err}");
            std::process::exit(1);
        }
    };

    info!("starting owbd");

    let lock_path = env.lock_path();
    let _lock = match RunnerLock::acquire(&lock_path) {
        Ok(lock) => lock,
        Err(owb_core::ContractError::RunnerAlreadyRunning) => {
            eprintln!("owbd is already running");
            if let Some(pid) = lock::read_holder_pid(&lock_path) {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(err) => {
            error!(error = %err, "failed to acquire runner lock");
            std::process::exit(1);
        }
    };

    let profiles = ProfileStore::new(&env.profiles_dir);
    let lists = ListStore::new(&env.lists_dir);
    let registry = BuildRegistry::new(
        &env.builds_dir,
        Arc::new(ProfileStore::new(&env.profiles_dir)),
    );

    match requeue_running_on_startup(&registry) {
        Ok(0) => {}
        Ok(n) => info!(count = n, "requeued builds left running by a previous crash"),
        Err(err) => error!(error = %err, "startup recovery failed"),
    }

    let executor_env = ExecutorEnv::new(
        &env.builds_dir,
        &env.files_dir,
        &env.cache_dir,
        &env.wrapper_dir,
    );
    let executor = EngineExecutor {
        env: executor_env,
        profiles,
        lists,
    };

    info!("entering main loop");
    run_forever(&registry, &executor, DEFAULT_POLL_INTERVAL);
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep (owbd.log.1, .2, .3).
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the runner log if it exceeds [`MAX_LOG_SIZE`]. Best-effort:
/// rotation failures are silently ignored so the runner still starts.
fn rotate_log_if_needed(log_path: &Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();
    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }
    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

const STARTUP_MARKER_PREFIX: &str = "--- owbd: starting (pid: ";

fn write_startup_marker(log_path: &Path) -> std::io::Result<()> {
    use std::io::Write;
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---\n", STARTUP_MARKER_PREFIX, std::process::id())
}

fn setup_logging(
    log_path: &Path,
) -> std::io::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let parent = log_path
        .parent()
        .ok_or_else(|| std::io::Error::other("log path has no parent directory"))?;
    std::fs::create_dir_all(parent)?;

    let file_name = log_path
        .file_name()
        .ok_or_else(|| std::io::Error::other("log path has no file name"))?;
    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
