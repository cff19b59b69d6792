// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build invocation (§4.5 "Build invocation"): builds the `make` argv and
//! spawns it in its own process group so the whole tree can be terminated
//! with `killpg`.

use std::fs::File;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use owb_core::BuildRequest;
use tracing::debug;

use crate::workspace::BuildWorkspace;

/// Program invoked for the image build; overridable so tests can point at a
/// fake `make` script instead of the real toolchain.
pub const DEFAULT_MAKE_BIN: &str = "make";

/// Spawns the `make` invocation for `request` (§4.5). The child runs in its
/// own process group (`process_group(0)`), with stdout/stderr redirected to
/// `ws`'s log files (truncated at start) and `TMPDIR`/`TMP`/`TEMP` forced to
/// `/tmp`.
pub fn spawn_build(
    make_bin: &str,
    wrapper_dir: &Path,
    cache_dir: &Path,
    ws: &BuildWorkspace,
    request: &BuildRequest,
) -> std::io::Result<Child> {
    let stdout_file = File::create(ws.stdout_log())?;
    let stderr_file = File::create(ws.stderr_log())?;

    let images: Vec<&str> = request
        .options
        .output_images
        .iter()
        .map(|i| i.as_str())
        .collect();

    let mut cmd = Command::new(make_bin);
    cmd.arg(format!("-j{}", parallelism()))
        .arg(format!("C={}", ws.wrapper_config.display()))
        .arg(format!(
            "CACHE={}",
            cache_dir.join("imagebuilder").join(&request.version).display()
        ))
        .arg(format!(
            "BUILDDIR_HINT_FILE={}",
            ws.builddir_hint_file.display()
        ))
        .arg(format!("IMAGES={}", images.join(" ")));
    if request.options.debug {
        cmd.arg("V=s");
    }
    cmd.arg("image");

    debug!(
        make_bin,
        wrapper_dir = %wrapper_dir.display(),
        images = images.join(","),
        "spawning make invocation"
    );

    cmd.current_dir(wrapper_dir)
        .env("TMPDIR", "/tmp")
        .env("TMP", "/tmp")
        .env("TEMP", "/tmp")
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file));

    cmd.spawn()
}

fn parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
