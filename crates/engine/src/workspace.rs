// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace preparation (§4.5 "Workspace preparation"): creates the
//! per-build directory tree, writes `config.mk`, and stages selected
//! rootfs files into `wrapper-config/files/`.

use std::io::Write;
use std::path::{Path, PathBuf};

use owb_core::BuildRequest;
use owb_profile::ResolvedProfile;

use crate::error::ExecuteError;

/// Paths making up a single build's on-disk workspace.
pub struct BuildWorkspace {
    /// `builds_dir/<build_id>/`
    pub build_dir: PathBuf,
    /// `builds_dir/<build_id>/logs/`
    pub logs_dir: PathBuf,
    /// `builds_dir/<build_id>/wrapper-config/`
    pub wrapper_config: PathBuf,
    /// `wrapper-config/.imgbuilder_builddir`
    pub builddir_hint_file: PathBuf,
}

impl BuildWorkspace {
    pub fn new(builds_dir: &Path, build_id: &str) -> Self {
        let build_dir = builds_dir.join(build_id);
        let wrapper_config = build_dir.join("wrapper-config");
        Self {
            logs_dir: build_dir.join("logs"),
            builddir_hint_file: wrapper_config.join(".imgbuilder_builddir"),
            wrapper_config,
            build_dir,
        }
    }

    pub fn stdout_log(&self) -> PathBuf {
        self.logs_dir.join("stdout.log")
    }

    pub fn stderr_log(&self) -> PathBuf {
        self.logs_dir.join("stderr.log")
    }
}

/// Creates the workspace directories, writes `config.mk`, and copies every
/// selected file from `files_dir` into `wrapper-config/files/`, preserving
/// its relative path. A missing source file fails
/// `selected_file_not_found:<rel>` (§4.5).
pub fn prepare(
    ws: &BuildWorkspace,
    files_dir: &Path,
    request: &BuildRequest,
    resolved: &ResolvedProfile,
) -> Result<(), ExecuteError> {
    std::fs::create_dir_all(&ws.build_dir)?;
    std::fs::create_dir_all(&ws.logs_dir)?;
    std::fs::create_dir_all(&ws.wrapper_config)?;

    write_config_mk(ws, request, resolved)?;

    if !resolved.selected_files.is_empty() {
        let dest_root = ws.wrapper_config.join("files");
        std::fs::create_dir_all(&dest_root)?;
        for rel in &resolved.selected_files {
            let src = files_dir.join(rel);
            if !src.is_file() {
                return Err(ExecuteError::selected_file_not_found(rel));
            }
            let dest = dest_root.join(rel);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&src, &dest)?;
        }
    }

    Ok(())
}

fn write_config_mk(
    ws: &BuildWorkspace,
    request: &BuildRequest,
    resolved: &ResolvedProfile,
) -> Result<(), ExecuteError> {
    let path = ws.wrapper_config.join("config.mk");
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "RELEASE={}", request.version)?;
    writeln!(file, "TARGET={}", request.target)?;
    writeln!(file, "SUBTARGET={}", request.subtarget)?;
    writeln!(file, "PLATFORM={}", request.platform)?;
    writeln!(file, "PACKAGES_INCLUDE={}", resolved.include.join(" "))?;
    writeln!(file, "PACKAGES_EXCLUDE={}", resolved.exclude.join(" "))?;
    Ok(())
}

/// Recursively removes the `wrapper-config/` workspace, best-effort (§4.5 "Cleanup").
pub fn remove_wrapper_config(ws: &BuildWorkspace) {
    let _ = std::fs::remove_dir_all(&ws.wrapper_config);
}

/// Reads the `.imgbuilder_builddir` hint file and, if it names a directory
/// whose basename starts with `imgbldr-`, recursively removes it (§4.5
/// "Cleanup"). Best-effort.
pub fn remove_builddir_hint(ws: &BuildWorkspace) {
    let Ok(contents) = std::fs::read_to_string(&ws.builddir_hint_file) else {
        return;
    };
    let dir = PathBuf::from(contents.trim());
    let is_imgbldr = dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("imgbldr-"));
    if is_imgbldr && dir.is_dir() {
        let _ = std::fs::remove_dir_all(&dir);
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
