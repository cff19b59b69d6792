// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure classification (§4.5 "Failure classification").
//!
//! On a non-zero `make` exit, the last ~3000 characters of stdout+stderr are
//! scanned against an ordered pattern list to produce a short,
//! machine-readable message. The first matching pattern wins; if none
//! match, the classification falls back to a trimmed stderr/stdout tail,
//! and finally to `make_failed:<returncode>`.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

/// How many trailing characters of each log are considered for classification.
const CLASSIFY_WINDOW: usize = 3000;

#[allow(clippy::expect_used)]
static NO_SPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"no space left on device")
        .case_insensitive(true)
        .build()
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static TOO_BIG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"is too big:\s*(\d+)\s*>\s*(\d+)").expect("constant regex pattern is valid")
});

const DOWNLOAD_MARKERS: &[&str] = &[
    "curl: (",
    "The requested URL returned error",
    "Failed to connect to",
    "Could not resolve host",
];

const PACKAGE_MARKERS: &[&str] = &[
    "Unknown package",
    "conflicts with",
    "check_data_file_clashes",
    "Collected errors",
];

/// Classifies a failed `make` invocation from its tail output (§4.5).
pub fn classify_failure(stdout: &str, stderr: &str, returncode: i32) -> String {
    let combined = format!("{}\n{}", tail(stderr), tail(stdout));

    if NO_SPACE_RE.is_match(&combined) {
        return "no_space_left".to_string();
    }
    if let Some(caps) = TOO_BIG_RE.captures(&combined) {
        let built = &caps[1];
        let max = &caps[2];
        return format!("image_too_big:built={built}:max={max}");
    }
    if DOWNLOAD_MARKERS.iter().any(|m| combined.contains(m)) {
        return "imagebuilder_download_failed".to_string();
    }
    if PACKAGE_MARKERS.iter().any(|m| combined.contains(m)) {
        return "package_conflict_or_not_found".to_string();
    }

    let stderr_tail = stderr.trim();
    if !stderr_tail.is_empty() {
        return tail(stderr_tail).to_string();
    }
    let stdout_tail = stdout.trim();
    if !stdout_tail.is_empty() {
        return tail(stdout_tail).to_string();
    }
    format!("make_failed:{returncode}")
}

fn tail(s: &str) -> &str {
    let total = s.chars().count();
    if total <= CLASSIFY_WINDOW {
        return s;
    }
    let skip = total - CLASSIFY_WINDOW;
    let byte_idx = s
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    &s[byte_idx..]
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
