// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared validation and slugging helpers used by the registry and resolver.

use std::sync::LazyLock;

use regex::Regex;

/// `platform`/`target`/`subtarget`/`version`/`profile_id` token shape.
#[allow(clippy::expect_used)]
static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.+-]+$").expect("constant regex pattern is valid"));

/// Package name shape (§4.4).
#[allow(clippy::expect_used)]
static PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.+-]*$").expect("constant regex pattern is valid")
});

/// `platform`/`target`/`subtarget`/`version`/`profile_id` token shape.
pub fn is_valid_token(s: &str) -> bool {
    TOKEN_RE.is_match(s)
}

/// Package name shape (§4.4).
pub fn is_valid_package_name(s: &str) -> bool {
    PACKAGE_RE.is_match(s)
}

/// Normalizes and validates a relative file path: no `.`/`..`/empty/absolute
/// segments; backslashes are folded to forward slashes first.
pub fn normalize_rel_path(path: &str) -> Option<String> {
    let folded = path.replace('\\', "/");
    if folded.is_empty() || folded.starts_with('/') {
        return None;
    }
    let mut parts = Vec::new();
    for seg in folded.split('/') {
        if seg.is_empty() || seg == "." || seg == ".." {
            return None;
        }
        parts.push(seg);
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Converts a string to a URL-safe slug: lowercase, non-alphanumerics
/// collapsed to a single `-`, leading/trailing `-` trimmed.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_dash = false;
    for c in lowered.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_was_dash = false;
        } else if !last_was_dash {
            out.push('-');
            last_was_dash = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Deduplicates a sequence of `String`s preserving first occurrence.
pub fn dedup_preserve_order<I: IntoIterator<Item = String>>(items: I) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
