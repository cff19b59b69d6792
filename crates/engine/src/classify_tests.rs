// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn no_space_left_wins_over_everything() {
    let msg = classify_failure("building...", "write error: No space left on device", 1);
    assert_eq!(msg, "no_space_left");
}

#[test]
fn image_too_big_captures_sizes() {
    let msg = classify_failure("", "Error: image is too big: 16777216 > 16252928", 1);
    assert_eq!(msg, "image_too_big:built=16777216:max=16252928");
}

#[test]
fn curl_failure_classified_as_download_failed() {
    let msg = classify_failure("", "curl: (6) Could not resolve host: downloads.openwrt.org", 1);
    assert_eq!(msg, "imagebuilder_download_failed");
}

#[test]
fn unknown_package_classified_as_conflict() {
    let msg = classify_failure("Unknown package 'xyz'", "", 1);
    assert_eq!(msg, "package_conflict_or_not_found");
}

#[test]
fn collected_errors_marker_classified_as_conflict() {
    let msg = classify_failure("", "opkg: Collected errors:\n * satisfy_dependencies_for", 1);
    assert_eq!(msg, "package_conflict_or_not_found");
}

#[test]
fn falls_back_to_stderr_tail_when_no_pattern_matches() {
    let msg = classify_failure("some stdout noise", "boom: unexpected linker failure", 2);
    assert_eq!(msg, "boom: unexpected linker failure");
}

#[test]
fn falls_back_to_stdout_tail_when_stderr_empty() {
    let msg = classify_failure("make: *** [target] Error 2", "   \n", 2);
    assert_eq!(msg, "make: *** [target] Error 2");
}

#[test]
fn falls_back_to_make_failed_when_both_logs_empty() {
    let msg = classify_failure("", "", 2);
    assert_eq!(msg, "make_failed:2");
}

#[test]
fn classification_window_keeps_only_trailing_characters() {
    let long_stderr = "x".repeat(4000) + "No space left on device";
    let msg = classify_failure("", &long_stderr, 1);
    assert_eq!(msg, "no_space_left");
}
