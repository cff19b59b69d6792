//! Scenario 6 (spec §8): a `make` failure whose stderr names a missing
//! package is classified as `package_conflict_or_not_found`, not a generic
//! failure, and the offending line survives in the log tail.

use owb_core::{BuildOptions, BuildRequest};

use crate::prelude::*;

fn request() -> BuildRequest {
    BuildRequest {
        profile_id: "home-ap".into(),
        platform: "tl-wdr4300".into(),
        target: "ath79".into(),
        subtarget: "generic".into(),
        version: "23.05.4".into(),
        options: BuildOptions::default(),
    }
}

#[test]
fn unknown_package_failure_is_classified_and_logged() {
    let harness = Harness::new(FakeMake::Failing);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (record, _created) = registry.create_build(request()).unwrap();
    let mut runner = harness.spawn_runner();

    assert!(
        wait_for_state(&registry, &record.build_id, &["failed"]),
        "build should reach failed"
    );
    runner.kill();

    let final_record = registry.get_build(&record.build_id).unwrap();
    assert_eq!(final_record.message.as_deref(), Some("package_conflict_or_not_found"));

    let logs = registry.get_build_logs(&record.build_id, None).unwrap();
    assert!(
        logs.stderr.contains("Unknown package 'xyz'"),
        "stderr tail should retain the original diagnostic, got: {}",
        logs.stderr
    );
}
