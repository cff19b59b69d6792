//! Scenario 1 (spec §8): identical requests reuse a `done` build instead of
//! re-enqueuing.

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
fn second_identical_request_reuses_the_done_build() {
    let harness = Harness::new(FakeMake::Succeeding);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (first, created) = registry.create_build(request()).unwrap();
    assert!(created);

    let mut runner = harness.spawn_runner();
    assert!(
        wait_for_state(&registry, &first.build_id, &["done"]),
        "build should reach done, got {:?}",
        registry.get_build(&first.build_id).unwrap().state
    );
    runner.kill();

    let (second, created_again) = registry.create_build(request()).unwrap();
    assert!(!created_again, "identical request should not create a new build");
    assert_eq!(second.build_id, first.build_id);

    // No new queue entry: dequeue still yields nothing for this identity.
    assert!(registry.queue().dequeue().unwrap().is_none());
}
