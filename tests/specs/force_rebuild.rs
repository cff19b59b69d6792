//! Scenario 2 (spec §8): `force_rebuild = true` always creates an
//! independent build, even for an otherwise-identical request.

use owb_core::{BuildOptions, BuildRequest};

use crate::prelude::*;

fn request(force_rebuild: bool) -> BuildRequest {
    BuildRequest {
        profile_id: "home-ap".into(),
        platform: "tl-wdr4300".into(),
        target: "ath79".into(),
        subtarget: "generic".into(),
        version: "23.05.4".into(),
        options: BuildOptions {
            force_rebuild,
            ..BuildOptions::default()
        },
    }
}

#[test]
fn force_rebuild_creates_an_independent_build() {
    let harness = Harness::new(FakeMake::Succeeding);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (first, created) = registry.create_build(request(false)).unwrap();
    assert!(created);

    let mut runner = harness.spawn_runner();
    assert!(wait_for_state(&registry, &first.build_id, &["done"]));
    runner.kill();

    let (second, created_again) = registry.create_build(request(true)).unwrap();
    assert!(created_again, "force_rebuild should bypass the dedup cache");
    assert_ne!(second.build_id, first.build_id);

    // The new build is independently queued, not a shared state with the first.
    let queued = registry.queue().dequeue().unwrap();
    assert_eq!(queued.as_ref(), Some(&second.build_id));
}
