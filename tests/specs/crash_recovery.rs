//! Scenario 5 (spec §8): a build left `running` by a crashed runner is
//! requeued and re-executed by the next runner that starts up.

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
fn crashed_runner_running_build_is_requeued_and_rerun() {
    let harness = Harness::new(FakeMake::Succeeding);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (record, _created) = registry.create_build(request()).unwrap();

    // Simulate a crash: force the record into `running` with a stale PID,
    // as if a previous owbd process died mid-build, without ever starting
    // a runner that would otherwise dequeue and finish it.
    registry
        .update_build(&record.build_id, |r| {
            r.state = owb_core::BuildState::Running;
            r.runner_pid = Some(999_999);
        })
        .unwrap();
    registry.queue().remove(&record.build_id).unwrap();

    let mut runner = harness.spawn_runner();

    assert!(
        wait_for_state(&registry, &record.build_id, &["done"]),
        "recovered build should be re-executed to completion"
    );
    runner.kill();

    let final_record = registry.get_build(&record.build_id).unwrap();
    assert!(final_record.runner_pid.is_none());
}
