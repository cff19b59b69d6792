//! Scenario 4 (spec §8): cancelling a build ~1s into a slow (10s-class)
//! build terminates the child process group and leaves `result` null.

use std::time::{Duration, Instant};

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
fn cancel_while_running_terminates_the_build_promptly() {
    let harness = Harness::new(FakeMake::Slow);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (record, _created) = registry.create_build(request()).unwrap();
    let mut runner = harness.spawn_runner();

    assert!(
        wait_for_state(&registry, &record.build_id, &["running"]),
        "build should start running"
    );
    std::thread::sleep(Duration::from_secs(1));

    registry.cancel_build(&record.build_id).unwrap();

    let start = Instant::now();
    assert!(
        wait_for(SPEC_WAIT_MAX_MS, || {
            let rec = registry.get_build(&record.build_id).unwrap();
            format!("{:?}", rec.state).to_lowercase() == "canceled"
        }),
        "build should reach canceled"
    );
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "cancellation should be observed well within the poll loop's cadence"
    );

    let final_record = registry.get_build(&record.build_id).unwrap();
    assert!(final_record.result.is_none());
    assert!(final_record.runner_pid.is_none());

    runner.kill();
}
