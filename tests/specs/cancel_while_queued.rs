//! Scenario 3 (spec §8): cancelling a build before the runner dequeues it
//! transitions it straight to `canceled` and drops it from the queue.

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
fn cancel_before_dequeue_marks_canceled_and_empties_the_queue() {
    let harness = Harness::new(FakeMake::Succeeding);
    harness.seed_profile("home-ap");
    let registry = harness.registry();

    let (record, created) = registry.create_build(request()).unwrap();
    assert!(created);

    let changed = registry.cancel_build(&record.build_id).unwrap();
    assert!(changed);

    let after = registry.get_build(&record.build_id).unwrap();
    assert_eq!(format!("{:?}", after.state).to_lowercase(), "canceled");

    // The queue no longer yields this build id; a runner that starts now
    // either finds the queue empty or, if the stale id reappears, drops it
    // on sight without invoking the executor.
    assert!(registry.queue().dequeue().unwrap().is_none());

    let mut runner = harness.spawn_runner();
    std::thread::sleep(std::time::Duration::from_millis(300));
    runner.kill();
    let still = registry.get_build(&record.build_id).unwrap();
    assert_eq!(format!("{:?}", still.state).to_lowercase(), "canceled");
}
