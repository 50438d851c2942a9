//! Property-based tests for the timeline serialization contract.

use buildmark::timeline::{EventTimeline, BOOTSTRAP_TIME, INSTANCE_TIME, START, STOP};
use proptest::prelude::*;

/// The serialized event map always carries the four fixed keys plus every
/// inserted named point, and nothing else.
#[test]
fn event_map_is_closed_over_fixed_keys_and_named_points() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &proptest::collection::vec(("[a-z]{1,8}", 0.0f64..1e9), 0..8),
            |points| {
                let mut timeline = EventTimeline::new();
                let mut names = std::collections::BTreeSet::new();
                for (name, at) in &points {
                    // Prefix keeps caller names disjoint from fixed keys.
                    let name = format!("p-{name}");
                    timeline.insert(name.clone(), *at);
                    names.insert(name);
                }

                let map = timeline.to_event_map();
                for key in [BOOTSTRAP_TIME, INSTANCE_TIME, START, STOP] {
                    prop_assert!(map.contains_key(key));
                }
                for name in &names {
                    prop_assert!(map.contains_key(name.as_str()));
                }
                prop_assert_eq!(map.len(), 4 + names.len());
                Ok(())
            },
        )
        .unwrap();
}

/// Written interval bounds come back out of the serialized map unchanged.
#[test]
fn interval_bounds_round_trip_through_the_event_map() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0.0f64..1e9, 0.0f64..1e9), |(start, stop)| {
            let mut timeline = EventTimeline::new();
            timeline.set_start(start);
            timeline.set_stop(stop);

            let map = timeline.to_event_map();
            prop_assert_eq!(map[START].as_f64(), Some(start));
            prop_assert_eq!(map[STOP].as_f64(), Some(stop));
            prop_assert!(timeline.bootstrap_time() <= timeline.instance_time());
            Ok(())
        })
        .unwrap();
}
