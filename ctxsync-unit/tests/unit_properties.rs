//! Property tests for unit timestamp invariants.

use ctxsync_types::{ManualClock, TimestampBehavior};
use ctxsync_unit::{SetOptions, StateUnit, UnitKind};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Advance(u64),
    Write(Option<TimestampBehavior>),
    Read,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..1_000).prop_map(Op::Advance),
        prop_oneof![
            Just(None),
            Just(Some(TimestampBehavior::Update)),
            Just(Some(TimestampBehavior::Keep)),
            (0u64..100_000).prop_map(|ts| Some(TimestampBehavior::Explicit(ts))),
        ]
        .prop_map(Op::Write),
        Just(Op::Read),
    ]
}

proptest! {
    #[test]
    fn created_never_exceeds_modified(ops in prop::collection::vec(op_strategy(), 0..64)) {
        let clock = ManualClock::new(5_000);
        let mut unit = StateUnit::builder(UnitKind::Property)
            .value(json!(0))
            .clock(clock.clone())
            .build()
            .unwrap();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Advance(ms) => { clock.advance(ms); }
                Op::Write(behavior) => {
                    let opts = SetOptions { timestamp_behavior: behavior };
                    unit.set_value(json!(i).into(), opts).unwrap();
                }
                Op::Read => { unit.get(None).unwrap(); }
            }
            prop_assert!(unit.timestamp_created() <= unit.timestamp_modified());
        }
    }

    #[test]
    fn access_time_is_non_decreasing(steps in prop::collection::vec(0u64..500, 1..32)) {
        let clock = ManualClock::new(0);
        let mut unit = StateUnit::builder(UnitKind::Property)
            .clock(clock.clone())
            .build()
            .unwrap();
        let mut last = unit.timestamp_accessed();
        for step in steps {
            clock.advance(step);
            unit.get(None).unwrap();
            prop_assert!(unit.timestamp_accessed() >= last);
            last = unit.timestamp_accessed();
        }
    }
}
