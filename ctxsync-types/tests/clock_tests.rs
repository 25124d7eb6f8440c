use ctxsync_types::{now_millis, Clock, ManualClock, SystemClock};
use proptest::prelude::*;

// ── SystemClock ──────────────────────────────────────────────────

#[test]
fn system_clock_tracks_wall_time() {
    let before = now_millis();
    let clock = SystemClock::new();
    let ts = clock.now_millis();
    assert!(ts >= before);
    assert!(ts > 0);
}

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let mut prev = clock.now_millis();
    for _ in 0..1000 {
        let next = clock.now_millis();
        assert!(next >= prev);
        prev = next;
    }
}

#[test]
fn shared_system_clock() {
    let clock = SystemClock::shared();
    assert!(clock.now_millis() > 0);
}

// ── ManualClock ──────────────────────────────────────────────────

#[test]
fn manual_clock_starts_at_given_time() {
    let clock = ManualClock::new(1_000);
    assert_eq!(clock.now_millis(), 1_000);
}

#[test]
fn manual_clock_default_is_zero() {
    assert_eq!(ManualClock::default().now_millis(), 0);
}

#[test]
fn manual_clock_set_and_advance() {
    let clock = ManualClock::new(10);
    clock.set(500);
    assert_eq!(clock.now_millis(), 500);
    assert_eq!(clock.advance(25), 525);
    assert_eq!(clock.now_millis(), 525);
}

#[test]
fn manual_clock_clones_share_time() {
    let a = ManualClock::new(0);
    let b = a.clone();
    a.advance(100);
    assert_eq!(b.now_millis(), 100);
}

proptest! {
    #[test]
    fn manual_clock_advance_accumulates(steps in prop::collection::vec(0u64..10_000, 0..50)) {
        let clock = ManualClock::new(0);
        let mut expected = 0u64;
        for step in steps {
            expected += step;
            prop_assert_eq!(clock.advance(step), expected);
        }
        prop_assert_eq!(clock.now_millis(), expected);
    }
}

// ── SharedClock ──────────────────────────────────────────────────

#[test]
fn shared_clock_reads_wrapped_clock() {
    let manual = ManualClock::new(1234);
    let shared = ctxsync_types::SharedClock::from(manual.clone());
    assert_eq!(shared.now_millis(), 1234);
    manual.advance(6);
    assert_eq!(shared.now_millis(), 1240);
}

#[test]
fn shared_clock_handles_compare_equal() {
    let a = ctxsync_types::SharedClock::system();
    let b = ctxsync_types::SharedClock::from(ManualClock::new(1));
    assert_eq!(a, b);
}
