//! Lane reordering across repeated steps
//!
//! The reorder happens at the start of each step, so after stepping the
//! permutation is stale again; each check below explicitly reorders first,
//! the same way the stepping loop does.

mod common;

use cascade_core::TrackOrder;
use common::{assert_partitioned, assert_sorted_by_action, make_primaries, make_stepper};

#[test]
fn host_is_partitioned() {
    cascade_tracing::init_for_tests();

    let mut stepper = make_stepper(TrackOrder::PartitionStatus, 128);
    let primaries = make_primaries(8);
    stepper.step_with_primaries(&primaries).unwrap();

    for _ in 0..10 {
        stepper.state_mut().reorder(TrackOrder::PartitionStatus).unwrap();
        assert_partitioned(stepper.state());
        stepper.step().unwrap();
    }

    // refill and keep going: reclaimed lanes must not break the invariant
    stepper.step_with_primaries(&primaries).unwrap();
    for _ in 0..10 {
        stepper.state_mut().reorder(TrackOrder::PartitionStatus).unwrap();
        assert_partitioned(stepper.state());
        stepper.step().unwrap();
    }
}

#[test]
fn host_is_sorted() {
    cascade_tracing::init_for_tests();

    let mut stepper = make_stepper(TrackOrder::SortStepLimitAction, 128);
    let primaries = make_primaries(8);
    stepper.step_with_primaries(&primaries).unwrap();

    // A step can change the step-limit action, so the sorting must be
    // redone after each step.
    for _ in 0..10 {
        stepper.state_mut().reorder(TrackOrder::SortStepLimitAction).unwrap();
        assert_sorted_by_action(stepper.state());
        stepper.step().unwrap();
    }

    stepper.step_with_primaries(&primaries).unwrap();
    for _ in 0..10 {
        stepper.state_mut().reorder(TrackOrder::SortStepLimitAction).unwrap();
        assert_sorted_by_action(stepper.state());
        stepper.step().unwrap();
    }
}

#[test]
fn reordering_preserves_permutation() {
    cascade_tracing::init_for_tests();

    let mut stepper = make_stepper(TrackOrder::PartitionStatus, 64);
    stepper.step_with_primaries(&make_primaries(32)).unwrap();

    for order in [TrackOrder::PartitionStatus, TrackOrder::SortStepLimitAction] {
        stepper.state_mut().reorder(order).unwrap();
        let mut slots: Vec<u32> = stepper
            .state()
            .track_slots()
            .iter()
            .map(|slot| slot.get())
            .collect();
        slots.sort_unstable();
        let expected: Vec<u32> = (0..64).collect();
        assert_eq!(slots, expected, "reordering must stay a permutation");
    }
}
