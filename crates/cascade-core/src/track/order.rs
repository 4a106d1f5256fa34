//! Pure reordering kernels over the lane permutation
//!
//! Both functions permute the rank→storage mapping in place, reading the
//! per-slot key arrays by storage index. Neither touches counters or lane
//! payload, and both are idempotent up to tie order when applied twice
//! without an intervening step.

use rayon::slice::ParallelSliceMut;

use crate::types::{StepLimit, TrackSlotId, TrackStatus};

/// Lane counts below this sort serially; above, rayon takes over
const PAR_SORT_THRESHOLD: usize = 4096;

/// Stably partition lane ranks so alive lanes precede all others
///
/// Alive lanes keep their relative order, as do the rest. No further order
/// is imposed within either group: the point is only that parallel
/// execution can retire the inactive suffix without per-lane branching.
pub fn partition_status(track_slots: &mut [TrackSlotId], status: &[TrackStatus]) {
    let mut reordered = Vec::with_capacity(track_slots.len());
    reordered.extend(
        track_slots
            .iter()
            .copied()
            .filter(|slot| status[slot.index()].is_alive()),
    );
    reordered.extend(
        track_slots
            .iter()
            .copied()
            .filter(|slot| !status[slot.index()].is_alive()),
    );
    track_slots.copy_from_slice(&reordered);
}

/// Sort lane ranks by ascending pending step-limit action id
///
/// Groups lanes by the action that will next touch them so each action can
/// be dispatched over one contiguous range. The sort is unstable: the
/// relative order within a tie group is unspecified and need not repeat
/// across calls.
pub fn sort_step_limit_action(track_slots: &mut [TrackSlotId], step_limit: &[StepLimit]) {
    if track_slots.len() >= PAR_SORT_THRESHOLD {
        track_slots.par_sort_unstable_by_key(|slot| step_limit[slot.index()].action);
    } else {
        track_slots.sort_unstable_by_key(|slot| step_limit[slot.index()].action);
    }
}
