//! Lane reordering between steps
//!
//! After a step, lanes have diverged: some died, some picked up different
//! pending actions. On SIMT hardware that divergence is paid for on every
//! subsequent instruction, so between steps the lane permutation is
//! rewritten to restore coherent execution groups. Only the rank→storage
//! index mapping moves; lane payload stays put and every action consults
//! the mapping.

mod order;

use std::fmt;

pub use order::{partition_status, sort_step_limit_action};

/// Reordering policy applied to the lane permutation between steps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TrackOrder {
    /// Leave the permutation as-is
    #[default]
    Unsorted,
    /// Group alive lanes ahead of dead/uninitialized ones
    PartitionStatus,
    /// Fully group lanes by their pending step-limit action
    SortStepLimitAction,
}

impl TrackOrder {
    /// Lowercase policy name
    pub const fn as_str(self) -> &'static str {
        match self {
            TrackOrder::Unsorted => "unsorted",
            TrackOrder::PartitionStatus => "partition-status",
            TrackOrder::SortStepLimitAction => "sort-step-limit-action",
        }
    }
}

impl fmt::Display for TrackOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
