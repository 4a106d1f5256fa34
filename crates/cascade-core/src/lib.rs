//! Track-parallel stepping core
//!
//! This crate provides the scheduling and lane-management machinery of a
//! track-parallel transport simulation: thousands to millions of
//! independent tracks advance through discrete pipeline phases in
//! lockstep, on the host or on an accelerator.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ActionRegistry                       │
//! │        (all actions, dense ids, unique labels)           │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ explicit subset, sorted by (order, id)
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     ActionSequence                       │
//! │     execute(params, state): one step, every action       │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ per stream
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    CoreState<M>                          │
//! │  track_slots │ status │ step_limit │ records │ counters  │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ between steps
//!                       ▼
//!        partition_status / sort_step_limit_action
//! ```
//!
//! Lane reordering restores coherent execution groups after divergence:
//! partitioning keeps alive lanes contiguous, sorting groups lanes by the
//! action that will next touch them. Both permute the rank→storage index
//! mapping only; lane payload never moves.
//!
//! # Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cascade_core::{
//!     register_init_actions, ActionRegistry, CoreParams, CoreParamsInput, Primary,
//!     SequenceOptions, Stepper, StepperInput, StreamId, TrackOrder,
//! };
//!
//! # fn main() -> cascade_core::Result<()> {
//! let mut registry = ActionRegistry::<cascade_core::Host>::new();
//! register_init_actions(&mut registry)?;
//!
//! let params = Arc::new(CoreParams::new(CoreParamsInput {
//!     registry: Arc::new(registry),
//!     max_streams: 1,
//!     track_order: TrackOrder::PartitionStatus,
//!     init_capacity: 4096,
//! })?);
//!
//! let mut stepper = Stepper::new(StepperInput {
//!     params,
//!     stream_id: StreamId::new(0),
//!     num_track_slots: 128,
//!     options: SequenceOptions::default(),
//! })?;
//!
//! let primaries = vec![Primary::default(); 8];
//! let count = stepper.step_with_primaries(&primaries)?;
//! assert_eq!(count.alive, 8);
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod error;
pub mod init;
pub mod output;
pub mod params;
pub mod space;
pub mod state;
pub mod stepper;
pub mod track;
pub mod types;

// Re-export public API
pub use action::{
    Action, ActionRegistry, ActionSequence, ActionTimingOutput, RegisteredAction, SequenceOptions,
    StepAction,
};
pub use error::{Error, Result};
pub use init::{register_init_actions, InitializeTracksAction, ProcessPrimariesAction};
pub use output::{OutputCategory, OutputInterface, OutputManager};
pub use params::{CoreParams, CoreParamsInput};
pub use space::{Host, LaneValue, MemorySpace};
pub use state::{CoreState, LanesMut, StateDescriptor};
pub use stepper::{StepCount, Stepper, StepperInput};
pub use track::{partition_status, sort_step_limit_action, TrackOrder};
pub use types::{
    ActionId, ActionOrder, CoreStateCounters, EventId, ParticleId, Primary, StepLimit, StreamId,
    TrackId, TrackInitializer, TrackRecord, TrackSlotId, TrackStatus,
};

#[cfg(feature = "cuda")]
pub use space::{Device, DeviceBuffer};
