//! Per-stream driving loop
//!
//! A [`Stepper`] ties one stream's state to the shared pipeline: each call
//! to [`step`](Stepper::step) reorders the lane permutation per the
//! configured policy, then executes every pipeline action once. Holding the
//! stepper by `&mut` is what guarantees at most one step is in flight per
//! stream; there is no reentrant stepping.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::action::{ActionSequence, SequenceOptions};
use crate::error::Result;
use crate::params::CoreParams;
use crate::space::MemorySpace;
use crate::state::CoreState;
use crate::types::{Primary, StreamId};

/// Input for building a [`Stepper`]
pub struct StepperInput<M: MemorySpace> {
    /// Shared process-wide configuration
    pub params: Arc<CoreParams<M>>,
    /// Stream this stepper drives
    pub stream_id: StreamId,
    /// Fixed lane capacity for the stream's state
    pub num_track_slots: usize,
    /// Sequence execution options
    pub options: SequenceOptions,
}

/// Occupancy snapshot returned after each step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepCount {
    /// Lanes carrying a live track
    pub alive: usize,
    /// Vacant lanes
    pub vacancies: usize,
    /// Initializers queued for future steps
    pub queued: usize,
    /// Primaries staged but not yet converted
    pub pending_primaries: usize,
}

/// Drives one stream through simulation steps
pub struct Stepper<M: MemorySpace> {
    params: Arc<CoreParams<M>>,
    sequence: ActionSequence<M>,
    state: CoreState<M>,
}

impl<M: MemorySpace> Stepper<M> {
    /// Build the pipeline and allocate the stream's state
    pub fn new(input: StepperInput<M>) -> Result<Self> {
        let sequence = ActionSequence::new(input.params.registry(), input.options)?;
        let state = CoreState::new(&input.params, input.stream_id, input.num_track_slots)?;
        Ok(Self {
            params: input.params,
            sequence,
            state,
        })
    }

    /// Take one step: reorder, then run the whole pipeline
    pub fn step(&mut self) -> Result<StepCount> {
        self.state.reorder(self.params.track_order())?;
        self.sequence.execute(&self.params, &mut self.state)?;

        let count = self.count();
        debug!(
            stream = %self.state.stream_id(),
            alive = count.alive,
            vacancies = count.vacancies,
            queued = count.queued,
            "step complete"
        );
        Ok(count)
    }

    /// Stage a primary batch, then take one step
    pub fn step_with_primaries(&mut self, primaries: &[Primary]) -> Result<StepCount> {
        self.state.insert_primaries(primaries)?;
        self.step()
    }

    /// Current occupancy, derived from the state's counters
    pub fn count(&self) -> StepCount {
        let counters = self.state.counters();
        StepCount {
            alive: self.state.size() - counters.num_vacancies,
            vacancies: counters.num_vacancies,
            queued: counters.num_initializers,
            pending_primaries: counters.num_primaries,
        }
    }

    /// Shared configuration
    pub fn params(&self) -> &Arc<CoreParams<M>> {
        &self.params
    }

    /// The pipeline driving this stream
    pub fn sequence(&self) -> &ActionSequence<M> {
        &self.sequence
    }

    /// The stream's state
    pub fn state(&self) -> &CoreState<M> {
        &self.state
    }

    /// Mutable access to the stream's state between steps
    pub fn state_mut(&mut self) -> &mut CoreState<M> {
        &mut self.state
    }
}
