//! Reference actions turning staged primaries into live lanes
//!
//! Two start-of-step actions bridge external event input and the lane
//! array: the first converts the staged primary batch into queued track
//! initializers, the second assigns queued initializers to vacant lanes.
//! Both are registered like any other action and rely only on the public
//! state interface, so a device pipeline can swap in kernel-backed
//! replacements under the same labels.

use std::sync::Arc;

use tracing::debug;

use crate::action::{Action, ActionRegistry, RegisteredAction, StepAction};
use crate::error::Result;
use crate::params::CoreParams;
use crate::space::MemorySpace;
use crate::state::CoreState;
use crate::types::{ActionId, ActionOrder, Primary, StepLimit, TrackInitializer, TrackRecord, TrackStatus};

/// Convert the staged primary batch into queued track initializers
pub struct ProcessPrimariesAction {
    id: ActionId,
}

impl ProcessPrimariesAction {
    pub fn new(id: ActionId) -> Self {
        Self { id }
    }
}

impl Action for ProcessPrimariesAction {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn label(&self) -> &str {
        "extend-from-primaries"
    }

    fn order(&self) -> ActionOrder {
        ActionOrder::Start
    }
}

impl<M: MemorySpace> StepAction<M> for ProcessPrimariesAction {
    fn execute(&self, _params: &CoreParams<M>, state: &mut CoreState<M>) -> Result<()> {
        let count = state.counters().num_primaries;
        if count == 0 {
            return Ok(());
        }

        let mut batch = vec![Primary::default(); count];
        state.copy_primaries_to_host(&mut batch)?;

        let initializers: Vec<TrackInitializer> =
            batch.into_iter().map(TrackInitializer::from).collect();
        state.extend_initializers(&initializers)?;
        state.counters_mut().num_primaries = 0;

        debug!(count, "converted primaries into initializers");
        Ok(())
    }
}

/// Assign queued initializers to vacant lanes
///
/// Fills `min(num_initializers, num_vacancies)` lanes: status flips to
/// alive, the identity record is written, and the step limit resets to
/// unassigned. Whatever does not fit stays queued for the next step; the
/// exposed counters let the caller detect exhaustion instead of the core
/// silently truncating.
pub struct InitializeTracksAction {
    id: ActionId,
}

impl InitializeTracksAction {
    pub fn new(id: ActionId) -> Self {
        Self { id }
    }
}

impl Action for InitializeTracksAction {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn label(&self) -> &str {
        "initialize-tracks"
    }

    fn order(&self) -> ActionOrder {
        ActionOrder::Start
    }
}

impl<M: MemorySpace> StepAction<M> for InitializeTracksAction {
    fn execute(&self, _params: &CoreParams<M>, state: &mut CoreState<M>) -> Result<()> {
        let counters = *state.counters();
        let count = counters.num_initializers.min(counters.num_vacancies);
        if count == 0 {
            return Ok(());
        }

        let initializers = state.pop_initializers(count);
        state.edit_lanes(|lanes| {
            let mut next = initializers.iter();
            for slot in 0..lanes.status.len() {
                if lanes.status[slot].is_alive() {
                    continue;
                }
                let Some(init) = next.next() else { break };
                lanes.status[slot] = TrackStatus::Alive;
                lanes.step_limit[slot] = StepLimit::default();
                lanes.records[slot] = TrackRecord {
                    track_id: init.track_id,
                    event_id: init.event_id,
                    energy: init.energy,
                    time: init.time,
                };
                lanes.counters.num_vacancies -= 1;
            }
        })?;

        debug!(count, queued = state.counters().num_initializers, "initialized tracks");
        Ok(())
    }
}

/// Register both reference actions, returning their ids in pipeline order
pub fn register_init_actions<M: MemorySpace>(
    registry: &mut ActionRegistry<M>,
) -> Result<(ActionId, ActionId)> {
    let process = registry.insert(RegisteredAction::Explicit(Arc::new(
        ProcessPrimariesAction::new(registry.next_id()),
    )))?;
    let initialize = registry.insert(RegisteredAction::Explicit(Arc::new(
        InitializeTracksAction::new(registry.next_id()),
    )))?;
    Ok((process, initialize))
}
