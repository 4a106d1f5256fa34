//! Shared fixtures for stepping integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cascade_core::{
    register_init_actions, Action, ActionId, ActionOrder, ActionRegistry, CoreParams,
    CoreParamsInput, CoreState, EventId, Host, Primary, RegisteredAction, Result, SequenceOptions,
    StepAction, StepLimit, Stepper, StepperInput, StreamId, TrackId, TrackOrder,
};

/// Kills every alive lane whose track id is a multiple of `modulus`
pub struct KillTracksAction {
    id: ActionId,
    modulus: u32,
}

impl KillTracksAction {
    pub fn new(id: ActionId, modulus: u32) -> Self {
        Self { id, modulus }
    }
}

impl Action for KillTracksAction {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn label(&self) -> &str {
        "kill-every-nth"
    }

    fn order(&self) -> ActionOrder {
        ActionOrder::Along
    }
}

impl StepAction<Host> for KillTracksAction {
    fn execute(&self, _params: &CoreParams<Host>, state: &mut CoreState<Host>) -> Result<()> {
        let modulus = self.modulus;
        state.edit_lanes(|lanes| {
            for rank in 0..lanes.track_slots.len() {
                let slot = lanes.track_slots[rank];
                if lanes.status[slot.index()].is_alive()
                    && lanes.records[slot.index()].track_id.get() % modulus == 0
                {
                    lanes.kill(slot);
                }
            }
        })
    }
}

/// Writes a varying pending action into every alive lane's step limit
///
/// Rotates the choice each step so repeated sorting has fresh keys to
/// regroup, the way real physics reassigns limits between steps.
pub struct SelectStepLimitAction {
    id: ActionId,
    choices: Vec<ActionId>,
    step: AtomicUsize,
}

impl SelectStepLimitAction {
    pub fn new(id: ActionId, choices: Vec<ActionId>) -> Self {
        Self {
            id,
            choices,
            step: AtomicUsize::new(0),
        }
    }
}

impl Action for SelectStepLimitAction {
    fn action_id(&self) -> ActionId {
        self.id
    }

    fn label(&self) -> &str {
        "select-step-limit"
    }

    fn order(&self) -> ActionOrder {
        ActionOrder::Post
    }
}

impl StepAction<Host> for SelectStepLimitAction {
    fn execute(&self, _params: &CoreParams<Host>, state: &mut CoreState<Host>) -> Result<()> {
        let step = self.step.fetch_add(1, Ordering::Relaxed);
        let choices = &self.choices;
        state.edit_lanes(|lanes| {
            for slot in 0..lanes.status.len() {
                if lanes.status[slot].is_alive() {
                    let pick = (slot * 31 + step * 7) % choices.len();
                    lanes.step_limit[slot] = StepLimit {
                        action: choices[pick],
                        distance: 0.1 * (slot + 1) as f64,
                    };
                }
            }
        })
    }
}

/// 10 MeV primaries along +x, one event each
pub fn make_primaries(count: u32) -> Vec<Primary> {
    (0..count)
        .map(|i| Primary {
            track_id: TrackId::new(i),
            event_id: EventId::new(i),
            energy: 10_000.0,
            position: [-22.0, 0.0, 0.0],
            direction: [1.0, 0.0, 0.0],
            ..Primary::default()
        })
        .collect()
}

/// Full pipeline: init actions + kill + step-limit selection
pub fn make_stepper(track_order: TrackOrder, num_track_slots: usize) -> Stepper<Host> {
    let mut registry = ActionRegistry::new();
    register_init_actions(&mut registry).unwrap();
    registry
        .insert(RegisteredAction::Explicit(Arc::new(KillTracksAction::new(
            registry.next_id(),
            3,
        ))))
        .unwrap();
    let choices = vec![ActionId::new(0), ActionId::new(1), ActionId::new(2)];
    registry
        .insert(RegisteredAction::Explicit(Arc::new(SelectStepLimitAction::new(
            registry.next_id(),
            choices,
        ))))
        .unwrap();

    let params = Arc::new(
        CoreParams::new(CoreParamsInput {
            registry: Arc::new(registry),
            max_streams: 1,
            track_order,
            init_capacity: 4096,
        })
        .unwrap(),
    );

    Stepper::new(StepperInput {
        params,
        stream_id: StreamId::new(0),
        num_track_slots,
        options: SequenceOptions::default(),
    })
    .unwrap()
}

/// No alive lane may follow a non-alive lane
pub fn assert_partitioned(state: &CoreState<Host>) {
    let mut seen_dead = false;
    for slot in state.track_slots() {
        let alive = state.status()[slot.index()].is_alive();
        assert!(
            !(alive && seen_dead),
            "track slots are not partitioned by status"
        );
        seen_dead |= !alive;
    }
}

/// Pending action ids must be non-decreasing along the permutation
pub fn assert_sorted_by_action(state: &CoreState<Host>) {
    let ids: Vec<u32> = state
        .track_slots()
        .iter()
        .map(|slot| state.step_limit()[slot.index()].action.get())
        .collect();
    for pair in ids.windows(2) {
        assert!(pair[0] <= pair[1], "{} is larger than {}", pair[0], pair[1]);
    }
}

/// Occupancy invariant: vacancies plus alive lanes equals capacity
pub fn assert_counters_consistent(state: &CoreState<Host>) {
    let alive = state.status().iter().filter(|s| s.is_alive()).count();
    assert_eq!(
        state.counters().num_vacancies + alive,
        state.size(),
        "vacancy counter out of step with lane statuses"
    );
}
