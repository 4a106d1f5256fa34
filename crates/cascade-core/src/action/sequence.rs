//! Ordered per-step execution of the explicit action subset

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use super::{ActionRegistry, StepAction};
use crate::error::{Error, Result};
use crate::output::{OutputCategory, OutputInterface};
use crate::params::CoreParams;
use crate::space::MemorySpace;
use crate::state::CoreState;

/// Options controlling sequence execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceOptions {
    /// Synchronize the device after every action
    ///
    /// Guarantees no overlap between successive pipeline phases and makes
    /// per-action timing meaningful, at the cost of losing asynchronous
    /// pipelining. Host execution always times per action.
    pub sync: bool,
}

/// The ordered pipeline of directly executable actions
///
/// Derived once from the registry by keeping explicit entries and sorting
/// by `(order, id)` ascending: the pipeline phase is the primary key so
/// phases are respected regardless of registration order, and the id
/// breaks ties deterministically. The sequence is fixed after
/// construction; one call to [`execute`](Self::execute) is one simulation
/// step.
pub struct ActionSequence<M: MemorySpace> {
    actions: Vec<Arc<dyn StepAction<M>>>,
    accum_time: Arc<RwLock<Vec<Duration>>>,
    options: SequenceOptions,
}

impl<M: MemorySpace> ActionSequence<M> {
    /// Build the execution pipeline from a populated registry
    ///
    /// # Errors
    ///
    /// Fails with an invariant violation if the timing accumulators do not
    /// end up matching the retained actions one-to-one.
    pub fn new(registry: &ActionRegistry<M>, options: SequenceOptions) -> Result<Self> {
        let mut actions: Vec<Arc<dyn StepAction<M>>> = registry
            .iter()
            .filter_map(|entry| entry.explicit().cloned())
            .collect();

        // Primary key: pipeline phase; tie-break: registration id
        actions.sort_by_key(|action| (action.order(), action.action_id()));

        let accum_time = vec![Duration::ZERO; actions.len()];
        if accum_time.len() != actions.len() {
            return Err(Error::SequenceLengthMismatch {
                actions: actions.len(),
                timers: accum_time.len(),
            });
        }

        debug!(
            explicit = actions.len(),
            registered = registry.num_actions(),
            sync = options.sync,
            "built action sequence"
        );

        Ok(Self {
            actions,
            accum_time: Arc::new(RwLock::new(accum_time)),
            options,
        })
    }

    /// Number of actions executed per step
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Execution options
    pub fn options(&self) -> SequenceOptions {
        self.options
    }

    /// Labels in execution order
    pub fn labels(&self) -> Vec<String> {
        self.actions.iter().map(|a| a.label().to_string()).collect()
    }

    /// Iterate the pipeline in execution order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn StepAction<M>>> {
        self.actions.iter()
    }

    /// Snapshot of accumulated wall-clock time per action, execution order
    ///
    /// Only meaningful on the host or with [`SequenceOptions::sync`]; in
    /// asynchronous device mode the accumulators stay zero.
    pub fn accum_time(&self) -> Vec<Duration> {
        self.accum_time.read().clone()
    }

    /// Run one simulation step: every pipeline action, exactly once, in order
    ///
    /// On the host, or when `sync` is set, each action is individually
    /// timed and followed by a full device barrier so successive phases
    /// never overlap. Otherwise actions are issued back-to-back and the
    /// device's in-order queue preserves phase ordering.
    ///
    /// # Errors
    ///
    /// An action failure is propagated unmodified apart from attaching the
    /// originating action's label; the step is abandoned and the lane state
    /// must be considered invalid.
    #[tracing::instrument(skip_all, fields(space = M::LABEL))]
    pub fn execute(&self, params: &CoreParams<M>, state: &mut CoreState<M>) -> Result<()> {
        if !M::IS_DEVICE || self.options.sync {
            // Execute all actions and record the time elapsed
            let mut accum_time = self.accum_time.write();
            for (accum, action) in accum_time.iter_mut().zip(&self.actions) {
                let start = Instant::now();
                action
                    .execute(params, state)
                    .map_err(|err| Error::execution(action.label(), err))?;
                if M::IS_DEVICE {
                    M::synchronize()?;
                }
                *accum += start.elapsed();
            }
        } else {
            // Just issue the actions back-to-back
            for action in &self.actions {
                action
                    .execute(params, state)
                    .map_err(|err| Error::execution(action.label(), err))?;
            }
        }
        Ok(())
    }

    /// Pull-based output block reporting accumulated timing per label
    pub fn timing_output(&self) -> ActionTimingOutput {
        ActionTimingOutput {
            labels: self.labels(),
            accum_time: Arc::clone(&self.accum_time),
        }
    }
}

/// Output block exposing per-action accumulated time, keyed by label
///
/// Holds a shared handle to the sequence's accumulators, so a block
/// registered at setup reports whatever has accrued by the time output is
/// pulled.
pub struct ActionTimingOutput {
    labels: Vec<String>,
    accum_time: Arc<RwLock<Vec<Duration>>>,
}

impl OutputInterface for ActionTimingOutput {
    fn category(&self) -> OutputCategory {
        OutputCategory::Result
    }

    fn label(&self) -> &str {
        "actions"
    }

    fn output(&self) -> serde_json::Value {
        let times = self.accum_time.read();
        let mut map = serde_json::Map::new();
        for (label, time) in self.labels.iter().zip(times.iter()) {
            map.insert(label.clone(), time.as_secs_f64().into());
        }
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, RegisteredAction};
    use crate::space::Host;
    use crate::state::testing::host_state_fixture;
    use crate::types::{ActionId, ActionOrder};

    /// Explicit action that appends its id to a shared trace
    struct TraceAction {
        id: ActionId,
        label: String,
        order: ActionOrder,
        trace: Arc<RwLock<Vec<u32>>>,
        fail: bool,
    }

    impl Action for TraceAction {
        fn action_id(&self) -> ActionId {
            self.id
        }

        fn label(&self) -> &str {
            &self.label
        }

        fn order(&self) -> ActionOrder {
            self.order
        }
    }

    impl StepAction<Host> for TraceAction {
        fn execute(&self, _params: &CoreParams<Host>, _state: &mut CoreState<Host>) -> Result<()> {
            if self.fail {
                return Err(Error::invalid_config("synthetic failure"));
            }
            self.trace.write().push(self.id.get());
            Ok(())
        }
    }

    struct Fixture {
        registry: Arc<ActionRegistry<Host>>,
        trace: Arc<RwLock<Vec<u32>>>,
    }

    /// Registry with orders {2, 1, 1} assigned to ids {0, 1, 2}
    fn out_of_order_fixture(fail_label: Option<&str>) -> Fixture {
        let trace = Arc::new(RwLock::new(Vec::new()));
        let mut registry = ActionRegistry::<Host>::new();
        for (label, order) in [
            ("post-step", ActionOrder::Post),
            ("pre-step-geo", ActionOrder::Pre),
            ("pre-step-physics", ActionOrder::Pre),
        ] {
            let action = TraceAction {
                id: registry.next_id(),
                label: label.to_string(),
                order,
                trace: Arc::clone(&trace),
                fail: fail_label == Some(label),
            };
            registry.insert(RegisteredAction::Explicit(Arc::new(action))).unwrap();
        }
        Fixture {
            registry: Arc::new(registry),
            trace,
        }
    }

    fn params_for(registry: &Arc<ActionRegistry<Host>>) -> CoreParams<Host> {
        CoreParams::new(crate::params::CoreParamsInput {
            registry: Arc::clone(registry),
            max_streams: 1,
            track_order: crate::track::TrackOrder::Unsorted,
            init_capacity: 16,
        })
        .unwrap()
    }

    #[test]
    fn test_sequence_visits_by_order_then_id() {
        let fixture = out_of_order_fixture(None);
        let params = params_for(&fixture.registry);
        let mut state = host_state_fixture(&params, 4);

        let sequence = ActionSequence::new(&fixture.registry, SequenceOptions::default()).unwrap();
        assert_eq!(sequence.num_actions(), 3);
        assert_eq!(
            sequence.labels(),
            ["pre-step-geo", "pre-step-physics", "post-step"]
        );

        sequence.execute(&params, &mut state).unwrap();
        // Orders {2, 1, 1} with ids {0, 1, 2}: id 1 then id 2 then id 0
        assert_eq!(*fixture.trace.read(), vec![1, 2, 0]);
    }

    #[test]
    fn test_implicit_actions_are_excluded() {
        let fixture = out_of_order_fixture(None);
        let mut registry = ActionRegistry::<Host>::new();
        // rebuild with one extra implicit entry
        for entry in fixture.registry.iter() {
            if let Some(action) = entry.explicit() {
                let action = TraceAction {
                    id: action.action_id(),
                    label: action.label().to_string(),
                    order: action.order(),
                    trace: Arc::clone(&fixture.trace),
                    fail: false,
                };
                registry.insert(RegisteredAction::Explicit(Arc::new(action))).unwrap();
            }
        }
        struct Marker(ActionId);
        impl Action for Marker {
            fn action_id(&self) -> ActionId {
                self.0
            }
            fn label(&self) -> &str {
                "kill-marker"
            }
            fn order(&self) -> ActionOrder {
                ActionOrder::End
            }
        }
        registry
            .insert(RegisteredAction::Implicit(Arc::new(Marker(registry.next_id()))))
            .unwrap();

        let sequence = ActionSequence::new(&registry, SequenceOptions::default()).unwrap();
        assert_eq!(registry.num_actions(), 4);
        assert_eq!(sequence.num_actions(), 3);
        assert!(!sequence.labels().contains(&"kill-marker".to_string()));
    }

    #[test]
    fn test_execute_accumulates_time() {
        let fixture = out_of_order_fixture(None);
        let params = params_for(&fixture.registry);
        let mut state = host_state_fixture(&params, 4);
        let sequence = ActionSequence::new(&fixture.registry, SequenceOptions { sync: true }).unwrap();

        sequence.execute(&params, &mut state).unwrap();
        let first = sequence.accum_time();
        assert_eq!(first.len(), 3);

        sequence.execute(&params, &mut state).unwrap();
        let second = sequence.accum_time();
        for (a, b) in first.iter().zip(&second) {
            assert!(b >= a);
        }
    }

    #[test]
    fn test_failure_carries_action_label() {
        let fixture = out_of_order_fixture(Some("pre-step-physics"));
        let params = params_for(&fixture.registry);
        let mut state = host_state_fixture(&params, 4);
        let sequence = ActionSequence::new(&fixture.registry, SequenceOptions::default()).unwrap();

        let err = sequence.execute(&params, &mut state).unwrap_err();
        match err {
            Error::Execution { label, .. } => assert_eq!(label, "pre-step-physics"),
            other => panic!("unexpected error: {other}"),
        }
        // the step aborted before the later phase ran
        assert_eq!(*fixture.trace.read(), vec![1]);
    }

    #[test]
    fn test_timing_output_keys_by_label() {
        let fixture = out_of_order_fixture(None);
        let params = params_for(&fixture.registry);
        let mut state = host_state_fixture(&params, 4);
        let sequence = ActionSequence::new(&fixture.registry, SequenceOptions::default()).unwrap();
        sequence.execute(&params, &mut state).unwrap();

        let block = sequence.timing_output();
        assert_eq!(block.category(), OutputCategory::Result);
        let value = block.output();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert!(object.contains_key("pre-step-geo"));
        assert!(object["post-step"].as_f64().unwrap() >= 0.0);
    }
}
