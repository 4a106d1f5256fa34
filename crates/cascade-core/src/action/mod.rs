//! Action abstraction: named, ordered units of per-step work
//!
//! Every piece of per-step computation is an action. Actions carry a stable
//! identity assigned by the [`ActionRegistry`], a human-readable label, and
//! a pipeline phase ([`ActionOrder`]). Actions that execute against lane
//! state each step additionally implement [`StepAction`]; the rest are
//! bookkeeping identities that only reserve an id (e.g. the "killed by
//! field propagation limit" marker a collaborator writes into a lane's step
//! limit without ever running itself).
//!
//! The explicit/implicit split is made once, at registration, with a tagged
//! variant: the per-step hot loop in [`ActionSequence`] iterates a flat
//! homogeneous list and performs no capability checks.

mod registry;
mod sequence;

pub use registry::ActionRegistry;
pub use sequence::{ActionSequence, ActionTimingOutput, SequenceOptions};

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::params::CoreParams;
use crate::space::MemorySpace;
use crate::state::CoreState;
use crate::types::{ActionId, ActionOrder};

/// Common interface for every registered action
pub trait Action: Send + Sync {
    /// Id assigned by the registry at registration time
    fn action_id(&self) -> ActionId;

    /// Label unique within the registry
    fn label(&self) -> &str;

    /// Pipeline phase this action belongs to
    fn order(&self) -> ActionOrder;
}

/// Capability of executing against lane state once per step
///
/// Generic over the memory space the same way the state container is: an
/// implementation reads the shared immutable `params` and reads/mutates
/// only the lanes and counters it owns by contract. It must tolerate a
/// suffix of non-alive lanes without additional filtering when the
/// partition invariant is not in force.
pub trait StepAction<M: MemorySpace>: Action {
    /// Run this action's phase across the whole lane array
    fn execute(&self, params: &CoreParams<M>, state: &mut CoreState<M>) -> Result<()>;
}

/// Registry entry with the capability split already applied
pub enum RegisteredAction<M: MemorySpace> {
    /// Directly executed each step
    Explicit(Arc<dyn StepAction<M>>),
    /// Identity only; never appears in the execution sequence
    Implicit(Arc<dyn Action>),
}

impl<M: MemorySpace> fmt::Debug for RegisteredAction<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = self.as_action();
        f.debug_struct("RegisteredAction")
            .field("explicit", &self.is_explicit())
            .field("id", &action.action_id())
            .field("label", &action.label())
            .field("order", &action.order())
            .finish()
    }
}

impl<M: MemorySpace> RegisteredAction<M> {
    /// Access the common action interface
    pub fn as_action(&self) -> &dyn Action {
        match self {
            RegisteredAction::Explicit(action) => action.as_ref(),
            RegisteredAction::Implicit(action) => action.as_ref(),
        }
    }

    /// Whether this entry participates in per-step execution
    pub fn is_explicit(&self) -> bool {
        matches!(self, RegisteredAction::Explicit(_))
    }

    /// The executable capability, if present
    pub fn explicit(&self) -> Option<&Arc<dyn StepAction<M>>> {
        match self {
            RegisteredAction::Explicit(action) => Some(action),
            RegisteredAction::Implicit(_) => None,
        }
    }
}
