//! Registry owning all actions and their identifiers

use std::collections::HashMap;

use serde_json::json;

use super::RegisteredAction;
use crate::error::{Error, Result};
use crate::output::{OutputCategory, OutputInterface};
use crate::space::MemorySpace;
use crate::types::ActionId;

/// Owns every registered action and assigns stable, dense ids
///
/// Ids are handed out sequentially starting at zero, in registration order,
/// and are never reused. Labels must be unique. The registry is write-once:
/// it is populated during setup, then read-only for the remainder of the
/// run, so streams may share it freely.
///
/// # Registration protocol
///
/// An action carries its own id, obtained from [`next_id`](Self::next_id)
/// just before construction:
///
/// ```text
/// let id = registry.next_id();
/// registry.insert(RegisteredAction::Explicit(Arc::new(MyAction::new(id))))?;
/// ```
pub struct ActionRegistry<M: MemorySpace> {
    actions: Vec<RegisteredAction<M>>,
    labels: HashMap<String, ActionId>,
}

impl<M: MemorySpace> ActionRegistry<M> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            labels: HashMap::new(),
        }
    }

    /// The id the next successful registration will receive
    pub fn next_id(&self) -> ActionId {
        ActionId::new(self.actions.len() as u32)
    }

    /// Register an action, returning its id
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the label is empty or already
    /// registered, or if the action reports an id other than
    /// [`next_id`](Self::next_id). A failed registration leaves the
    /// registry unchanged.
    pub fn insert(&mut self, action: RegisteredAction<M>) -> Result<ActionId> {
        let id = {
            let common = action.as_action();
            let label = common.label();
            if label.is_empty() {
                return Err(Error::EmptyLabel { context: "action" });
            }
            if self.labels.contains_key(label) {
                return Err(Error::DuplicateActionLabel {
                    label: label.to_string(),
                });
            }
            let expected = self.next_id();
            if common.action_id() != expected {
                return Err(Error::ActionIdMismatch {
                    expected,
                    actual: common.action_id(),
                });
            }
            self.labels.insert(label.to_string(), expected);
            expected
        };
        self.actions.push(action);
        Ok(id)
    }

    /// Look up a registered action by id
    pub fn action(&self, id: ActionId) -> Result<&RegisteredAction<M>> {
        self.actions
            .get(id.index())
            .ok_or(Error::ActionIdOutOfRange {
                id,
                num_actions: self.actions.len(),
            })
    }

    /// Find an action id by label
    pub fn find_action(&self, label: &str) -> Option<ActionId> {
        self.labels.get(label).copied()
    }

    /// Total number of registered actions, explicit and implicit
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    /// Whether no actions have been registered yet
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterate over all entries in id order
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredAction<M>> {
        self.actions.iter()
    }
}

impl<M: MemorySpace> Default for ActionRegistry<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MemorySpace> OutputInterface for ActionRegistry<M> {
    fn category(&self) -> OutputCategory {
        OutputCategory::Internal
    }

    fn label(&self) -> &str {
        "actions"
    }

    fn output(&self) -> serde_json::Value {
        let table: Vec<_> = self
            .actions
            .iter()
            .map(|entry| {
                let action = entry.as_action();
                json!({
                    "id": action.action_id().get(),
                    "label": action.label(),
                    "order": action.order().as_str(),
                    "explicit": entry.is_explicit(),
                })
            })
            .collect();
        serde_json::Value::Array(table)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::action::Action;
    use crate::space::Host;
    use crate::types::ActionOrder;

    struct MarkerAction {
        id: ActionId,
        label: String,
        order: ActionOrder,
    }

    impl Action for MarkerAction {
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

    fn implicit(id: ActionId, label: &str) -> RegisteredAction<Host> {
        RegisteredAction::Implicit(Arc::new(MarkerAction {
            id,
            label: label.to_string(),
            order: ActionOrder::Post,
        }))
    }

    #[test]
    fn test_ids_are_dense_and_increasing() {
        let mut registry = ActionRegistry::<Host>::new();
        for (i, label) in ["geo-boundary", "physics-discrete", "kill-looping"].iter().enumerate() {
            let id = registry.insert(implicit(registry.next_id(), label)).unwrap();
            assert_eq!(id, ActionId::new(i as u32));
        }
        assert_eq!(registry.num_actions(), 3);
        assert_eq!(registry.next_id(), ActionId::new(3));
        assert_eq!(registry.find_action("physics-discrete"), Some(ActionId::new(1)));
    }

    #[test]
    fn test_duplicate_label_fails_without_mutating() {
        let mut registry = ActionRegistry::<Host>::new();
        registry.insert(implicit(registry.next_id(), "geo-boundary")).unwrap();

        let err = registry
            .insert(implicit(registry.next_id(), "geo-boundary"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateActionLabel { .. }));

        assert_eq!(registry.num_actions(), 1);
        assert_eq!(registry.next_id(), ActionId::new(1));
    }

    #[test]
    fn test_empty_label_is_rejected() {
        let mut registry = ActionRegistry::<Host>::new();
        let err = registry.insert(implicit(registry.next_id(), "")).unwrap_err();
        assert!(matches!(err, Error::EmptyLabel { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mismatched_id_is_rejected() {
        let mut registry = ActionRegistry::<Host>::new();
        let err = registry
            .insert(implicit(ActionId::new(7), "geo-boundary"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ActionIdMismatch {
                expected: ActionId(0),
                actual: ActionId(7)
            }
        ));
    }

    #[test]
    fn test_out_of_range_lookup() {
        let mut registry = ActionRegistry::<Host>::new();
        registry.insert(implicit(registry.next_id(), "geo-boundary")).unwrap();

        assert!(registry.action(ActionId::new(0)).is_ok());
        let err = registry.action(ActionId::new(1)).unwrap_err();
        assert!(matches!(err, Error::ActionIdOutOfRange { num_actions: 1, .. }));
    }

    #[test]
    fn test_output_table() {
        let mut registry = ActionRegistry::<Host>::new();
        registry.insert(implicit(registry.next_id(), "geo-boundary")).unwrap();

        assert_eq!(OutputInterface::label(&registry), "actions");
        assert_eq!(registry.category(), OutputCategory::Internal);
        let table = registry.output();
        assert_eq!(table[0]["label"], "geo-boundary");
        assert_eq!(table[0]["explicit"], false);
        assert_eq!(table[0]["order"], "post");
    }
}
