//! Pull-based diagnostic output
//!
//! Any component can register a named output block under a category; when
//! output is requested, every block is polled and the results assembled
//! into one JSON document keyed by category and label. The core registers
//! its per-action timing and the action registry table here; transport and
//! formatting beyond JSON assembly are out of scope.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Category an output block is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputCategory {
    /// Problem definition and configuration
    Input,
    /// Simulation results
    Result,
    /// Host and device environment
    System,
    /// Internal diagnostics
    Internal,
}

impl OutputCategory {
    const ALL: [OutputCategory; 4] = [
        OutputCategory::Input,
        OutputCategory::Result,
        OutputCategory::System,
        OutputCategory::Internal,
    ];

    /// Lowercase category name used as the JSON key
    pub const fn as_str(self) -> &'static str {
        match self {
            OutputCategory::Input => "input",
            OutputCategory::Result => "result",
            OutputCategory::System => "system",
            OutputCategory::Internal => "internal",
        }
    }

    const fn index(self) -> usize {
        match self {
            OutputCategory::Input => 0,
            OutputCategory::Result => 1,
            OutputCategory::System => 2,
            OutputCategory::Internal => 3,
        }
    }
}

/// A named block of pull-based diagnostic output
pub trait OutputInterface: Send + Sync {
    /// Category this block is filed under
    fn category(&self) -> OutputCategory;

    /// Label unique within the category
    fn label(&self) -> &str;

    /// Produce the block's current value
    fn output(&self) -> serde_json::Value;
}

/// Collects registered output blocks and assembles the JSON document
#[derive(Default)]
pub struct OutputManager {
    interfaces: [BTreeMap<String, Arc<dyn OutputInterface>>; 4],
}

impl OutputManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an output block
    ///
    /// # Errors
    ///
    /// Fails with a configuration error if the block's label is empty or
    /// already registered under the same category.
    pub fn insert(&mut self, interface: Arc<dyn OutputInterface>) -> Result<()> {
        let label = interface.label().to_string();
        if label.is_empty() {
            return Err(Error::EmptyLabel {
                context: "output interface",
            });
        }
        let category = interface.category();
        let entries = &mut self.interfaces[category.index()];
        if entries.contains_key(&label) {
            return Err(Error::DuplicateOutputLabel {
                label,
                category: category.as_str(),
            });
        }
        entries.insert(label, interface);
        Ok(())
    }

    /// Poll every block and assemble the output document
    pub fn to_json(&self) -> serde_json::Value {
        let mut document = serde_json::Map::new();
        for category in OutputCategory::ALL {
            let entries = &self.interfaces[category.index()];
            if entries.is_empty() {
                continue;
            }
            let mut section = serde_json::Map::new();
            for (label, interface) in entries {
                section.insert(label.clone(), interface.output());
            }
            document.insert(category.as_str().to_string(), serde_json::Value::Object(section));
        }
        serde_json::Value::Object(document)
    }

    /// Write the assembled document to the given stream
    pub fn write(&self, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(writer, &self.to_json())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct FixedBlock {
        category: OutputCategory,
        label: &'static str,
        value: serde_json::Value,
    }

    impl OutputInterface for FixedBlock {
        fn category(&self) -> OutputCategory {
            self.category
        }

        fn label(&self) -> &str {
            self.label
        }

        fn output(&self) -> serde_json::Value {
            self.value.clone()
        }
    }

    fn block(category: OutputCategory, label: &'static str, value: serde_json::Value) -> Arc<dyn OutputInterface> {
        Arc::new(FixedBlock {
            category,
            label,
            value,
        })
    }

    #[test]
    fn test_document_groups_by_category() {
        let mut manager = OutputManager::new();
        manager
            .insert(block(OutputCategory::Result, "actions", json!({"step": 1.5})))
            .unwrap();
        manager
            .insert(block(OutputCategory::Internal, "actions", json!([1, 2])))
            .unwrap();
        manager
            .insert(block(OutputCategory::Result, "counters", json!({"alive": 3})))
            .unwrap();

        let document = manager.to_json();
        assert_eq!(document["result"]["actions"]["step"], 1.5);
        assert_eq!(document["result"]["counters"]["alive"], 3);
        assert_eq!(document["internal"]["actions"][1], 2);
        // empty categories are omitted
        assert!(document.get("input").is_none());
        assert!(document.get("system").is_none());
    }

    #[test]
    fn test_duplicate_label_in_category_fails() {
        let mut manager = OutputManager::new();
        manager
            .insert(block(OutputCategory::Result, "actions", json!(null)))
            .unwrap();
        let err = manager
            .insert(block(OutputCategory::Result, "actions", json!(null)))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateOutputLabel { .. }));

        // same label under another category is fine
        manager
            .insert(block(OutputCategory::System, "actions", json!(null)))
            .unwrap();
    }

    #[test]
    fn test_empty_label_rejected() {
        let mut manager = OutputManager::new();
        let err = manager
            .insert(block(OutputCategory::Input, "", json!(null)))
            .unwrap_err();
        assert!(matches!(err, Error::EmptyLabel { .. }));
    }

    #[test]
    fn test_write_produces_json() {
        let mut manager = OutputManager::new();
        manager
            .insert(block(OutputCategory::Result, "counters", json!({"alive": 0})))
            .unwrap();

        let mut bytes = Vec::new();
        manager.write(&mut bytes).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, manager.to_json());
    }
}
