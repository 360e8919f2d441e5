//! Property store - current values and the pending change set.
//!
//! The store is owned by one element. Writes go through the comparator of the
//! property's descriptor; a changing write records the value the property had
//! before the batch started (first write wins) so hooks see batch-level
//! old values.

use std::rc::Rc;

use indexmap::IndexMap;

use super::definition::Definition;
use crate::types::Value;

// =============================================================================
// Snapshots
// =============================================================================

/// Immutable view of every current property value, in first-write order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySnapshot {
    values: Rc<IndexMap<String, Value>>,
}

impl PropertySnapshot {
    /// Value of a property, `Undefined` when never set.
    pub fn get(&self, name: &str) -> &Value {
        static UNDEFINED: Value = Value::Undefined;
        self.values.get(name).unwrap_or(&UNDEFINED)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Properties changed in one batch, mapped to their value before the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangedProperties {
    old_values: IndexMap<String, Value>,
}

impl ChangedProperties {
    /// Whether the property changed in this batch.
    pub fn has(&self, name: &str) -> bool {
        self.old_values.contains_key(name)
    }

    /// Value the property had before the batch.
    pub fn old_value(&self, name: &str) -> Option<&Value> {
        self.old_values.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.old_values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.old_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.old_values.is_empty()
    }

    fn record(&mut self, name: &str, old: Value) {
        if !self.old_values.contains_key(name) {
            self.old_values.insert(name.to_string(), old);
        }
    }
}

// =============================================================================
// Property Store
// =============================================================================

/// Per-element table of reactive property values.
#[derive(Debug)]
pub struct PropertyStore {
    definition: Rc<Definition>,
    values: IndexMap<String, Value>,
    pending: ChangedProperties,
}

impl PropertyStore {
    pub fn new(definition: Rc<Definition>) -> Self {
        Self {
            definition,
            values: IndexMap::new(),
            pending: ChangedProperties::default(),
        }
    }

    pub fn definition(&self) -> &Rc<Definition> {
        &self.definition
    }

    /// Current value of a property.
    pub fn read(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or_default()
    }

    /// Write a property.
    ///
    /// Returns `true` when the comparator reports a change. Unchanged writes
    /// leave the store untouched.
    pub fn write(&mut self, name: &str, value: Value) -> bool {
        let old = self.read(name);
        let has_changed = self.definition.comparator(name);
        if !has_changed(&old, &value) {
            return false;
        }

        self.pending.record(name, old);
        self.values.insert(name.to_string(), value);
        true
    }

    /// Full current value set.
    pub fn snapshot(&self) -> PropertySnapshot {
        PropertySnapshot {
            values: Rc::new(self.values.clone()),
        }
    }

    /// Whether any change is waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Take the pending change set, leaving an empty one for the next batch.
    pub fn take_pending(&mut self) -> ChangedProperties {
        std::mem::take(&mut self.pending)
    }
}

// =============================================================================
// Tests
// =============================================================================
