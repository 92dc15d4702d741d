//! Ordered named-value sets produced by payload flattening.

use serde::{Deserialize, Serialize};

use crate::value::ScalarValue;

/// Value slot of a named value: either a scalar or the sentinel recorded for
/// an empty collection.
///
/// The sentinel is a dedicated variant rather than a magic scalar so rebuild
/// logic can never confuse it with real payload data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NamedPayloadValue {
    /// Flattened scalar value.
    Scalar(ScalarValue),
    /// Marker recorded at the path of an empty collection.
    EmptyCollection,
}

impl NamedPayloadValue {
    /// Returns `true` when the slot holds a null scalar.
    pub fn is_null(&self) -> bool {
        matches!(self, NamedPayloadValue::Scalar(ScalarValue::Null))
    }
}

/// One (dotted path, value) pair produced by flattening a payload tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedValue {
    /// Dot-joined structural path, with zero-based indices for collections.
    pub path: String,
    /// Flattened value at that path.
    pub value: NamedPayloadValue,
}

/// Ordered set of named values.
///
/// Paths are unique; re-setting a path overwrites the value but keeps the
/// original insertion slot, so iteration order is first-seen order with
/// last-write-wins values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedValueSet {
    entries: Vec<NamedValue>,
}

impl NamedValueSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value at `path`, preserving the first-seen slot on overwrite.
    pub fn set(&mut self, path: impl Into<String>, value: NamedPayloadValue) {
        let path = path.into();
        match self.entries.iter_mut().find(|entry| entry.path == path) {
            Some(existing) => existing.value = value,
            None => self.entries.push(NamedValue { path, value }),
        }
    }

    /// Returns the value recorded at `path`.
    pub fn get(&self, path: &str) -> Option<&NamedPayloadValue> {
        self.entries
            .iter()
            .find(|entry| entry.path == path)
            .map(|entry| &entry.value)
    }

    /// Removes and returns the entry at `path`.
    pub fn remove(&mut self, path: &str) -> Option<NamedValue> {
        let index = self.entries.iter().position(|entry| entry.path == path)?;
        Some(self.entries.remove(index))
    }

    /// Removes every entry whose path is a strict descendant of `parent`.
    pub fn remove_descendants_of(&mut self, parent: &str) {
        let prefix = format!("{parent}.");
        self.entries.retain(|entry| !entry.path.starts_with(&prefix));
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &NamedValue> {
        self.entries.iter()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the set has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the set, yielding entries in first-seen order.
    pub fn into_values(self) -> Vec<NamedValue> {
        self.entries
    }
}
