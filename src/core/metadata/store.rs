//! core::metadata::store
//!
//! Field Value Store: current values plus an "original" snapshot.
//!
//! # Design
//!
//! The store is owned by the form or record instance that created it.
//! The original snapshot is replaced after a load and promoted from the
//! current values after a save, so `is_modified` compares against the last
//! state known to the backend.
//!
//! A field is *set* when it has a non-null current value. Key and
//! parameter resolution only ever see set fields.
//!
//! # Example
//!
//! ```
//! use formweave::core::metadata::FieldValueStore;
//! use formweave::core::types::FieldId;
//! use serde_json::json;
//!
//! let name = FieldId::new("user:name").unwrap();
//! let mut store = FieldValueStore::new();
//! store.load([(name.clone(), json!("ada"))].into_iter().collect());
//! assert!(!store.is_modified(&name));
//!
//! store.set(name.clone(), json!("grace"));
//! assert!(store.is_modified(&name));
//!
//! store.reset();
//! assert_eq!(store.get(&name), Some(&json!("ada")));
//! ```

use std::collections::BTreeMap;

use serde_json::Value;

use crate::core::types::FieldId;

/// Field values keyed by field id.
pub type FieldValues = BTreeMap<FieldId, Value>;

/// Current and original field values of one record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValueStore {
    current: FieldValues,
    original: FieldValues,
}

impl FieldValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose current values are `values` and whose original snapshot is empty.
    pub fn with_values(values: FieldValues) -> Self {
        Self {
            current: values,
            original: FieldValues::new(),
        }
    }

    /// Set a current value.
    pub fn set(&mut self, id: FieldId, value: Value) -> Option<Value> {
        self.current.insert(id, value)
    }

    /// Remove a current value.
    pub fn unset(&mut self, id: &FieldId) -> Option<Value> {
        self.current.remove(id)
    }

    /// Get a current value, including explicit nulls.
    pub fn get(&self, id: &FieldId) -> Option<&Value> {
        self.current.get(id)
    }

    /// Get a current value only if it is set (present and not null).
    pub fn get_set(&self, id: &FieldId) -> Option<&Value> {
        self.current.get(id).filter(|v| !v.is_null())
    }

    /// Get the original value.
    pub fn original(&self, id: &FieldId) -> Option<&Value> {
        self.original.get(id)
    }

    /// All current values.
    pub fn values(&self) -> &FieldValues {
        &self.current
    }

    /// The original snapshot.
    pub fn originals(&self) -> &FieldValues {
        &self.original
    }

    /// Whether the current value differs from the original snapshot.
    pub fn is_modified(&self, id: &FieldId) -> bool {
        self.current.get(id) != self.original.get(id)
    }

    /// Field ids whose current value differs from the original snapshot.
    pub fn modified_fields(&self) -> Vec<&FieldId> {
        let mut ids: Vec<&FieldId> = self
            .current
            .keys()
            .chain(self.original.keys())
            .filter(|id| self.is_modified(id))
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    /// Merge values freshly read from the backend into the current values.
    ///
    /// The returned values become the sole original values. Current values
    /// the backend did not return are kept.
    pub fn load(&mut self, values: FieldValues) {
        self.current.extend(values.clone());
        self.original = values;
    }

    /// Merge values returned by a save into the current values and
    /// promote the result to the original snapshot.
    pub fn save(&mut self, values: FieldValues) {
        self.current.extend(values);
        self.original = self.current.clone();
    }

    /// Discard both snapshots.
    pub fn clear(&mut self) {
        self.current.clear();
        self.original.clear();
    }

    /// Restore current values from the original snapshot.
    pub fn reset(&mut self) {
        self.current = self.original.clone();
    }
}
