//! resolver::key
//!
//! Key resolution against current field values.
//!
//! A shape resolves only when every participating field is set. Candidate
//! shapes are tried strictly in declaration order and the first one that
//! resolves wins; later candidates are never inspected.

use serde_json::Value;

use crate::core::metadata::{FieldValueStore, KeyShape, ServiceDef};

/// Separator between composite key values in a URL segment.
pub const COMPOSITE_SEPARATOR: &str = ",";

/// A resolved record key.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedKey {
    /// Value of a single-field key.
    Single(Value),
    /// Ordered values of a composite key.
    Composite(Vec<Value>),
}

impl ResolvedKey {
    /// Render the key as a URL segment.
    ///
    /// Strings are used as-is; other values use their JSON text. Composite
    /// members are joined with [`COMPOSITE_SEPARATOR`].
    pub fn render(&self) -> String {
        match self {
            ResolvedKey::Single(value) => render_value(value),
            ResolvedKey::Composite(values) => values
                .iter()
                .map(render_value)
                .collect::<Vec<_>>()
                .join(COMPOSITE_SEPARATOR),
        }
    }
}

impl std::fmt::Display for ResolvedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve one key shape; `None` if any member is unset.
pub fn resolve_shape(shape: &KeyShape, store: &FieldValueStore) -> Option<ResolvedKey> {
    match shape {
        KeyShape::Field(id) => store.get_set(id).cloned().map(ResolvedKey::Single),
        KeyShape::Composite(ids) => ids
            .iter()
            .map(|id| store.get_set(id).cloned())
            .collect::<Option<Vec<_>>>()
            .map(ResolvedKey::Composite),
    }
}

/// Resolve the key of `service`.
///
/// Returns `None` when the service declares no key or no candidate resolves.
pub fn build_key(service: &ServiceDef, store: &FieldValueStore) -> Option<ResolvedKey> {
    service
        .key
        .as_ref()?
        .shapes()
        .into_iter()
        .find_map(|shape| resolve_shape(shape, store))
}

/// Whether `service` can be addressed with the current values.
///
/// True when the service declares no key, or when at least one candidate
/// shape resolves.
pub fn can_execute(service: &ServiceDef, store: &FieldValueStore) -> bool {
    service.key.is_none() || build_key(service, store).is_some()
}
