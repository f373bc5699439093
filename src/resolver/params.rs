//! resolver::params
//!
//! Parameter filtering.
//!
//! Every set field is a candidate. A field is sent when it passes the
//! service's `allow` rule and no `exclude` reference matches it. Wildcards
//! are handled by [`FieldRef::matches`](crate::core::types::FieldRef::matches).

use serde_json::{Map, Value};

use crate::core::metadata::{FieldValueStore, ParameterPolicy};

/// Call parameters keyed by `"entity:field"`.
pub type CallParameters = Map<String, Value>;

/// Filter the set fields of `store` through `policy`.
///
/// Fields are visited in id order, so the result is deterministic.
pub fn filter_parameters(policy: &ParameterPolicy, store: &FieldValueStore) -> CallParameters {
    store
        .values()
        .iter()
        .filter(|(_, value)| !value.is_null())
        .filter(|(id, _)| policy.admits(id))
        .map(|(id, value)| (id.to_string(), value.clone()))
        .collect()
}
