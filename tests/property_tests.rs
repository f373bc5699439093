//! Property-based tests for the registry and resolver laws.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::{json, Value};

use formweave::core::metadata::schema::{Allow, ParameterPolicy};
use formweave::core::metadata::FieldValueStore;
use formweave::core::types::{FieldId, FieldRef};
use formweave::registry::{merge_parameters, Constructed, Definition, Registry};
use formweave::resolver::filter_parameters;

/// Strategy for small JSON scalars.
fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

/// Strategy for a default list with more than one entry and a strictly shorter,
/// non-empty caller list.
fn defaults_and_shorter_caller() -> impl Strategy<Value = (Vec<Value>, Vec<Value>)> {
    prop::collection::vec(scalar(), 2..8).prop_flat_map(|defaults| {
        let len = defaults.len();
        (Just(defaults), prop::collection::vec(scalar(), 1..len))
    })
}

/// Strategy for field ids under a handful of entities.
fn field_id() -> impl Strategy<Value = FieldId> {
    ("(user|org|acct)", "[a-z]{1,6}")
        .prop_map(|(entity, field)| FieldId::new(format!("{}:{}", entity, field)).unwrap())
}

/// Registry whose `echo` type returns its merged parameters.
fn echo_registry(defaults: Vec<Value>) -> Registry {
    let registry = Registry::new();
    registry.define_type("echo", |params: &[Value]| Ok(Constructed::new(params.to_vec())));
    registry
        .register("echo", Definition::constructor("echo").with_parameters(defaults))
        .unwrap();
    registry
}

proptest! {
    #[test]
    fn short_caller_is_padded_from_defaults((defaults, caller) in defaults_and_shorter_caller()) {
        let registry = echo_registry(defaults.clone());
        let built = registry.resolve_as::<Vec<Value>>("echo", Some(caller.clone())).unwrap();

        let mut expected = caller.clone();
        expected.extend_from_slice(&defaults[caller.len()..]);
        prop_assert_eq!(&*built, &expected);
        prop_assert_eq!(built.len(), defaults.len());
    }

    #[test]
    fn long_caller_is_verbatim(
        defaults in prop::collection::vec(scalar(), 2..5),
        extra in prop::collection::vec(scalar(), 0..4),
    ) {
        let mut caller = defaults.iter().map(|_| json!("c")).collect::<Vec<_>>();
        caller.extend(extra);
        prop_assert_eq!(merge_parameters(Some(&defaults), Some(caller.clone())), caller);
    }

    #[test]
    fn single_default_never_pads(
        default in scalar(),
        caller in prop::collection::vec(scalar(), 0..4),
    ) {
        let defaults = vec![default];
        prop_assert_eq!(merge_parameters(Some(&defaults), Some(caller.clone())), caller);
    }

    #[test]
    fn shared_instance_ignores_later_parameters(
        first in prop::collection::vec(scalar(), 1..4),
        second in prop::collection::vec(scalar(), 1..4),
    ) {
        let registry = Registry::new();
        registry.define_type("echo", |params: &[Value]| Ok(Constructed::new(params.to_vec())));
        registry.register("echo", Definition::constructor("echo").shared(true)).unwrap();

        let a = registry.resolve("echo", Some(first)).unwrap();
        let b = registry.resolve("echo", Some(second)).unwrap();
        prop_assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn filter_keeps_only_admitted_non_null(
        values in prop::collection::btree_map(field_id(), prop::option::of(scalar()), 0..12),
    ) {
        let policy = ParameterPolicy {
            require: false,
            allow: Allow::Only(vec![FieldRef::parse("user:*").unwrap()]),
            exclude: vec![FieldRef::parse("user:password").unwrap()],
        };
        let mut store = FieldValueStore::new();
        for (id, value) in &values {
            store.set(id.clone(), value.clone().unwrap_or(Value::Null));
        }

        let params = filter_parameters(&policy, &store);
        for (name, value) in &params {
            let id = FieldId::new(name.as_str()).unwrap();
            prop_assert_eq!(id.entity(), Some("user"));
            prop_assert_ne!(id.field(), "password");
            prop_assert!(!value.is_null());
        }
        let expected = values
            .iter()
            .filter(|(id, v)| id.entity() == Some("user") && id.field() != "password" && v.is_some())
            .count();
        prop_assert_eq!(params.len(), expected);
    }
}

#[test]
fn filter_law_example() {
    let policy = ParameterPolicy {
        require: false,
        allow: Allow::Only(vec![FieldRef::parse("user:*").unwrap()]),
        exclude: vec![FieldRef::parse("user:password").unwrap()],
    };
    let mut store = FieldValueStore::new();
    for (id, value) in [
        ("user:name", json!("ada")),
        ("user:password", json!("hunter2")),
        ("org:name", json!("acme")),
    ] {
        store.set(FieldId::new(id).unwrap(), value);
    }

    let params = filter_parameters(&policy, &store);
    assert_eq!(Value::Object(params), json!({"user:name": "ada"}));
}
