//! registry::definition
//!
//! Dependency definitions and the values they construct.
//!
//! # Design
//!
//! A definition has exactly one shape:
//!
//! - `Fixed` - a ready value, returned as-is (always shared)
//! - `Constructor` - the name of a type in the registry's constructor table
//! - `Factory` - a function invoked with the merged parameters
//!
//! Construction by type name goes through an explicit table filled with
//! [`Registry::define_type`](super::Registry::define_type); there is no
//! reflection.

use std::any::Any;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::Registry;

/// A resolved dependency instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Construction parameters, positional.
pub type Parameters = Vec<Value>;

/// Constructor or factory function.
pub type BuildFn = Arc<dyn Fn(&[Value]) -> Result<Constructed, ConstructError> + Send + Sync>;

/// Failure reported by a constructor or factory.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ConstructError(pub String);

impl ConstructError {
    /// Create a construction error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Instances that want a handle to the registry that built them.
///
/// The registry calls [`inject`](Injectable::inject) once, right after
/// construction and before the instance is cached or returned.
pub trait Injectable: Send + Sync {
    /// Receive the registry.
    fn inject(&self, registry: &Registry);
}

/// Output of a constructor or factory.
pub struct Constructed {
    pub(crate) instance: Instance,
    pub(crate) injectable: Option<Arc<dyn Injectable>>,
}

impl Constructed {
    /// Wrap a plain value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            instance: Arc::new(value),
            injectable: None,
        }
    }

    /// Wrap a value that receives the registry after construction.
    pub fn injectable<T: Injectable + Any>(value: T) -> Self {
        let value = Arc::new(value);
        Self {
            instance: value.clone(),
            injectable: Some(value),
        }
    }
}

impl std::fmt::Debug for Constructed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Constructed")
            .field("injectable", &self.injectable.is_some())
            .finish()
    }
}

/// The shape of a definition.
#[derive(Clone)]
pub enum DefinitionKind {
    /// A ready value.
    Fixed(Instance),
    /// A type name looked up in the constructor table.
    Constructor(String),
    /// A factory function.
    Factory(BuildFn),
}

impl DefinitionKind {
    /// Short name of the shape.
    pub fn name(&self) -> &'static str {
        match self {
            DefinitionKind::Fixed(_) => "fixed",
            DefinitionKind::Constructor(_) => "classname",
            DefinitionKind::Factory(_) => "closure",
        }
    }
}

impl std::fmt::Debug for DefinitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionKind::Fixed(_) => write!(f, "Fixed(..)"),
            DefinitionKind::Constructor(name) => write!(f, "Constructor({:?})", name),
            DefinitionKind::Factory(_) => write!(f, "Factory(..)"),
        }
    }
}

/// A registered dependency.
///
/// # Example
///
/// ```
/// use formweave::registry::Definition;
/// use serde_json::json;
///
/// let fixed = Definition::fixed("hello");
/// assert!(fixed.is_shared());
///
/// let typed = Definition::constructor("clock")
///     .with_parameters(vec![json!("utc"), json!(0)])
///     .shared(true);
/// assert_eq!(typed.parameters().map(|p| p.len()), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct Definition {
    kind: DefinitionKind,
    parameters: Option<Parameters>,
    shared: bool,
}

impl Definition {
    /// A fixed value. Fixed definitions are always shared.
    pub fn fixed<T: Any + Send + Sync>(value: T) -> Self {
        Self::fixed_instance(Arc::new(value))
    }

    /// A fixed, already shared instance.
    pub fn fixed_instance(instance: Instance) -> Self {
        Self {
            kind: DefinitionKind::Fixed(instance),
            parameters: None,
            shared: true,
        }
    }

    /// A type from the registry's constructor table.
    pub fn constructor(type_name: impl Into<String>) -> Self {
        Self {
            kind: DefinitionKind::Constructor(type_name.into()),
            parameters: None,
            shared: false,
        }
    }

    /// A factory function.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
    {
        Self::from_build_fn(Arc::new(factory))
    }

    pub(crate) fn from_build_fn(build: BuildFn) -> Self {
        Self {
            kind: DefinitionKind::Factory(build),
            parameters: None,
            shared: false,
        }
    }

    /// Set the default construction parameters.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Set whether the first resolved instance is cached.
    ///
    /// Has no effect on fixed definitions, which are always shared.
    pub fn shared(mut self, shared: bool) -> Self {
        if !matches!(self.kind, DefinitionKind::Fixed(_)) {
            self.shared = shared;
        }
        self
    }

    /// The definition's shape.
    pub fn kind(&self) -> &DefinitionKind {
        &self.kind
    }

    /// Default construction parameters.
    pub fn parameters(&self) -> Option<&[Value]> {
        self.parameters.as_deref()
    }

    /// Whether the first resolved instance is cached.
    pub fn is_shared(&self) -> bool {
        self.shared
    }
}

/// Merge caller parameters with declared defaults.
///
/// - No caller parameters: the defaults (or nothing).
/// - Defaults absent or of length 1: caller parameters replace them.
/// - Caller supplies fewer than declared: caller overwrites the positional
///   prefix and the remaining defaults are kept.
/// - Otherwise: caller parameters verbatim.
///
/// # Example
///
/// ```
/// use formweave::registry::merge_parameters;
/// use serde_json::json;
///
/// let defaults = vec![json!(1), json!(2), json!(3)];
/// let merged = merge_parameters(Some(&defaults), Some(vec![json!("a")]));
/// assert_eq!(merged, vec![json!("a"), json!(2), json!(3)]);
/// ```
pub fn merge_parameters(defaults: Option<&[Value]>, caller: Option<Parameters>) -> Parameters {
    let Some(caller) = caller else {
        return defaults.map(<[Value]>::to_vec).unwrap_or_default();
    };
    match defaults {
        Some(defaults) if defaults.len() > 1 && caller.len() < defaults.len() => {
            let mut merged = caller;
            merged.extend_from_slice(&defaults[merged.len()..]);
            merged
        }
        _ => caller,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    mod merge {
        use super::*;

        #[test]
        fn no_caller_uses_defaults() {
            let defaults = vec![json!(1), json!(2)];
            assert_eq!(merge_parameters(Some(&defaults), None), defaults);
            assert!(merge_parameters(None, None).is_empty());
        }

        #[test]
        fn absent_defaults_use_caller() {
            let caller = vec![json!("x")];
            assert_eq!(merge_parameters(None, Some(caller.clone())), caller);
        }

        #[test]
        fn single_default_is_replaced() {
            let defaults = vec![json!(1)];
            assert!(merge_parameters(Some(&defaults), Some(vec![])).is_empty());
            assert_eq!(
                merge_parameters(Some(&defaults), Some(vec![json!(9), json!(8)])),
                vec![json!(9), json!(8)]
            );
        }

        #[test]
        fn short_caller_keeps_default_suffix() {
            let defaults = vec![json!(1), json!(2), json!(3)];
            assert_eq!(
                merge_parameters(Some(&defaults), Some(vec![json!("a"), json!("b")])),
                vec![json!("a"), json!("b"), json!(3)]
            );
        }

        #[test]
        fn long_caller_is_verbatim() {
            let defaults = vec![json!(1), json!(2)];
            let caller = vec![json!("a"), json!("b"), json!("c")];
            assert_eq!(merge_parameters(Some(&defaults), Some(caller.clone())), caller);
        }
    }

    mod definition {
        use super::*;

        #[test]
        fn fixed_is_always_shared() {
            let def = Definition::fixed(5u32).shared(false);
            assert!(def.is_shared());
            assert_eq!(def.kind().name(), "fixed");
        }

        #[test]
        fn constructor_defaults_unshared() {
            let def = Definition::constructor("clock");
            assert!(!def.is_shared());
            assert!(def.parameters().is_none());
            assert_eq!(def.kind().name(), "classname");
        }

        #[test]
        fn factory_shape() {
            let def = Definition::factory(|_| Ok(Constructed::new(1u8))).shared(true);
            assert!(def.is_shared());
            assert_eq!(def.kind().name(), "closure");
        }

        #[test]
        fn debug_hides_values() {
            let def = Definition::constructor("clock");
            assert!(format!("{:?}", def).contains("Constructor(\"clock\")"));
        }
    }
}
