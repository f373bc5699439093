//! registry
//!
//! Dependency Registry: a small inversion-of-control container.
//!
//! # Architecture
//!
//! The registry maps names to [`Definition`]s and resolves them into
//! instances. It is an explicit context object: components that need
//! dependency resolution receive a [`Registry`] handle (cheap to clone)
//! rather than reaching for global state.
//!
//! # Invariants
//!
//! - Names are non-empty.
//! - A shared definition is materialized at most once; later resolutions
//!   return the cached instance and ignore their parameters.
//! - The instance cache is cleared only by [`Registry::teardown`].
//! - Construction never runs while the registry lock is held, so
//!   constructors may resolve other dependencies.
//!
//! # Example
//!
//! ```
//! use formweave::registry::{Constructed, Definition, Registry};
//! use serde_json::json;
//!
//! let registry = Registry::new();
//! registry.define_type("greeter", |params| {
//!     let name = params.first().and_then(|v| v.as_str()).unwrap_or("world");
//!     Ok(Constructed::new(format!("hello {}", name)))
//! });
//! registry
//!     .register("greeter", Definition::constructor("greeter").with_parameters(vec![json!("ada")]))
//!     .unwrap();
//!
//! let greeting = registry.resolve_as::<String>("greeter", None).unwrap();
//! assert_eq!(greeting.as_str(), "hello ada");
//! ```

mod definition;

pub use definition::{
    merge_parameters, BuildFn, ConstructError, Constructed, Definition, DefinitionKind, Injectable,
    Instance, Parameters,
};

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use thiserror::Error;

use crate::core::config::DependencyConfig;

/// Errors from registry operations.
///
/// These are raised synchronously to the caller and are not recoverable locally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The name or definition shape is not acceptable.
    #[error("invalid definition for '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Nothing was registered under this name.
    #[error("unknown dependency: {0}")]
    UnknownDependency(String),

    /// The constructor or factory failed.
    #[error("failed to construct '{name}': {source}")]
    Construction {
        name: String,
        source: ConstructError,
    },

    /// The resolved instance is not of the requested type.
    #[error("dependency '{name}' is not a {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },
}

impl RegistryError {
    fn invalid(name: &str, reason: impl Into<String>) -> Self {
        RegistryError::InvalidDefinition {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Default)]
struct RegistryState {
    definitions: HashMap<String, Definition>,
    instances: HashMap<String, Instance>,
    types: HashMap<String, BuildFn>,
    factories: HashMap<String, BuildFn>,
}

/// The Dependency Registry.
///
/// Clones share the same definitions and instance cache.
#[derive(Clone, Default)]
pub struct Registry {
    state: Arc<Mutex<RegistryState>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Registry")
            .field("definitions", &state.definitions.len())
            .field("instances", &state.instances.len())
            .field("types", &state.types.len())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether two handles refer to the same registry.
    pub fn ptr_eq(&self, other: &Registry) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Add a constructor to the type table, replacing any previous one.
    pub fn define_type<F>(&self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&[Value]) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
    {
        self.state()
            .types
            .insert(type_name.into(), Arc::new(constructor));
    }

    /// Add a named factory, usable from config through `closure = "<name>"`.
    pub fn define_factory<F>(&self, factory_name: impl Into<String>, factory: F)
    where
        F: Fn(&[Value]) -> Result<Constructed, ConstructError> + Send + Sync + 'static,
    {
        self.state()
            .factories
            .insert(factory_name.into(), Arc::new(factory));
    }

    /// Register a definition under `name`.
    ///
    /// # Returns
    ///
    /// The previous definition for `name`, if any.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` if `name` is empty or the definition names a
    /// type missing from the constructor table.
    pub fn register(
        &self,
        name: &str,
        definition: Definition,
    ) -> Result<Option<Definition>, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::invalid(name, "name cannot be empty"));
        }

        let mut state = self.state();
        if let DefinitionKind::Constructor(type_name) = definition.kind() {
            if !state.types.contains_key(type_name) {
                return Err(RegistryError::invalid(
                    name,
                    format!("unknown type '{}'", type_name),
                ));
            }
        }

        tracing::debug!(
            dependency = name,
            kind = definition.kind().name(),
            shared = definition.is_shared(),
            "registered dependency"
        );
        Ok(state.definitions.insert(name.to_string(), definition))
    }

    /// Register an explicit definition object from configuration.
    ///
    /// `fixed` becomes a fixed JSON value, `classname` a constructor from the
    /// type table, and `closure` a factory from the factory table.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` if the object does not have exactly one shape,
    /// or names a type or factory that was never defined.
    pub fn register_config(
        &self,
        name: &str,
        config: &DependencyConfig,
    ) -> Result<Option<Definition>, RegistryError> {
        config
            .validate(name)
            .map_err(|e| RegistryError::invalid(name, e.to_string()))?;

        let definition = if let Some(value) = &config.fixed {
            Definition::fixed(value.clone())
        } else if let Some(type_name) = &config.classname {
            Definition::constructor(type_name.clone())
        } else if let Some(factory_name) = &config.closure {
            let factory = self.state().factories.get(factory_name).cloned();
            match factory {
                Some(build) => Definition::from_build_fn(build),
                None => {
                    return Err(RegistryError::invalid(
                        name,
                        format!("unknown factory '{}'", factory_name),
                    ))
                }
            }
        } else {
            return Err(RegistryError::invalid(name, "unrecognized definition shape"));
        };

        let definition = match &config.parameters {
            Some(parameters) => definition.with_parameters(parameters.clone()),
            None => definition,
        };
        let definition = definition.shared(config.shared.unwrap_or(false));
        self.register(name, definition)
    }

    /// Register a definition object given as a JSON value.
    ///
    /// # Errors
    ///
    /// `InvalidDefinition` if the value is not a definition object.
    pub fn register_value(
        &self,
        name: &str,
        value: &Value,
    ) -> Result<Option<Definition>, RegistryError> {
        let config: DependencyConfig = serde_json::from_value(value.clone())
            .map_err(|e| RegistryError::invalid(name, e.to_string()))?;
        self.register_config(name, &config)
    }

    /// Whether a definition exists for `name`.
    pub fn has(&self, name: &str) -> bool {
        self.state().definitions.contains_key(name)
    }

    /// Resolve `name` into an instance.
    ///
    /// Caller parameters are merged with the definition's defaults using
    /// [`merge_parameters`]. Shared definitions are cached after the first
    /// successful construction; later calls return the cached instance and
    /// ignore `parameters`.
    ///
    /// # Errors
    ///
    /// - `UnknownDependency` if `name` was never registered
    /// - `InvalidDefinition` if its type vanished from the constructor table
    /// - `Construction` if the constructor or factory fails
    pub fn resolve(
        &self,
        name: &str,
        parameters: Option<Parameters>,
    ) -> Result<Instance, RegistryError> {
        let (definition, build) = {
            let state = self.state();
            let definition = state
                .definitions
                .get(name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownDependency(name.to_string()))?;

            if definition.is_shared() {
                if let Some(instance) = state.instances.get(name) {
                    return Ok(instance.clone());
                }
            }

            let build = match definition.kind() {
                DefinitionKind::Fixed(_) => None,
                DefinitionKind::Constructor(type_name) => Some(
                    state
                        .types
                        .get(type_name)
                        .cloned()
                        .ok_or_else(|| {
                            RegistryError::invalid(name, format!("unknown type '{}'", type_name))
                        })?,
                ),
                DefinitionKind::Factory(factory) => Some(factory.clone()),
            };
            (definition, build)
        };

        let instance = match (definition.kind(), build) {
            (DefinitionKind::Fixed(value), _) => value.clone(),
            (_, Some(build)) => {
                let merged = merge_parameters(definition.parameters(), parameters);
                tracing::debug!(dependency = name, parameters = merged.len(), "constructing dependency");
                let constructed = build(&merged).map_err(|source| RegistryError::Construction {
                    name: name.to_string(),
                    source,
                })?;
                if let Some(target) = &constructed.injectable {
                    target.inject(self);
                }
                constructed.instance
            }
            (_, None) => {
                return Err(RegistryError::invalid(name, "unrecognized definition shape"))
            }
        };

        if !definition.is_shared() {
            return Ok(instance);
        }
        // First writer wins if two resolutions raced past the cache check.
        let mut state = self.state();
        Ok(state
            .instances
            .entry(name.to_string())
            .or_insert(instance)
            .clone())
    }

    /// Resolve `name` and downcast the instance to `T`.
    ///
    /// # Errors
    ///
    /// Everything [`resolve`](Self::resolve) returns, plus `TypeMismatch`.
    pub fn resolve_as<T: Any + Send + Sync>(
        &self,
        name: &str,
        parameters: Option<Parameters>,
    ) -> Result<Arc<T>, RegistryError> {
        self.resolve(name, parameters)?
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Drop every cached shared instance.
    ///
    /// Definitions stay registered; the next resolution constructs afresh.
    pub fn teardown(&self) {
        let mut state = self.state();
        tracing::debug!(instances = state.instances.len(), "registry teardown");
        state.instances.clear();
    }
}
