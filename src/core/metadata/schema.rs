//! core::metadata::schema
//!
//! Metadata document schema: fields, services, and forms.
//!
//! # Schema Design
//!
//! Metadata documents are produced elsewhere and only consumed here.
//! Parsing is lenient about extra keys (documents carry presentation hints
//! this crate ignores) but strict about the shapes it does interpret:
//! key shapes, parameter policies, and field references are validated at
//! parse time so the resolver never sees a malformed definition.
//!
//! # Key shapes
//!
//! A service addresses a record with `key` or `keys`:
//!
//! - `"key": "user:id"` - a single field
//! - `"key": ["org:id", "user:id"]` - a composite key (all members required)
//! - `"key": ["user:id", ["org:id", "user:login"]]` - candidate shapes, tried in order
//! - `"keys": [...]` - candidate shapes, always
//!
//! # Example
//!
//! ```
//! use formweave::core::metadata::schema::{KeyShape, KeySpec, ServiceDef};
//!
//! let json = r#"{
//!     "service": ["users", "account"],
//!     "action": "read",
//!     "key": ["user:id", ["org:id", "user:login"]],
//!     "parameters": { "allow": ["user:*"], "exclude": "user:password" }
//! }"#;
//! let service: ServiceDef = serde_json::from_str(json).unwrap();
//! assert_eq!(service.path, vec!["users", "account"]);
//! assert!(matches!(service.key, Some(KeySpec::Candidates(ref c)) if c.len() == 2));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MetadataError;
use crate::core::types::{FieldId, FieldRef};

/// Field definition from the `fields` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDef {
    /// Declared value type (e.g. "string", "integer")
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    /// Maximum length, if constrained
    pub length: Option<u32>,
    /// Whether null is an accepted value
    pub nullable: bool,
    /// Whether the field is part of the record key
    pub key: bool,
    /// Default value applied to new records
    pub default: Option<Value>,
    /// Opaque validation rules, consumed by the host
    pub validation: Option<Value>,
    /// Display label
    pub label: Option<String>,
}

/// A key shape: one field, or several fields that together address a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyShape {
    /// A single field id.
    Field(FieldId),
    /// An ordered composite of field ids; every member must be set.
    Composite(Vec<FieldId>),
}

impl KeyShape {
    /// Field ids participating in this shape, in order.
    pub fn fields(&self) -> Vec<&FieldId> {
        match self {
            KeyShape::Field(id) => vec![id],
            KeyShape::Composite(ids) => ids.iter().collect(),
        }
    }

    fn from_value(value: &Value) -> Result<Self, MetadataError> {
        match value {
            Value::String(s) => Ok(KeyShape::Field(parse_field_id(s)?)),
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(MetadataError::InvalidKey(
                        "composite key cannot be empty".into(),
                    ));
                }
                let ids = items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => parse_field_id(s),
                        other => Err(MetadataError::InvalidKey(format!(
                            "composite key members must be field ids, found {}",
                            other
                        ))),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(KeyShape::Composite(ids))
            }
            other => Err(MetadataError::InvalidKey(format!(
                "key shape must be a field id or list of field ids, found {}",
                other
            ))),
        }
    }
}

/// How a service addresses a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySpec {
    /// Exactly one shape.
    Single(KeyShape),
    /// Candidate shapes in priority order; the first fully resolvable wins.
    Candidates(Vec<KeyShape>),
}

impl KeySpec {
    /// Interpret a raw `key` value.
    ///
    /// An array becomes candidates as soon as one member is itself an array.
    pub fn from_value(value: &Value) -> Result<Self, MetadataError> {
        match value {
            Value::Array(items) if items.iter().any(Value::is_array) => {
                Self::candidates_from_values(items)
            }
            other => Ok(KeySpec::Single(KeyShape::from_value(other)?)),
        }
    }

    /// Interpret a raw `keys` list; every member is a candidate shape.
    pub fn candidates_from_values(items: &[Value]) -> Result<Self, MetadataError> {
        if items.is_empty() {
            return Err(MetadataError::InvalidKey(
                "candidate key list cannot be empty".into(),
            ));
        }
        let shapes = items
            .iter()
            .map(KeyShape::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(KeySpec::Candidates(shapes))
    }

    /// Candidate shapes in priority order (a single shape yields one candidate).
    pub fn shapes(&self) -> Vec<&KeyShape> {
        match self {
            KeySpec::Single(shape) => vec![shape],
            KeySpec::Candidates(shapes) => shapes.iter().collect(),
        }
    }
}

/// Which fields may be sent as call parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Allow {
    /// Every field is eligible.
    #[default]
    All,
    /// No field is eligible.
    None,
    /// Only fields matching one of these references.
    Only(Vec<FieldRef>),
}

impl Allow {
    /// Whether the given field passes this allow rule.
    pub fn permits(&self, id: &FieldId) -> bool {
        match self {
            Allow::All => true,
            Allow::None => false,
            Allow::Only(refs) => refs.iter().any(|r| r.matches(id)),
        }
    }
}

/// Parameter filtering policy of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPolicy {
    /// Fail the call if no parameter qualifies.
    pub require: bool,
    /// Allow rule (default: all fields).
    pub allow: Allow,
    /// Fields removed after the allow rule (default: none).
    pub exclude: Vec<FieldRef>,
}

impl ParameterPolicy {
    /// Whether a field passes `allow` and is not matched by `exclude`.
    pub fn admits(&self, id: &FieldId) -> bool {
        self.allow.permits(id) && !self.exclude.iter().any(|r| r.matches(id))
    }
}

/// One reference or a list of references, as written in metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawRefs {
    One(String),
    Many(Vec<String>),
}

impl RawRefs {
    fn into_refs(self) -> Result<Vec<FieldRef>, MetadataError> {
        let raw = match self {
            RawRefs::One(s) => vec![s],
            RawRefs::Many(v) => v,
        };
        raw.iter()
            .map(|s| FieldRef::parse(s).map_err(|e| MetadataError::InvalidParameters(e.to_string())))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RawParameterPolicy {
    require: bool,
    allow: Option<RawRefs>,
    exclude: Option<RawRefs>,
}

impl TryFrom<RawParameterPolicy> for ParameterPolicy {
    type Error = MetadataError;

    fn try_from(raw: RawParameterPolicy) -> Result<Self, Self::Error> {
        let allow = match raw.allow {
            None => Allow::All,
            Some(RawRefs::One(s)) if s == "all" => Allow::All,
            Some(RawRefs::One(s)) if s == "none" => Allow::None,
            Some(refs) => Allow::Only(refs.into_refs()?),
        };
        let exclude = match raw.exclude {
            None => Vec::new(),
            Some(refs) => refs.into_refs()?,
        };
        Ok(ParameterPolicy {
            require: raw.require,
            allow,
            exclude,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawPath {
    Joined(String),
    Segments(Vec<String>),
}

#[derive(Debug, Clone, Deserialize)]
struct RawServiceDef {
    service: RawPath,
    action: String,
    #[serde(default)]
    key: Option<Value>,
    #[serde(default)]
    keys: Option<Vec<Value>>,
    #[serde(default)]
    parameters: RawParameterPolicy,
}

/// Service definition from the `services` document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawServiceDef")]
pub struct ServiceDef {
    /// Service path segments (empty segments dropped)
    pub path: Vec<String>,
    /// Action name (e.g. "create", "read")
    pub action: String,
    /// Key requirement, if the service addresses a specific record
    pub key: Option<KeySpec>,
    /// Parameter filtering policy
    pub parameters: ParameterPolicy,
}

impl ServiceDef {
    /// Create a service definition with no key requirement and default parameters.
    pub fn new(path: &[&str], action: impl Into<String>) -> Self {
        Self {
            path: path
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect(),
            action: action.into(),
            key: None,
            parameters: ParameterPolicy::default(),
        }
    }

    /// Set the key requirement.
    pub fn with_key(mut self, key: KeySpec) -> Self {
        self.key = Some(key);
        self
    }

    /// Set the parameter policy.
    pub fn with_parameters(mut self, parameters: ParameterPolicy) -> Self {
        self.parameters = parameters;
        self
    }
}

impl TryFrom<RawServiceDef> for ServiceDef {
    type Error = MetadataError;

    fn try_from(raw: RawServiceDef) -> Result<Self, Self::Error> {
        let path: Vec<String> = match raw.service {
            RawPath::Joined(s) => s.split('/').map(str::to_string).collect(),
            RawPath::Segments(v) => v,
        }
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

        let action = raw.action.trim().to_string();
        if action.is_empty() {
            return Err(MetadataError::InvalidService(
                "action cannot be empty".into(),
            ));
        }

        let key = match (raw.key, raw.keys) {
            (Some(_), Some(_)) => {
                return Err(MetadataError::InvalidKey(
                    "service cannot declare both 'key' and 'keys'".into(),
                ))
            }
            (Some(Value::Null), None) | (None, None) => None,
            (Some(key), None) => Some(KeySpec::from_value(&key)?),
            (None, Some(keys)) => Some(KeySpec::candidates_from_values(&keys)?),
        };

        Ok(ServiceDef {
            path,
            action,
            key,
            parameters: raw.parameters.try_into()?,
        })
    }
}

/// Form variant declared by `forms.<id>.type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormType {
    Tabs,
    Container,
    Input,
    Other(String),
}

impl FormType {
    /// Parse a form type name (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tabs" => FormType::Tabs,
            "container" => FormType::Container,
            "input" => FormType::Input,
            _ => FormType::Other(s.to_string()),
        }
    }

    /// Canonical name.
    pub fn name(&self) -> &str {
        match self {
            FormType::Tabs => "tabs",
            FormType::Container => "container",
            FormType::Input => "input",
            FormType::Other(s) => s,
        }
    }
}

impl std::fmt::Display for FormType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl<'de> Deserialize<'de> for FormType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FormType::parse(&s))
    }
}

/// A child widget declared inside a form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WidgetDef {
    /// Widget kind (`field`, `group`, `toolbar`, `form`, `button`, ...)
    #[serde(rename = "type")]
    pub widget_type: String,
    /// Display label
    pub label: Option<String>,
    /// Child ids, in display order (groups and toolbars)
    pub layout: Vec<String>,
    /// Services this widget triggers
    pub services: Vec<String>,
    /// Bound field id (fields; defaults to the child id)
    pub field: Option<String>,
    /// Referenced form id (nested forms)
    pub form: Option<String>,
    /// Allocator for groups: `stacked`, `grid`, or `tabs`
    pub arrange: Option<String>,
    /// Stacking axis for stacked groups: `vertical` or `horizontal`
    pub orientation: Option<String>,
}

/// Form definition from the `forms` document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormDef {
    /// Form variant
    #[serde(rename = "type")]
    pub form_type: FormType,
    /// Form title
    #[serde(default)]
    pub title: Option<String>,
    /// Top-level child ids, in display order
    #[serde(default)]
    pub layout: Vec<String>,
    /// Child widget definitions by id
    #[serde(default)]
    pub widgets: BTreeMap<String, WidgetDef>,
}

fn parse_field_id(s: &str) -> Result<FieldId, MetadataError> {
    FieldId::new(s).map_err(|e| MetadataError::InvalidKey(e.to_string()))
}
