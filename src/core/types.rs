//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`FieldId`] - Validated field identifier (`entity:field` or bare `field`)
//! - [`FieldRef`] - Field reference pattern with `*` wildcards
//! - [`ServiceId`] - Validated service identifier
//!
//! # Validation
//!
//! These types enforce validity at construction time. A `FieldId` never
//! contains a wildcard; only a `FieldRef` may.
//!
//! # Examples
//!
//! ```
//! use formweave::core::types::{FieldId, FieldRef};
//!
//! let id = FieldId::new("user:name").unwrap();
//! assert_eq!(id.entity(), Some("user"));
//! assert_eq!(id.field(), "name");
//!
//! let pattern = FieldRef::parse("user:*").unwrap();
//! assert!(pattern.matches(&id));
//!
//! assert!(FieldId::new("user:*").is_err());
//! assert!(FieldId::new("").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid field id: {0}")]
    InvalidFieldId(String),

    #[error("invalid field reference: {0}")]
    InvalidFieldRef(String),

    #[error("invalid service id: {0}")]
    InvalidServiceId(String),
}

/// Separator between the entity and field segments.
pub const SEGMENT_SEPARATOR: char = ':';

/// Wildcard accepted on either segment of a [`FieldRef`].
pub const WILDCARD: &str = "*";

/// A validated field identifier.
///
/// Either qualified (`entity:field`) or bare (`field`). Neither segment
/// may be empty or contain a wildcard, and at most one separator is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldId(String);

impl FieldId {
    /// Create a new validated field id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFieldId` for empty segments, wildcards,
    /// or more than one `:` separator.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        if id.is_empty() {
            return Err(TypeError::InvalidFieldId("field id cannot be empty".into()));
        }
        if id.contains(WILDCARD) {
            return Err(TypeError::InvalidFieldId(format!(
                "field id cannot contain a wildcard: '{}'",
                id
            )));
        }
        let segments: Vec<&str> = id.split(SEGMENT_SEPARATOR).collect();
        if segments.len() > 2 {
            return Err(TypeError::InvalidFieldId(format!(
                "field id has more than one ':' separator: '{}'",
                id
            )));
        }
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(TypeError::InvalidFieldId(format!(
                "field id has an empty segment: '{}'",
                id
            )));
        }
        Ok(())
    }

    /// Entity segment, if the id is qualified.
    pub fn entity(&self) -> Option<&str> {
        self.0
            .split_once(SEGMENT_SEPARATOR)
            .map(|(entity, _)| entity)
    }

    /// Field segment.
    pub fn field(&self) -> &str {
        match self.0.split_once(SEGMENT_SEPARATOR) {
            Some((_, field)) => field,
            None => &self.0,
        }
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FieldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for FieldId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FieldId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FieldId> for String {
    fn from(id: FieldId) -> Self {
        id.0
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One segment of a [`FieldRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Matches any value (`*`).
    Any,
    /// Matches exactly this value.
    Exact(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == WILDCARD {
            Segment::Any
        } else {
            Segment::Exact(raw.to_string())
        }
    }

    fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Segment::Any => true,
            Segment::Exact(expected) => value == Some(expected.as_str()),
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Any => write!(f, "{}", WILDCARD),
            Segment::Exact(s) => write!(f, "{}", s),
        }
    }
}

/// A field reference pattern used by parameter allow/exclude lists.
///
/// The reference is split on `:`. An unqualified reference (`name`) is
/// treated as `*:name`, i.e. the entity segment is wildcarded.
///
/// # Example
///
/// ```
/// use formweave::core::types::{FieldId, FieldRef};
///
/// let bare = FieldRef::parse("name").unwrap();
/// assert!(bare.matches(&FieldId::new("user:name").unwrap()));
/// assert!(bare.matches(&FieldId::new("org:name").unwrap()));
/// assert!(!bare.matches(&FieldId::new("user:email").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldRef {
    entity: Segment,
    field: Segment,
}

impl FieldRef {
    /// Parse a reference of the form `entity:field`, `*:field`, `entity:*`, or `field`.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidFieldRef` for empty references, empty
    /// segments, or more than one separator.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TypeError::InvalidFieldRef(
                "field reference cannot be empty".into(),
            ));
        }
        let segments: Vec<&str> = raw.split(SEGMENT_SEPARATOR).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            return Err(TypeError::InvalidFieldRef(format!(
                "field reference has an empty segment: '{}'",
                raw
            )));
        }
        match segments.as_slice() {
            [field] => Ok(Self {
                entity: Segment::Any,
                field: Segment::parse(field),
            }),
            [entity, field] => Ok(Self {
                entity: Segment::parse(entity),
                field: Segment::parse(field),
            }),
            _ => Err(TypeError::InvalidFieldRef(format!(
                "field reference has more than one ':' separator: '{}'",
                raw
            ))),
        }
    }

    /// Check whether this reference matches a field id.
    ///
    /// A bare field id has no entity segment, so it only matches references
    /// whose entity segment is a wildcard.
    pub fn matches(&self, id: &FieldId) -> bool {
        self.entity.matches(id.entity()) && self.field.matches(Some(id.field()))
    }

    /// Entity segment of the reference.
    pub fn entity(&self) -> &Segment {
        &self.entity
    }

    /// Field segment of the reference.
    pub fn field(&self) -> &Segment {
        &self.field
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.entity, SEGMENT_SEPARATOR, self.field)
    }
}

impl TryFrom<String> for FieldRef {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldRef> for String {
    fn from(r: FieldRef) -> Self {
        r.to_string()
    }
}

/// A validated service identifier (key in the `services` metadata map).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceId(String);

impl ServiceId {
    /// Create a new validated service id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidServiceId` if the id is empty or blank.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TypeError::InvalidServiceId(
                "service id cannot be empty".into(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for ServiceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceId> for String {
    fn from(id: ServiceId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod field_id {
        use super::*;

        #[test]
        fn qualified() {
            let id = FieldId::new("user:name").unwrap();
            assert_eq!(id.entity(), Some("user"));
            assert_eq!(id.field(), "name");
            assert_eq!(id.as_str(), "user:name");
        }

        #[test]
        fn bare() {
            let id = FieldId::new("name").unwrap();
            assert_eq!(id.entity(), None);
            assert_eq!(id.field(), "name");
        }

        #[test]
        fn rejects_invalid() {
            assert!(FieldId::new("").is_err());
            assert!(FieldId::new(":name").is_err());
            assert!(FieldId::new("user:").is_err());
            assert!(FieldId::new("a:b:c").is_err());
            assert!(FieldId::new("user:*").is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let id = FieldId::new("user:name").unwrap();
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, "\"user:name\"");
            let parsed: FieldId = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, id);
        }

        #[test]
        fn serde_rejects_invalid() {
            let result: Result<FieldId, _> = serde_json::from_str("\"a:b:c\"");
            assert!(result.is_err());
        }
    }

    mod field_ref {
        use super::*;

        fn id(s: &str) -> FieldId {
            FieldId::new(s).unwrap()
        }

        #[test]
        fn exact_match() {
            let r = FieldRef::parse("user:name").unwrap();
            assert!(r.matches(&id("user:name")));
            assert!(!r.matches(&id("user:email")));
            assert!(!r.matches(&id("org:name")));
        }

        #[test]
        fn entity_wildcard() {
            let r = FieldRef::parse("*:name").unwrap();
            assert!(r.matches(&id("user:name")));
            assert!(r.matches(&id("org:name")));
            assert!(r.matches(&id("name")));
            assert!(!r.matches(&id("org:title")));
        }

        #[test]
        fn field_wildcard() {
            let r = FieldRef::parse("user:*").unwrap();
            assert!(r.matches(&id("user:name")));
            assert!(r.matches(&id("user:password")));
            assert!(!r.matches(&id("org:name")));
            assert!(!r.matches(&id("name")));
        }

        #[test]
        fn unqualified_wildcards_entity() {
            let r = FieldRef::parse("name").unwrap();
            assert_eq!(r.entity(), &Segment::Any);
            assert!(r.matches(&id("user:name")));
            assert!(r.matches(&id("name")));
        }

        #[test]
        fn full_wildcard() {
            let r = FieldRef::parse("*:*").unwrap();
            assert!(r.matches(&id("anything:here")));
            assert!(r.matches(&id("bare")));
        }

        #[test]
        fn rejects_invalid() {
            assert!(FieldRef::parse("").is_err());
            assert!(FieldRef::parse("user:").is_err());
            assert!(FieldRef::parse("a:b:c").is_err());
        }

        #[test]
        fn display() {
            assert_eq!(FieldRef::parse("name").unwrap().to_string(), "*:name");
            assert_eq!(FieldRef::parse("user:*").unwrap().to_string(), "user:*");
        }
    }

    mod service_id {
        use super::*;

        #[test]
        fn valid() {
            assert_eq!(ServiceId::new("read").unwrap().as_str(), "read");
        }

        #[test]
        fn rejects_blank() {
            assert!(ServiceId::new("").is_err());
            assert!(ServiceId::new("   ").is_err());
        }
    }
}
