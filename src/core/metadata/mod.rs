//! core::metadata
//!
//! Metadata documents and the values they back.
//!
//! # Modules
//!
//! - [`schema`] - Field, service, and form definitions
//! - [`store`] - Field Value Store (current values plus original snapshot)
//!
//! # Documents
//!
//! A metadata bundle is one JSON object with three maps:
//!
//! ```json
//! {
//!   "fields":   { "user:id": { "type": "integer", "key": true } },
//!   "services": { "read": { "service": ["users"], "action": "read", "key": "user:id" } },
//!   "forms":    { "user": { "type": "input", "layout": ["id"], "widgets": { "id": { "type": "field" } } } }
//! }
//! ```
//!
//! Every map is optional; a missing map is empty.
//!
//! # Example
//!
//! ```
//! use formweave::core::metadata::parse_metadata;
//!
//! let meta = parse_metadata(r#"{
//!     "services": { "read": { "service": ["users"], "action": "read", "key": "user:id" } }
//! }"#).unwrap();
//! assert!(meta.service("read").is_some());
//! assert!(meta.service("write").is_none());
//! ```

pub mod schema;
pub mod store;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::core::types::{FieldId, ServiceId};

pub use schema::{
    Allow, FieldDef, FormDef, FormType, KeyShape, KeySpec, ParameterPolicy, ServiceDef, WidgetDef,
};
pub use store::FieldValueStore;

/// Errors from metadata operations.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse metadata: {0}")]
    ParseError(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid parameter policy: {0}")]
    InvalidParameters(String),

    #[error("invalid service: {0}")]
    InvalidService(String),

    #[error("unknown form: {0}")]
    UnknownForm(String),

    #[error("form '{form}' references unknown widget '{widget}'")]
    UnknownWidget { form: String, widget: String },

    #[error("form '{form}' contains a layout cycle through '{widget}'")]
    LayoutCycle { form: String, widget: String },
}

/// A parsed metadata bundle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Field definitions by id
    pub fields: BTreeMap<FieldId, FieldDef>,
    /// Service definitions by id
    pub services: BTreeMap<ServiceId, ServiceDef>,
    /// Form definitions by id
    pub forms: BTreeMap<String, FormDef>,
}

impl Metadata {
    /// Load a metadata bundle from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError::ReadError` if the file cannot be read, or
    /// `MetadataError::ParseError` if it is not a valid bundle.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let content = fs::read_to_string(path).map_err(|e| MetadataError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        parse_metadata(&content)
    }

    /// Look up a service definition.
    pub fn service(&self, id: &str) -> Option<&ServiceDef> {
        self.services.get(id)
    }

    /// Look up a field definition.
    pub fn field(&self, id: &FieldId) -> Option<&FieldDef> {
        self.fields.get(id)
    }

    /// Look up a form definition.
    pub fn form(&self, id: &str) -> Option<&FormDef> {
        self.forms.get(id)
    }

    /// Field ids flagged `key: true`, in id order.
    pub fn key_fields(&self) -> Vec<&FieldId> {
        self.fields
            .iter()
            .filter(|(_, def)| def.key)
            .map(|(id, _)| id)
            .collect()
    }
}

/// Parse a metadata bundle from JSON.
///
/// # Errors
///
/// Returns `MetadataError::ParseError` with the underlying message; shape
/// errors inside service definitions (bad keys, bad references) surface here.
pub fn parse_metadata(json: &str) -> Result<Metadata, MetadataError> {
    serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))
}
