//! widget::entity
//!
//! Entities: the typed description a widget is built from.
//!
//! # Design
//!
//! An entity's kind is a closed enum; the factory matches on it. Kind
//! strings from metadata that name nothing known become
//! [`EntityKind::Unknown`] and yield no widget rather than an error.
//!
//! [`Entity::from_form`] turns a form document into an entity tree. Group
//! and toolbar children are looked up by id in the same form's `widgets`
//! map; a nested `form` widget pulls in another form. Missing references
//! and cycles are reported as errors.

use std::collections::BTreeSet;

use crate::core::metadata::{FormDef, FormType, Metadata, MetadataError, WidgetDef};
use crate::core::types::FieldId;
use crate::layout::{Arrange, Orientation};
use crate::registry::Registry;

/// Kinds of generic widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetType {
    Button,
    Label,
    List,
    Table,
}

impl WidgetType {
    /// Parse a widget type name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "button" => Some(WidgetType::Button),
            "label" => Some(WidgetType::Label),
            "list" => Some(WidgetType::List),
            "table" => Some(WidgetType::Table),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WidgetType::Button => "button",
            WidgetType::Label => "label",
            WidgetType::List => "list",
            WidgetType::Table => "table",
        }
    }
}

/// Group-like container kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Group,
    Toolbar,
}

impl GroupKind {
    pub fn name(&self) -> &'static str {
        match self {
            GroupKind::Group => "group",
            GroupKind::Toolbar => "toolbar",
        }
    }
}

/// Layout options of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOptions {
    /// Allocator to arrange children with (default grid)
    pub arrange: Arrange,
    /// Axis for stacked layouts (default vertical)
    pub orientation: Orientation,
}

impl GroupOptions {
    fn from_def(def: &WidgetDef) -> Self {
        Self {
            arrange: def.arrange.as_deref().map(Arrange::parse).unwrap_or_default(),
            orientation: def
                .orientation
                .as_deref()
                .map(Orientation::parse)
                .unwrap_or_default(),
        }
    }
}

/// What an entity is.
#[derive(Debug, Clone)]
pub enum EntityKind {
    /// A field editor bound to a metadata field.
    Field { field: Option<FieldId> },
    /// A form with its own children.
    Form {
        form_type: FormType,
        children: Vec<Entity>,
    },
    /// A generic widget.
    Widget(WidgetType),
    /// A group-like container.
    Group {
        kind: GroupKind,
        options: GroupOptions,
        children: Vec<Entity>,
    },
    /// A kind string nothing knows how to build.
    Unknown(String),
}

impl EntityKind {
    /// Short name of the kind.
    pub fn name(&self) -> &str {
        match self {
            EntityKind::Field { .. } => "field",
            EntityKind::Form { .. } => "form",
            EntityKind::Widget(widget_type) => widget_type.name(),
            EntityKind::Group { kind, .. } => kind.name(),
            EntityKind::Unknown(name) => name,
        }
    }
}

/// A buildable entity.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: String,
    pub label: Option<String>,
    pub kind: EntityKind,
    /// Registry handed to the widget built from this entity, if any.
    pub registry: Option<Registry>,
}

impl Entity {
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            label: None,
            kind,
            registry: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Child entities of forms and groups.
    pub fn children(&self) -> &[Entity] {
        match &self.kind {
            EntityKind::Form { children, .. } | EntityKind::Group { children, .. } => children,
            _ => &[],
        }
    }

    /// Build the entity tree of form `form_id`.
    ///
    /// # Errors
    ///
    /// - `UnknownForm` if the form (or a nested form) does not exist
    /// - `UnknownWidget` if a layout names a widget the form does not define
    /// - `LayoutCycle` if a group contains itself, directly or not
    pub fn from_form(metadata: &Metadata, form_id: &str) -> Result<Entity, MetadataError> {
        TreeBuilder {
            metadata,
            forms: BTreeSet::new(),
        }
        .form(form_id)
    }
}

struct TreeBuilder<'a> {
    metadata: &'a Metadata,
    /// Forms currently being expanded, for cycle detection.
    forms: BTreeSet<String>,
}

impl TreeBuilder<'_> {
    fn form(&mut self, form_id: &str) -> Result<Entity, MetadataError> {
        let metadata = self.metadata;
        let form = metadata
            .form(form_id)
            .ok_or_else(|| MetadataError::UnknownForm(form_id.to_string()))?;
        if !self.forms.insert(form_id.to_string()) {
            return Err(MetadataError::LayoutCycle {
                form: form_id.to_string(),
                widget: form_id.to_string(),
            });
        }

        let mut path = Vec::new();
        let children = self.children(form_id, form, &form.layout, &mut path)?;
        self.forms.remove(form_id);

        let mut entity = Entity::new(
            form_id,
            EntityKind::Form {
                form_type: form.form_type.clone(),
                children,
            },
        );
        entity.label = form.title.clone();
        Ok(entity)
    }

    fn children(
        &mut self,
        form_id: &str,
        form: &FormDef,
        layout: &[String],
        path: &mut Vec<String>,
    ) -> Result<Vec<Entity>, MetadataError> {
        layout
            .iter()
            .map(|child_id| self.widget(form_id, form, child_id, path))
            .collect()
    }

    fn widget(
        &mut self,
        form_id: &str,
        form: &FormDef,
        widget_id: &str,
        path: &mut Vec<String>,
    ) -> Result<Entity, MetadataError> {
        let def = form
            .widgets
            .get(widget_id)
            .ok_or_else(|| MetadataError::UnknownWidget {
                form: form_id.to_string(),
                widget: widget_id.to_string(),
            })?;
        if path.iter().any(|id| id == widget_id) {
            return Err(MetadataError::LayoutCycle {
                form: form_id.to_string(),
                widget: widget_id.to_string(),
            });
        }

        let kind = match def.widget_type.as_str() {
            "field" => {
                let raw = def.field.as_deref().unwrap_or(widget_id);
                EntityKind::Field {
                    field: FieldId::new(raw).ok(),
                }
            }
            "group" | "toolbar" => {
                let kind = if def.widget_type == "toolbar" {
                    GroupKind::Toolbar
                } else {
                    GroupKind::Group
                };
                path.push(widget_id.to_string());
                let children = self.children(form_id, form, &def.layout, path);
                path.pop();
                EntityKind::Group {
                    kind,
                    options: GroupOptions::from_def(def),
                    children: children?,
                }
            }
            "form" => {
                let nested = def.form.as_deref().unwrap_or(widget_id);
                let mut entity = self.form(nested)?;
                entity.id = widget_id.to_string();
                if def.label.is_some() {
                    entity.label = def.label.clone();
                }
                return Ok(entity);
            }
            other => match WidgetType::parse(other) {
                Some(widget_type) => EntityKind::Widget(widget_type),
                None => EntityKind::Unknown(other.to_string()),
            },
        };

        let label = def.label.clone().or_else(|| self.field_label(&kind));
        let mut entity = Entity::new(widget_id, kind);
        entity.label = label;
        Ok(entity)
    }

    fn field_label(&self, kind: &EntityKind) -> Option<String> {
        match kind {
            EntityKind::Field { field: Some(id) } => {
                self.metadata.field(id).and_then(|def| def.label.clone())
            }
            _ => None,
        }
    }
}
