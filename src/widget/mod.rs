//! widget
//!
//! Widget Composition Factory: entities in, arranged widgets out.
//!
//! # Modules
//!
//! - `entity`: Typed entities and the form-to-entity-tree builder
//! - `widgets`: The `Widget` trait and concrete widgets
//! - `factory`: Dispatch from entity kind to widget
//!
//! # Example
//!
//! ```
//! use formweave::core::metadata::parse_metadata;
//! use formweave::registry::Registry;
//! use formweave::widget::{Entity, WidgetFactory};
//!
//! let meta = parse_metadata(r#"{
//!     "forms": { "login": {
//!         "type": "input",
//!         "layout": ["user", "go"],
//!         "widgets": {
//!             "user": { "type": "field", "field": "login:user", "label": "User" },
//!             "go":   { "type": "button", "label": "Sign in" }
//!         }
//!     } }
//! }"#).unwrap();
//!
//! let entity = Entity::from_form(&meta, "login").unwrap();
//! let form = WidgetFactory::new(Registry::new()).create(&entity, None).unwrap();
//! assert_eq!(form.kind_name(), "form");
//! assert_eq!(form.children().len(), 2);
//! ```

mod entity;
mod factory;
mod widgets;

pub use entity::{Entity, EntityKind, GroupKind, GroupOptions, WidgetType};
pub use factory::WidgetFactory;
pub use widgets::{Button, ContainerWidget, FieldEditor, FormVariant, FormWidget, Widget};
