//! widget::factory
//!
//! Widget Composition Factory.
//!
//! # Design
//!
//! Dispatch is a match on [`EntityKind`]. Kinds without a widget (unknown
//! kind strings, reserved widget types, unsupported form types) produce
//! `None` and a trace event; that is a normal outcome, not an error.
//!
//! Every widget built here gets a registry: the entity's own if it carries
//! one, otherwise the factory's.

use std::collections::BTreeMap;

use tracing::trace;

use crate::registry::Registry;

use super::entity::{Entity, EntityKind, WidgetType};
use super::widgets::{Button, ContainerWidget, FieldEditor, FormVariant, FormWidget, Widget};

/// Builds widgets from entities.
#[derive(Debug, Clone)]
pub struct WidgetFactory {
    registry: Registry,
}

impl WidgetFactory {
    /// Create a factory whose registry is inherited by entities without one.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// The factory's registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build the widget for one entity.
    ///
    /// `parent` is the enclosing group or form, if any. Returns `None` when
    /// the entity's kind has no widget.
    pub fn create(&self, entity: &Entity, parent: Option<&Entity>) -> Option<Box<dyn Widget>> {
        let label = entity.label.as_deref();
        let mut widget: Box<dyn Widget> = match &entity.kind {
            EntityKind::Field { field } => Box::new(FieldEditor::new(
                &entity.id,
                label,
                field.clone(),
                parent.map(|p| p.id.as_str()),
            )),
            EntityKind::Form {
                form_type,
                children,
            } => {
                let Some(variant) = FormVariant::from_form_type(form_type) else {
                    trace!(entity = %entity.id, form_type = %form_type, "no widget for form type");
                    return None;
                };
                let children = self.create_children(children, entity);
                Box::new(FormWidget::new(&entity.id, label, variant, children))
            }
            EntityKind::Widget(WidgetType::Button) => Box::new(Button::new(&entity.id, label)),
            EntityKind::Widget(widget_type) => {
                trace!(entity = %entity.id, widget_type = widget_type.name(), "widget type not implemented");
                return None;
            }
            EntityKind::Group {
                kind,
                options,
                children,
            } => {
                let children = self.create_children(children, entity);
                Box::new(ContainerWidget::new(
                    &entity.id, label, *kind, *options, children,
                ))
            }
            EntityKind::Unknown(kind) => {
                trace!(entity = %entity.id, kind = %kind, "no widget for kind");
                return None;
            }
        };

        let registry = entity
            .registry
            .clone()
            .unwrap_or_else(|| self.registry.clone());
        widget.set_registry(registry);
        Some(widget)
    }

    /// Build one widget per entity, keyed by entity id.
    ///
    /// Entities without a widget are skipped. Returns `None` if nothing was
    /// built.
    pub fn create_all(
        &self,
        entities: &[Entity],
        parent: Option<&Entity>,
    ) -> Option<BTreeMap<String, Box<dyn Widget>>> {
        let widgets: BTreeMap<String, Box<dyn Widget>> = entities
            .iter()
            .filter_map(|entity| {
                self.create(entity, parent)
                    .map(|widget| (entity.id.clone(), widget))
            })
            .collect();
        if widgets.is_empty() {
            None
        } else {
            Some(widgets)
        }
    }

    /// Children in declared order, skipping those without a widget.
    fn create_children(&self, children: &[Entity], parent: &Entity) -> Vec<Box<dyn Widget>> {
        children
            .iter()
            .filter_map(|child| self.create(child, Some(parent)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::FormType;
    use crate::layout::{ChildRole, Container};
    use crate::widget::entity::{GroupKind, GroupOptions};

    fn factory() -> WidgetFactory {
        WidgetFactory::new(Registry::new())
    }

    fn field(id: &str) -> Entity {
        Entity::new(id, EntityKind::Field { field: None }).with_label(id)
    }

    mod dispatch {
        use super::*;

        #[test]
        fn field_editor() {
            let widget = factory().create(&field("name"), None).unwrap();
            assert_eq!(widget.kind_name(), "field");
            assert_eq!(widget.role(), ChildRole::Field);
        }

        #[test]
        fn button() {
            let entity = Entity::new("ok", EntityKind::Widget(WidgetType::Button));
            assert_eq!(factory().create(&entity, None).unwrap().kind_name(), "button");
        }

        #[test]
        fn reserved_widget_types_yield_none() {
            for widget_type in [WidgetType::Label, WidgetType::List, WidgetType::Table] {
                let entity = Entity::new("x", EntityKind::Widget(widget_type));
                assert!(factory().create(&entity, None).is_none());
            }
        }

        #[test]
        fn unknown_kind_yields_none() {
            let entity = Entity::new("x", EntityKind::Unknown("chart".into()));
            assert!(factory().create(&entity, None).is_none());
        }

        #[test]
        fn unsupported_form_type_yields_none() {
            let entity = Entity::new(
                "f",
                EntityKind::Form {
                    form_type: FormType::Other("wizard".into()),
                    children: vec![],
                },
            );
            assert!(factory().create(&entity, None).is_none());
        }

        #[test]
        fn group_arranges_children_and_skips_failures() {
            let entity = Entity::new(
                "g",
                EntityKind::Group {
                    kind: GroupKind::Group,
                    options: GroupOptions::default(),
                    children: vec![
                        field("a"),
                        Entity::new("x", EntityKind::Unknown("chart".into())),
                        field("b"),
                    ],
                },
            );
            let widget = factory().create(&entity, None).unwrap();
            assert_eq!(widget.children().len(), 2);
            let Some(crate::layout::Displayable::Container { container, .. }) = widget.displayable()
            else {
                panic!("expected a container displayable");
            };
            assert!(matches!(container, Container::Grid { columns: 2, .. }));
        }
    }

    mod registry {
        use super::*;

        #[test]
        fn inherits_factory_registry() {
            let factory = factory();
            let widget = factory.create(&field("a"), None).unwrap();
            assert!(widget.registry().unwrap().ptr_eq(factory.registry()));
        }

        #[test]
        fn entity_registry_wins() {
            let own = Registry::new();
            let factory = factory();
            let entity = field("a").with_registry(own.clone());
            let widget = factory.create(&entity, None).unwrap();
            assert!(widget.registry().unwrap().ptr_eq(&own));
            assert!(!widget.registry().unwrap().ptr_eq(factory.registry()));
        }

        #[test]
        fn children_inherit_from_factory() {
            let factory = factory();
            let entity = Entity::new(
                "g",
                EntityKind::Group {
                    kind: GroupKind::Toolbar,
                    options: GroupOptions::default(),
                    children: vec![field("a")],
                },
            )
            .with_registry(Registry::new());
            let widget = factory.create(&entity, None).unwrap();
            let child = &widget.children()[0];
            assert!(child.registry().unwrap().ptr_eq(factory.registry()));
        }
    }

    mod collection {
        use super::*;

        #[test]
        fn map_of_built_widgets() {
            let entities = vec![
                field("a"),
                Entity::new("x", EntityKind::Unknown("chart".into())),
                field("b"),
            ];
            let widgets = factory().create_all(&entities, None).unwrap();
            assert_eq!(widgets.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        }

        #[test]
        fn none_when_nothing_built() {
            let entities = vec![Entity::new("x", EntityKind::Unknown("chart".into()))];
            assert!(factory().create_all(&entities, None).is_none());
            assert!(factory().create_all(&[], None).is_none());
        }
    }
}
