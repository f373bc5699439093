//! widget::widgets
//!
//! The widget trait and the concrete widget kinds.
//!
//! Container-like widgets (forms, groups, toolbars) own their children and
//! arrange them once on construction. [`Widget::layout_item`] is how any
//! widget describes itself to its parent's allocator.

use crate::core::metadata::FormType;
use crate::core::types::FieldId;
use crate::layout::{
    Arrange, ChildRole, Container, Displayable, LayoutAllocator, LayoutItem, Orientation,
};
use crate::registry::Registry;

use super::entity::{GroupKind, GroupOptions};

/// A live widget.
pub trait Widget: Send {
    /// Entity id the widget was built from.
    fn id(&self) -> &str;

    /// Display label.
    fn label(&self) -> Option<&str>;

    /// Short name of the widget kind (e.g. "button", "form").
    fn kind_name(&self) -> &'static str;

    /// How the widget takes part in its parent's layout.
    fn role(&self) -> ChildRole {
        ChildRole::Plain
    }

    /// Registry the widget resolves dependencies from.
    fn registry(&self) -> Option<&Registry>;

    /// Attach the registry.
    fn set_registry(&mut self, registry: Registry);

    /// The main displayable.
    fn displayable(&self) -> Option<Displayable>;

    /// A displayable for the widget's label.
    fn label_displayable(&self) -> Option<Displayable> {
        self.label().map(Displayable::label)
    }

    /// Owned child widgets, in layout order.
    fn children(&self) -> &[Box<dyn Widget>] {
        &[]
    }

    /// What the widget contributes to its parent's layout.
    fn layout_item(&self) -> LayoutItem {
        LayoutItem {
            id: self.id().to_string(),
            label: self.label().map(str::to_string),
            role: self.role(),
            label_displayable: self.label_displayable(),
            displayable: self.displayable(),
        }
    }
}

impl std::fmt::Debug for dyn Widget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Widget")
            .field("id", &self.id())
            .field("kind", &self.kind_name())
            .field("children", &self.children().len())
            .finish()
    }
}

/// Fields every widget carries.
#[derive(Debug, Clone)]
struct Base {
    id: String,
    label: Option<String>,
    registry: Option<Registry>,
}

impl Base {
    fn new(id: &str, label: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            label: label.map(str::to_string),
            registry: None,
        }
    }
}

macro_rules! base_accessors {
    () => {
        fn id(&self) -> &str {
            &self.base.id
        }

        fn label(&self) -> Option<&str> {
            self.base.label.as_deref()
        }

        fn registry(&self) -> Option<&Registry> {
            self.base.registry.as_ref()
        }

        fn set_registry(&mut self, registry: Registry) {
            self.base.registry = Some(registry);
        }
    };
}

fn arrange_children(
    children: &[Box<dyn Widget>],
    allocator: &dyn LayoutAllocator,
) -> Container {
    let items: Vec<LayoutItem> = children.iter().map(|child| child.layout_item()).collect();
    let mut container = Container::new();
    allocator.arrange(&items, &mut container);
    container
}

/// Editor bound to one field.
#[derive(Debug)]
pub struct FieldEditor {
    base: Base,
    field: Option<FieldId>,
    parent: Option<String>,
}

impl FieldEditor {
    pub fn new(id: &str, label: Option<&str>, field: Option<FieldId>, parent: Option<&str>) -> Self {
        Self {
            base: Base::new(id, label),
            field,
            parent: parent.map(str::to_string),
        }
    }

    /// The bound field.
    pub fn field(&self) -> Option<&FieldId> {
        self.field.as_ref()
    }

    /// Id of the enclosing group or form.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

impl Widget for FieldEditor {
    base_accessors!();

    fn kind_name(&self) -> &'static str {
        "field"
    }

    fn role(&self) -> ChildRole {
        ChildRole::Field
    }

    fn displayable(&self) -> Option<Displayable> {
        Some(Displayable::control(&self.base.id, "field-editor"))
    }
}

/// A push button.
#[derive(Debug)]
pub struct Button {
    base: Base,
}

impl Button {
    pub fn new(id: &str, label: Option<&str>) -> Self {
        Self {
            base: Base::new(id, label),
        }
    }
}

impl Widget for Button {
    base_accessors!();

    fn kind_name(&self) -> &'static str {
        "button"
    }

    fn displayable(&self) -> Option<Displayable> {
        Some(Displayable::control(&self.base.id, "button"))
    }
}

/// The form variants that have a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormVariant {
    Tabs,
    Container,
    Input,
}

impl FormVariant {
    /// Map a declared form type; other types have no widget.
    pub fn from_form_type(form_type: &FormType) -> Option<Self> {
        match form_type {
            FormType::Tabs => Some(FormVariant::Tabs),
            FormType::Container => Some(FormVariant::Container),
            FormType::Input => Some(FormVariant::Input),
            FormType::Other(_) => None,
        }
    }

    /// Allocator used for the form's children.
    pub fn arrange(&self) -> Arrange {
        match self {
            FormVariant::Tabs => Arrange::Tabs,
            FormVariant::Container => Arrange::Stacked,
            FormVariant::Input => Arrange::Grid,
        }
    }
}

/// A form and its arranged children.
#[derive(Debug)]
pub struct FormWidget {
    base: Base,
    variant: FormVariant,
    children: Vec<Box<dyn Widget>>,
    container: Container,
}

impl FormWidget {
    pub fn new(
        id: &str,
        title: Option<&str>,
        variant: FormVariant,
        children: Vec<Box<dyn Widget>>,
    ) -> Self {
        let allocator = variant.arrange().allocator(Orientation::Vertical);
        let container = arrange_children(&children, allocator.as_ref());
        Self {
            base: Base::new(id, title),
            variant,
            children,
            container,
        }
    }

    pub fn variant(&self) -> FormVariant {
        self.variant
    }

    /// The arranged container.
    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl Widget for FormWidget {
    base_accessors!();

    fn kind_name(&self) -> &'static str {
        "form"
    }

    fn role(&self) -> ChildRole {
        ChildRole::Group
    }

    fn displayable(&self) -> Option<Displayable> {
        Some(Displayable::Container {
            id: self.base.id.clone(),
            container: self.container.clone(),
        })
    }

    fn children(&self) -> &[Box<dyn Widget>] {
        &self.children
    }
}

/// A group or toolbar owning a layout allocator.
pub struct ContainerWidget {
    base: Base,
    kind: GroupKind,
    options: GroupOptions,
    allocator: Box<dyn LayoutAllocator + Send + Sync>,
    children: Vec<Box<dyn Widget>>,
    container: Container,
}

impl std::fmt::Debug for ContainerWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerWidget")
            .field("id", &self.base.id)
            .field("kind", &self.kind)
            .field("allocator", &self.allocator.name())
            .field("children", &self.children.len())
            .finish()
    }
}

impl ContainerWidget {
    pub fn new(
        id: &str,
        label: Option<&str>,
        kind: GroupKind,
        options: GroupOptions,
        children: Vec<Box<dyn Widget>>,
    ) -> Self {
        let allocator = options.arrange.allocator(options.orientation);
        let container = arrange_children(&children, allocator.as_ref());
        Self {
            base: Base::new(id, label),
            kind,
            options,
            allocator,
            children,
            container,
        }
    }

    pub fn group_kind(&self) -> GroupKind {
        self.kind
    }

    pub fn options(&self) -> GroupOptions {
        self.options
    }

    /// The arranged container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Re-run the allocator over the children.
    ///
    /// Returns true iff at least one child was placed.
    pub fn rearrange(&mut self) -> bool {
        let items: Vec<LayoutItem> = self.children.iter().map(|c| c.layout_item()).collect();
        self.allocator.arrange(&items, &mut self.container)
    }
}

impl Widget for ContainerWidget {
    base_accessors!();

    fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    fn role(&self) -> ChildRole {
        ChildRole::Group
    }

    fn displayable(&self) -> Option<Displayable> {
        Some(Displayable::Container {
            id: self.base.id.clone(),
            container: self.container.clone(),
        })
    }

    fn children(&self) -> &[Box<dyn Widget>] {
        &self.children
    }
}
