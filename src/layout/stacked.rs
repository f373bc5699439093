//! layout::stacked
//!
//! Single-axis layout.

use super::{ChildRole, Container, Displayable, LayoutAllocator, LayoutItem, Orientation};

/// Appends children along one axis in declared order.
///
/// Field children are wrapped as a horizontal label+control pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stacked {
    orientation: Orientation,
}

impl Stacked {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }

    /// Place already built items along the configured axis.
    pub(crate) fn place(&self, items: Vec<Displayable>, container: &mut Container) -> bool {
        let placed = !items.is_empty();
        *container = Container::Stack {
            orientation: self.orientation,
            items,
        };
        placed
    }
}

fn field_pair(child: &LayoutItem, control: Displayable) -> Displayable {
    Displayable::Container {
        id: child.id.clone(),
        container: Container::Stack {
            orientation: Orientation::Horizontal,
            items: vec![child.label_or_id(), control],
        },
    }
}

impl LayoutAllocator for Stacked {
    fn name(&self) -> &'static str {
        "stacked"
    }

    fn arrange(&self, children: &[LayoutItem], container: &mut Container) -> bool {
        let items = children
            .iter()
            .filter_map(|child| {
                let displayable = child.displayable.clone()?;
                Some(match child.role {
                    ChildRole::Field => field_pair(child, displayable),
                    ChildRole::Plain | ChildRole::Group => displayable,
                })
            })
            .collect();
        self.place(items, container)
    }
}
