//! layout::tabs
//!
//! One page per child.

use super::{Container, LayoutAllocator, LayoutItem, Page};

/// Wraps each child in its own page, labelled with the child's label or id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tabs;

impl LayoutAllocator for Tabs {
    fn name(&self) -> &'static str {
        "tabs"
    }

    fn arrange(&self, children: &[LayoutItem], container: &mut Container) -> bool {
        let pages: Vec<Page> = children
            .iter()
            .filter_map(|child| {
                let content = child.displayable.clone()?;
                Some(Page {
                    label: child.label.clone().unwrap_or_else(|| child.id.clone()),
                    content,
                })
            })
            .collect();
        let placed = !pages.is_empty();
        *container = Container::Tabs { pages };
        placed
    }
}
