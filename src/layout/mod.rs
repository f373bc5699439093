//! layout
//!
//! Container model and the three layout allocators.
//!
//! # Architecture
//!
//! Widgets are opaque to the allocators. A widget describes itself to its
//! parent as a [`LayoutItem`]: its id, label, [`ChildRole`], and the
//! [`Displayable`] handles it can contribute. An allocator takes the ordered
//! items of a group and populates a [`Container`].
//!
//! Every allocator overwrites the container wholesale, so re-running one
//! over the same items yields the same container.
//!
//! # Modules
//!
//! - `stacked`: Single-axis layout
//! - `grid`: Row explosion onto a one or two column grid
//! - `tabs`: One page per child
//!
//! # Example
//!
//! ```
//! use formweave::layout::{ChildRole, Container, Displayable, Grid, LayoutAllocator, LayoutItem};
//!
//! let items = vec![
//!     LayoutItem::new("name", ChildRole::Field)
//!         .with_label("Name")
//!         .with_displayable(Displayable::control("name", "field-editor")),
//!     LayoutItem::new("save", ChildRole::Plain)
//!         .with_displayable(Displayable::control("save", "button")),
//! ];
//!
//! let mut container = Container::new();
//! assert!(Grid::default().arrange(&items, &mut container));
//! assert_eq!(container.columns(), Some(2));
//! ```

mod grid;
mod stacked;
mod tabs;

pub use grid::{explode, Grid, Row};
pub use stacked::Stacked;
pub use tabs::Tabs;

use serde::Serialize;

/// Axis of a stacked layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

impl Orientation {
    /// Parse an orientation option; anything but `horizontal` is vertical.
    pub fn parse(s: &str) -> Self {
        match s {
            "horizontal" => Orientation::Horizontal,
            _ => Orientation::Vertical,
        }
    }
}

/// An opaque displayable handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum Displayable {
    /// A rendered control, owned by the host toolkit.
    Control { id: String, kind: String },
    /// A text label.
    Label { text: String },
    /// A nested, already arranged container.
    Container { id: String, container: Container },
}

impl Displayable {
    /// A control handle.
    pub fn control(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Displayable::Control {
            id: id.into(),
            kind: kind.into(),
        }
    }

    /// A label handle.
    pub fn label(text: impl Into<String>) -> Self {
        Displayable::Label { text: text.into() }
    }
}

/// One grid cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub row: usize,
    pub column: usize,
    pub span: usize,
    pub item: Displayable,
}

/// One tab page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub label: String,
    pub content: Displayable,
}

/// A container populated by an allocator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "layout", rename_all = "lowercase")]
pub enum Container {
    /// Nothing arranged yet.
    #[default]
    Empty,
    /// Items along one axis.
    Stack {
        orientation: Orientation,
        items: Vec<Displayable>,
    },
    /// Cells on a grid.
    Grid { columns: usize, cells: Vec<Cell> },
    /// One page per child.
    Tabs { pages: Vec<Page> },
}

impl Container {
    /// An empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of top-level entries (items, cells, or pages).
    pub fn len(&self) -> usize {
        match self {
            Container::Empty => 0,
            Container::Stack { items, .. } => items.len(),
            Container::Grid { cells, .. } => cells.len(),
            Container::Tabs { pages } => pages.len(),
        }
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column count of a grid container.
    pub fn columns(&self) -> Option<usize> {
        match self {
            Container::Grid { columns, .. } => Some(*columns),
            _ => None,
        }
    }

    /// Short name of the container layout.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Container::Empty => "empty",
            Container::Stack { .. } => "stack",
            Container::Grid { .. } => "grid",
            Container::Tabs { .. } => "tabs",
        }
    }
}

/// How a child takes part in layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildRole {
    /// A plain widget: one cell.
    Plain,
    /// A field: label plus control.
    Field,
    /// A group-like container: its label above its container.
    Group,
}

/// What a child contributes to its parent's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutItem {
    pub id: String,
    pub label: Option<String>,
    pub role: ChildRole,
    pub label_displayable: Option<Displayable>,
    pub displayable: Option<Displayable>,
}

impl LayoutItem {
    /// An item with no label and nothing to display.
    pub fn new(id: impl Into<String>, role: ChildRole) -> Self {
        Self {
            id: id.into(),
            label: None,
            role,
            label_displayable: None,
            displayable: None,
        }
    }

    /// Set the label, and a label displayable showing it.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label_displayable = Some(Displayable::label(label.clone()));
        self.label = Some(label);
        self
    }

    /// Set the main displayable.
    pub fn with_displayable(mut self, displayable: Displayable) -> Self {
        self.displayable = Some(displayable);
        self
    }

    /// Label displayable, falling back to a label showing the id.
    pub(crate) fn label_or_id(&self) -> Displayable {
        self.label_displayable
            .clone()
            .unwrap_or_else(|| Displayable::label(self.id.clone()))
    }
}

/// A layout strategy.
pub trait LayoutAllocator {
    /// Short name of the strategy.
    fn name(&self) -> &'static str;

    /// Populate `container` from `children`, replacing its contents.
    ///
    /// Returns true iff at least one child was placed.
    fn arrange(&self, children: &[LayoutItem], container: &mut Container) -> bool;
}

/// Allocator selection by name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Arrange {
    Stacked,
    #[default]
    Grid,
    Tabs,
}

impl Arrange {
    /// Parse an arrange option; unknown names fall back to the grid.
    pub fn parse(s: &str) -> Self {
        match s {
            "stacked" | "stack" => Arrange::Stacked,
            "tabs" => Arrange::Tabs,
            _ => Arrange::Grid,
        }
    }

    /// Build the allocator.
    pub fn allocator(self, orientation: Orientation) -> Box<dyn LayoutAllocator + Send + Sync> {
        match self {
            Arrange::Stacked => Box::new(Stacked::new(orientation)),
            Arrange::Grid => Box::new(Grid::new(orientation)),
            Arrange::Tabs => Box::new(Tabs),
        }
    }
}
