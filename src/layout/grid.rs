//! layout::grid
//!
//! Row explosion onto a grid.
//!
//! Each child explodes into rows:
//!
//! - a plain widget is one 1-cell row
//! - a field is one 2-cell row: label, control
//! - a group is a 1-cell label row (when it has a label) followed by a
//!   1-cell row holding its container
//!
//! The widest row decides the column count. A one-column result falls back
//! to a stacked layout. Otherwise rows are laid onto the grid and a short
//! row's first cell spans the remaining width, so every row covers all
//! columns.

use super::{
    Cell, ChildRole, Container, Displayable, LayoutAllocator, LayoutItem, Orientation, Stacked,
};

/// One exploded row: 1 or 2 cells.
pub type Row = Vec<Displayable>;

/// Explode one child into its rows.
///
/// Children without a displayable produce no rows.
pub fn explode(child: &LayoutItem) -> Vec<Row> {
    let Some(displayable) = child.displayable.clone() else {
        return Vec::new();
    };
    match child.role {
        ChildRole::Plain => vec![vec![displayable]],
        ChildRole::Field => vec![vec![child.label_or_id(), displayable]],
        ChildRole::Group => {
            let mut rows = Vec::with_capacity(2);
            // An unlabelled group is a single row: no empty label row.
            if let Some(label) = child.label_displayable.clone() {
                rows.push(vec![label]);
            }
            rows.push(vec![displayable]);
            rows
        }
    }
}

/// Grid allocator.
///
/// `orientation` applies only to the stacked fallback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grid {
    orientation: Orientation,
}

impl Grid {
    pub fn new(orientation: Orientation) -> Self {
        Self { orientation }
    }
}

impl LayoutAllocator for Grid {
    fn name(&self) -> &'static str {
        "grid"
    }

    fn arrange(&self, children: &[LayoutItem], container: &mut Container) -> bool {
        let rows: Vec<Row> = children.iter().flat_map(explode).collect();
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);

        if columns <= 1 {
            let items = rows.into_iter().flatten().collect();
            return Stacked::new(self.orientation).place(items, container);
        }

        let mut cells = Vec::new();
        for (row_index, row) in rows.into_iter().enumerate() {
            let len = row.len();
            let mut column = 0;
            for (cell_index, item) in row.into_iter().enumerate() {
                let span = if cell_index == 0 && len < columns {
                    columns - len + 1
                } else {
                    1
                };
                cells.push(Cell {
                    row: row_index,
                    column,
                    span,
                    item,
                });
                column += span;
            }
        }

        *container = Container::Grid { columns, cells };
        true
    }
}
