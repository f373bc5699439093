//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag. Arranged
//! widget trees render as an indented outline, one node per line:
//!
//! ```text
//! grid (2 columns)
//!   [0,0] label "Name"
//!   [0,1] control name (field-editor)
//!   [1,0 span 2] stack vertical
//!     control save (button)
//! ```

use std::fmt::{Display, Write};

use serde_json::Value;

use crate::core::metadata::store::FieldValues;
use crate::layout::{Container, Displayable, Orientation};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

const INDENT: &str = "  ";

/// Render a displayable and everything below it.
pub fn render_displayable(displayable: &Displayable) -> String {
    let mut out = String::new();
    write_displayable(&mut out, displayable, "", 0);
    out
}

/// Render an arranged container and everything below it.
pub fn render_container(container: &Container) -> String {
    let mut out = String::new();
    write_container(&mut out, container, "", 0);
    out
}

fn pad(depth: usize) -> String {
    INDENT.repeat(depth)
}

fn write_displayable(out: &mut String, displayable: &Displayable, prefix: &str, depth: usize) {
    match displayable {
        Displayable::Control { id, kind } => {
            let _ = writeln!(out, "{}{}control {} ({})", pad(depth), prefix, id, kind);
        }
        Displayable::Label { text } => {
            let _ = writeln!(out, "{}{}label {:?}", pad(depth), prefix, text);
        }
        Displayable::Container { container, .. } => write_container(out, container, prefix, depth),
    }
}

fn write_container(out: &mut String, container: &Container, prefix: &str, depth: usize) {
    let indent = pad(depth);
    match container {
        Container::Empty => {
            let _ = writeln!(out, "{}{}empty", indent, prefix);
        }
        Container::Stack { orientation, items } => {
            let axis = match orientation {
                Orientation::Vertical => "vertical",
                Orientation::Horizontal => "horizontal",
            };
            let _ = writeln!(out, "{}{}stack {}", indent, prefix, axis);
            for item in items {
                write_displayable(out, item, "", depth + 1);
            }
        }
        Container::Grid { columns, cells } => {
            let _ = writeln!(out, "{}{}grid ({} columns)", indent, prefix, columns);
            for cell in cells {
                let position = if cell.span > 1 {
                    format!("[{},{} span {}] ", cell.row, cell.column, cell.span)
                } else {
                    format!("[{},{}] ", cell.row, cell.column)
                };
                write_displayable(out, &cell.item, &position, depth + 1);
            }
        }
        Container::Tabs { pages } => {
            let _ = writeln!(out, "{}{}tabs", indent, prefix);
            for page in pages {
                let label = format!("page {:?}: ", page.label);
                write_displayable(out, &page.content, &label, depth + 1);
            }
        }
    }
}

/// Format field values as `id = value` lines, in id order.
pub fn format_values(values: &FieldValues) -> String {
    values
        .iter()
        .map(|(id, value)| match value {
            Value::String(s) => format!("{} = {}", id, s),
            other => format!("{} = {}", id, other),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
