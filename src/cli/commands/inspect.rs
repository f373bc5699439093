//! inspect command - Compose forms and print their arranged widget trees

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;
use crate::core::metadata::Metadata;
use crate::registry::Registry;
use crate::ui::output;
use crate::widget::{Entity, WidgetFactory};

/// Print the arranged widget tree of one form, or of every form.
pub fn inspect(ctx: &Context, metadata_path: &Path, form: Option<&str>, json: bool) -> Result<()> {
    let metadata = Metadata::load(metadata_path)
        .with_context(|| format!("Failed to load metadata from {}", metadata_path.display()))?;

    let form_ids: Vec<&str> = match form {
        Some(id) => {
            if metadata.form(id).is_none() {
                bail!("Unknown form: {}", id);
            }
            vec![id]
        }
        None => metadata.forms.keys().map(String::as_str).collect(),
    };

    if form_ids.is_empty() {
        output::warn("metadata bundle declares no forms", ctx.verbosity());
        return Ok(());
    }

    let factory = WidgetFactory::new(Registry::new());
    let mut rendered = Vec::with_capacity(form_ids.len());
    for id in form_ids {
        let entity = Entity::from_form(&metadata, id)
            .with_context(|| format!("Failed to build form '{}'", id))?;
        let Some(widget) = factory.create(&entity, None) else {
            output::warn(
                format!("form '{}' has no widget for its type", id),
                ctx.verbosity(),
            );
            continue;
        };
        let Some(displayable) = widget.displayable() else {
            continue;
        };

        if json {
            rendered.push(serde_json::json!({
                "form": id,
                "label": widget.label(),
                "layout": displayable,
            }));
        } else {
            let title = match widget.label() {
                Some(label) => format!("form {} {:?}", id, label),
                None => format!("form {}", id),
            };
            println!("{}", title);
            print!("{}", output::render_displayable(&displayable));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    }
    Ok(())
}
