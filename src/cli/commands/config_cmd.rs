//! config command - Print the effective configuration

use anyhow::Result;

use crate::cli::Context;
use crate::core::config::Config;

/// Print the effective configuration and the files it came from.
pub fn config(ctx: &Context) -> Result<()> {
    let config = ctx.config()?;
    println!("{}", describe(&config));
    Ok(())
}

/// Render the merged configuration as `key = value` lines.
fn describe(config: &Config) -> String {
    let mut lines = Vec::new();

    let source = |path: Option<&std::path::Path>| {
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    };
    lines.push(format!(
        "global config: {}",
        source(config.global_config_loaded_from())
    ));
    lines.push(format!(
        "project config: {}",
        source(config.project_config_loaded_from())
    ));

    lines.push(format!(
        "transport.base_url = {}",
        config.base_url().unwrap_or_else(|| "(unset)".to_string())
    ));
    lines.push(format!(
        "transport.timeout_secs = {}",
        config.timeout().as_secs()
    ));
    lines.push(format!(
        "log.level = {}",
        config.log_level().unwrap_or("(unset)")
    ));

    for (name, dependency) in config.dependencies() {
        let shape = if let Some(value) = &dependency.fixed {
            format!("fixed {}", value)
        } else if let Some(type_name) = &dependency.classname {
            format!("classname {}", type_name)
        } else if let Some(factory) = &dependency.closure {
            format!("closure {}", factory)
        } else {
            "(empty)".to_string()
        };
        let shared = if dependency.shared.unwrap_or(false) {
            " (shared)"
        } else {
            ""
        };
        lines.push(format!("dependencies.{} = {}{}", name, shape, shared));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn describes_defaults() {
        let text = describe(&Config::default());
        assert!(text.contains("global config: (none)"));
        assert!(text.contains("transport.base_url = (unset)"));
        assert!(text.contains("transport.timeout_secs = 30"));
    }

    #[test]
    fn describes_loaded_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
                [transport]
                base_url = "http://localhost:8080/rpc"
                timeout_secs = 5

                [dependencies.clock]
                classname = "system.clock"
                shared = true
            "#,
        )
        .unwrap();
        let config = Config::load_from(Some(&path), None).unwrap().config;
        let text = describe(&config);
        assert!(text.contains("transport.base_url = http://localhost:8080/rpc"));
        assert!(text.contains("transport.timeout_secs = 5"));
        assert!(text.contains("dependencies.clock = classname system.clock (shared)"));
        assert!(text.contains(&path.display().to_string()));
    }
}
