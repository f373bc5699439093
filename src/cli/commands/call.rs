//! call command - Execute a service and print the resulting field values

use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};
use serde_json::Value;
use tracing::debug;

use crate::cli::Context;
use crate::core::config::Config;
use crate::core::metadata::Metadata;
use crate::registry::{Definition, Registry};
use crate::resolver::{Resolver, Signal, QUEUE_DEPENDENCY};
use crate::transport::{HttpTransport, TransportQueue};
use crate::ui::output;

/// Split a `FIELD=VALUE` assignment.
///
/// The value is parsed as JSON when it parses (`7`, `true`, `"x"`,
/// `[1,2]`), otherwise it is taken as a plain string.
pub fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid assignment '{}', expected FIELD=VALUE", raw))?;
    if field.is_empty() {
        bail!("Invalid assignment '{}', field is empty", raw);
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((field.to_string(), value))
}

/// Execute `service` against the configured endpoint and print the values.
pub fn call(
    ctx: &Context,
    metadata_path: &Path,
    service: &str,
    assignments: &[String],
    base_url: Option<&str>,
) -> Result<()> {
    let metadata = Metadata::load(metadata_path)
        .with_context(|| format!("Failed to load metadata from {}", metadata_path.display()))?;
    if metadata.service(service).is_none() {
        bail!("Unknown service: {}", service);
    }
    let values = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;

    let config = ctx.config()?;
    let base_url = base_url
        .map(str::to_string)
        .or_else(|| config.base_url())
        .ok_or_else(|| anyhow!("No base URL. Pass --base-url or set [transport] base_url."))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(execute(ctx, metadata, &config, service, values, base_url))
}

async fn execute(
    ctx: &Context,
    metadata: Metadata,
    config: &Config,
    service: &str,
    values: Vec<(String, Value)>,
    base_url: String,
) -> Result<()> {
    let registry = Registry::new();
    for (name, dependency) in config.dependencies() {
        registry
            .register_config(name, dependency)
            .with_context(|| format!("Invalid dependency '{}' in config", name))?;
    }

    let queue = TransportQueue::new(Arc::new(HttpTransport::new(base_url)), config.timeout());
    registry.register(QUEUE_DEPENDENCY, Definition::fixed(queue.clone()))?;

    let resolver = Resolver::from_registry(Arc::new(metadata), &registry)?;
    for (field, value) in values {
        resolver
            .set_value(&field, value)
            .with_context(|| format!("Invalid field id '{}'", field))?;
    }

    let mut signals = resolver.subscribe();
    let batch = resolver.execute(service)?;
    debug!(service, %batch, "waiting for drain");
    queue.wait_idle().await;

    match signals.recv().await.context("Resolver closed before reporting")? {
        Signal::ExecuteOk { .. } => {
            let store = resolver.store();
            if store.values().is_empty() {
                output::print("(no values)", ctx.verbosity());
            } else {
                println!("{}", output::format_values(store.values()));
            }
            Ok(())
        }
        Signal::ExecuteNok { code, message, .. } => match code {
            Some(code) => bail!("{} failed [{}]: {}", service, code, message),
            None => bail!("{} failed: {}", service, message),
        },
    }
}
