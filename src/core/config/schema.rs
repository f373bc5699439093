//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Global config is searched in order:
//! 1. `$FORMWEAVE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/formweave/config.toml`
//! 3. `~/.formweave/config.toml` (canonical write location)
//!
//! Project config lives at `<project>/.formweave/config.toml` and uses the
//! same schema; its values override the global ones.
//!
//! # Validation
//!
//! Config values are validated after parsing: the timeout must be positive,
//! the base URL must be http(s), and every dependency entry must name
//! exactly one of `fixed`, `classname`, or `closure`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ConfigError;

/// Configuration file contents.
///
/// # Example
///
/// ```toml
/// [transport]
/// base_url = "https://api.example.com/rpc"
/// timeout_secs = 15
///
/// [log]
/// level = "debug"
///
/// [dependencies.clock]
/// classname = "system.clock"
/// parameters = ["utc"]
/// shared = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Transport settings
    pub transport: Option<TransportConfig>,

    /// Logging settings
    pub log: Option<LogConfig>,

    /// Explicit dependency definitions by name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, DependencyConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(transport) = &self.transport {
            transport.validate()?;
        }
        if let Some(log) = &self.log {
            log.validate()?;
        }
        for (name, dep) in &self.dependencies {
            dep.validate(name)?;
        }
        Ok(())
    }
}

/// Transport settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Base URL that request URLs are joined onto
    pub base_url: Option<String>,

    /// Global timeout applied to every dispatched request
    pub timeout_secs: Option<u64>,
}

impl TransportConfig {
    /// Validate the transport settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(url) = &self.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid base_url '{}', must start with http:// or https://",
                    url
                )));
            }
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default level ("trace", "debug", "info", "warn", "error")
    pub level: Option<String>,
}

impl LogConfig {
    /// Valid log levels.
    pub const VALID_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];

    /// Validate the logging settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(level) = &self.level {
            if !Self::VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid log level '{}', must be one of: {}",
                    level,
                    Self::VALID_LEVELS.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// An explicit dependency definition, as written in config.
///
/// Registered with
/// [`Registry::register_config`](crate::registry::Registry::register_config).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DependencyConfig {
    /// Fixed value
    pub fixed: Option<Value>,

    /// Name of a constructor in the registry's type table
    pub classname: Option<String>,

    /// Name of a factory in the registry's factory table
    pub closure: Option<String>,

    /// Default construction parameters
    pub parameters: Option<Vec<Value>>,

    /// Cache the first resolved instance
    pub shared: Option<bool>,
}

impl DependencyConfig {
    /// Validate that exactly one definition shape is present.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        let shapes = [
            self.fixed.is_some(),
            self.classname.is_some(),
            self.closure.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if shapes != 1 {
            return Err(ConfigError::InvalidValue(format!(
                "dependency '{}' must set exactly one of: fixed, classname, closure",
                name
            )));
        }
        Ok(())
    }
}
