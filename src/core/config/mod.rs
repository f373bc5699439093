//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Formweave has two configuration scopes:
//! - **Global**: User-level settings
//! - **Project**: Per-project overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$FORMWEAVE_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/formweave/config.toml`
//! 3. `~/.formweave/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use formweave::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("Timeout: {:?}", config.timeout());
//! if let Some(url) = config.base_url() {
//!     println!("Base URL: {}", url);
//! }
//! ```

pub mod schema;

pub use schema::{DependencyConfig, FileConfig, LogConfig, TransportConfig};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Default global timeout for dispatched requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "FORMWEAVE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules: project config overrides
/// global config, and dependency entries are merged by name.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: FileConfig,
    /// Project configuration (if found)
    pub project: Option<FileConfig>,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads `<project_dir>/.formweave/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error (defaults are used).
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        let project_path = project_dir
            .map(Self::project_config_path)
            .filter(|p| p.exists());
        Self::load_from(global_path.as_deref(), project_path.as_deref())
    }

    /// Load configuration from explicit file paths.
    ///
    /// A `None` path means that scope is absent.
    pub fn load_from(
        global_path: Option<&Path>,
        project_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let global = match global_path {
            Some(path) => Self::read_config(path)?,
            None => FileConfig::default(),
        };
        let project = project_path.map(Self::read_config).transpose()?;

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                global_path: global_path.map(Path::to_path_buf),
                project_path: project_path.map(Path::to_path_buf),
            },
        })
    }

    /// Locate the global config file, if one exists.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("formweave/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".formweave/config.toml"))
            .filter(|path| path.exists())
    }

    /// Read and parse a config file.
    fn read_config(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the project config path for a project directory.
    pub fn project_config_path(project_dir: &Path) -> PathBuf {
        project_dir.join(".formweave/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    fn scopes(&self) -> impl Iterator<Item = &FileConfig> {
        self.project.iter().chain(std::iter::once(&self.global))
    }

    fn transport_value<T>(&self, pick: impl Fn(&TransportConfig) -> Option<T>) -> Option<T> {
        self.scopes()
            .find_map(|c| c.transport.as_ref().and_then(&pick))
    }

    /// Get the transport base URL.
    ///
    /// Returns `None` if not configured.
    pub fn base_url(&self) -> Option<String> {
        self.transport_value(|t| t.base_url.clone())
    }

    /// Get the global request timeout.
    ///
    /// Defaults to [`DEFAULT_TIMEOUT_SECS`] if not configured.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.transport_value(|t| t.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Get the configured log level.
    pub fn log_level(&self) -> Option<&str> {
        self.scopes()
            .find_map(|c| c.log.as_ref().and_then(|l| l.level.as_deref()))
    }

    /// Dependency definitions with project entries overriding global ones by name.
    pub fn dependencies(&self) -> BTreeMap<&str, &DependencyConfig> {
        let mut merged: BTreeMap<&str, &DependencyConfig> = self
            .global
            .dependencies
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        if let Some(project) = &self.project {
            merged.extend(project.dependencies.iter().map(|(k, v)| (k.as_str(), v)));
        }
        merged
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project config file.
    pub fn project_config_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}
