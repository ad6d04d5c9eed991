//! Configuration file resolution and loading
//!
//! Config file resolution follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. Per-user config file (`<config_dir>/<app>/config.toml`)
//! 4. None: caller falls back to compiled defaults
//!
//! A missing or unreadable file never stops a service from starting; the
//! caller logs a warning and runs on defaults.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Resolve which config file to read, if any
///
/// # Arguments
/// * `cli_arg` - path given on the command line
/// * `env_var_name` - environment variable holding a path
/// * `app_name` - directory name under the platform config dir
pub fn resolve_config_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    app_name: &str,
) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Per-user config file
    dirs::config_dir()
        .map(|d| d.join(app_name).join("config.toml"))
        .filter(|p| p.exists())
}

/// Parse a TOML config file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Load a config file, falling back to defaults on any failure
///
/// Returns the config plus the path it came from (None when defaults were used).
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> (T, Option<PathBuf>) {
    let Some(path) = path else {
        info!("No config file found, using compiled defaults");
        return (T::default(), None);
    };

    match load_toml(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            (config, Some(path.to_path_buf()))
        }
        Err(e) => {
            warn!("Failed to load config ({}), using compiled defaults", e);
            (T::default(), None)
        }
    }
}
