//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::{AppConfig, MODE_ENV, PATH_ENV};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Load the optional settings file, layer the process environment on top and
/// validate the result.
pub fn load_with_env(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_with_env`] with an injectable environment lookup.
pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment variables on top of file settings.
///
/// - `MCP_DEPLOYMENT_MODE`: deployment mode (ignored with a warning if unknown)
/// - `MCP_CONFIG_PATH`: backing file path
/// - the store's `override_var` (default `MCP_CONFIG`): override payload
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let store = &mut config.store;

    if let Some(mode) = lookup(MODE_ENV) {
        match mode.parse() {
            Ok(mode) => store.mode = mode,
            Err(e) => tracing::warn!("Ignoring {}: {}", MODE_ENV, e),
        }
    }

    if let Some(path) = lookup(PATH_ENV).filter(|p| !p.is_empty()) {
        store.path = Some(PathBuf::from(path));
    }

    if let Some(var) = store.override_var.clone() {
        if let Some(payload) = lookup(&var).filter(|p| !p.is_empty()) {
            store.override_source = Some(payload);
        }
    }
}
