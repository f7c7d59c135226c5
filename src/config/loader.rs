//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::BridgeConfig;
use crate::config::validation::{validate_config, ValidationError};

pub const ENV_BACKEND_URL: &str = "BRIDGE_BACKEND_URL";
pub const ENV_ACCESS_TOKEN: &str = "BRIDGE_ACCESS_TOKEN";
pub const ENV_BIND_ADDRESS: &str = "BRIDGE_BIND_ADDRESS";
pub const ENV_LOG_LEVEL: &str = "BRIDGE_LOG_LEVEL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML configuration file. Semantic checks happen at startup,
/// after environment overrides are applied.
pub fn load_config(path: &Path) -> Result<BridgeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load configuration for process startup.
///
/// Reads the optional file (defaults otherwise), applies `BRIDGE_*`
/// environment overrides, then validates. A missing access token surfaces
/// here as a validation error, which callers treat as fatal.
pub fn load_startup_config(path: Option<&Path>) -> Result<BridgeConfig, ConfigError> {
    resolve_config(path, |key| std::env::var(key).ok())
}

fn resolve_config<F>(path: Option<&Path>, lookup: F) -> Result<BridgeConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };

    apply_env_overrides(&mut config, lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values on top of file or default settings.
pub fn apply_env_overrides<F>(config: &mut BridgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = present(ENV_BACKEND_URL) {
        config.backend.base_url = url;
    }
    if let Some(token) = present(ENV_ACCESS_TOKEN) {
        config.listener.access_token = token;
    }
    if let Some(addr) = present(ENV_BIND_ADDRESS) {
        config.listener.bind_address = addr;
    }
    if let Some(level) = present(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
}
