//! Configuration loading from disk and environment.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "GATEWAY_CONFIG";

const PORT_ENV: &str = "IMAGE_SERVICE_PORT";
const TTYD_PORT_ENV: &str = "TTYD_PORT";
const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
const STATIC_DIR_ENV: &str = "STATIC_DIR";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the startup configuration: defaults, then the optional file,
/// then process environment overrides.
pub fn load(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the service's environment variables onto `config`.
///
/// `lookup` abstracts the process environment so overrides can be
/// exercised without mutating global state.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(PORT_ENV) {
        config.listener.port = parse_port(PORT_ENV, value)?;
    }
    if let Some(value) = lookup(TTYD_PORT_ENV) {
        config.terminal.port = parse_port(TTYD_PORT_ENV, value)?;
    }
    if let Some(value) = lookup(UPLOAD_DIR_ENV).filter(|v| !v.is_empty()) {
        config.uploads.dir = PathBuf::from(value);
    }
    if let Some(value) = lookup(STATIC_DIR_ENV).filter(|v| !v.is_empty()) {
        config.static_files.dir = PathBuf::from(value);
    }
    Ok(())
}

fn parse_port(var: &'static str, value: String) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}
