//! Configuration loading.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::StocktakeConfig;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load the full configuration from a YAML file.
///
/// Environment overrides are applied after parsing and before validation.
pub fn load_config(path: &Path) -> Result<StocktakeConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: StocktakeConfig = serde_yaml::from_str(&content)?;
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Apply environment variable overrides to a parsed configuration.
///
/// `RCS_BASE_URL` and `RCS_PREFIX` replace the robot endpoint settings
/// when set, matching how the deployment environment points one binary at
/// different control systems.
pub fn apply_env_overrides(config: &mut StocktakeConfig) {
    if let Ok(value) = std::env::var("RCS_BASE_URL") {
        if !value.trim().is_empty() {
            config.robot.base_url = value;
        }
    }
    if let Ok(value) = std::env::var("RCS_PREFIX") {
        config.robot.prefix = value;
    }
}

fn validate_config(config: &StocktakeConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    if config.robot.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "robot.base_url must not be empty".to_string(),
        ));
    }

    if config.recognition.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "recognition.base_url must not be empty".to_string(),
        ));
    }

    if config.workflow.arrival_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "workflow.arrival_timeout_secs must be > 0".to_string(),
        ));
    }

    if config.workflow.poll_interval_ms == 0 {
        return Err(ConfigError::Invalid(
            "workflow.poll_interval_ms must be > 0".to_string(),
        ));
    }

    Ok(())
}
