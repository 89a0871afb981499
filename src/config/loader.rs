//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::MintConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable overriding `wallet.pkh`.
pub const WALLET_PKH_ENV_VAR: &str = "KRAZNIK_WALLET_PKH";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<MintConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, apply environment overrides, and validate.
pub fn parse_config(content: &str) -> Result<MintConfig, ConfigError> {
    let mut config: MintConfig = toml::from_str(content)?;
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Defaults plus environment overrides, validated.
pub fn default_config() -> Result<MintConfig, ConfigError> {
    parse_config("")
}

fn apply_env_overrides(config: &mut MintConfig) {
    if let Ok(pkh) = std::env::var(WALLET_PKH_ENV_VAR) {
        if !pkh.trim().is_empty() {
            config.wallet.pkh = Some(pkh.trim().to_string());
        }
    }
}
