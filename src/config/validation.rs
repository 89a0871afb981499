//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check address prefixes for the contract and account
//!
//! Returns all validation errors, not just the first.

use std::fmt;
use std::net::SocketAddr;

use crate::blockchain::client::parse_base_url;
use crate::blockchain::types::Network;
use crate::config::schema::MintConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MintConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("'{}' is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be > 0"));
    }

    let network = &config.network;
    if parse_base_url(&network.rpc_url).is_err() {
        errors.push(ValidationError::new(
            "network.rpc_url",
            format!("'{}' is not a URL", network.rpc_url),
        ));
    }
    for url in &network.failover_urls {
        if parse_base_url(url).is_err() {
            errors.push(ValidationError::new(
                "network.failover_urls",
                format!("'{}' is not a URL", url),
            ));
        }
    }
    if network.network == Network::Custom && network.chain_id.is_none() {
        errors.push(ValidationError::new(
            "network.chain_id",
            "required when network is 'custom'",
        ));
    }
    if network.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("network.rpc_timeout_secs", "must be > 0"));
    }
    if network.confirmation_blocks == 0 {
        errors.push(ValidationError::new("network.confirmation_blocks", "must be > 0"));
    }
    if network.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "network.confirmation_timeout_secs",
            "must be > 0",
        ));
    }
    if network.confirmation_poll_ms == 0 {
        errors.push(ValidationError::new("network.confirmation_poll_ms", "must be > 0"));
    }

    if !config.contract.address.starts_with("KT1") {
        errors.push(ValidationError::new(
            "contract.address",
            format!("'{}' is not an originated contract address", config.contract.address),
        ));
    }
    if config.contract.token.name_prefix.is_empty() {
        errors.push(ValidationError::new("contract.token.name_prefix", "must not be empty"));
    }

    let wallet = &config.wallet;
    if parse_base_url(&wallet.signer_url).is_err() {
        errors.push(ValidationError::new(
            "wallet.signer_url",
            format!("'{}' is not a URL", wallet.signer_url),
        ));
    }
    if let Some(pkh) = &wallet.pkh {
        if !["tz1", "tz2", "tz3"].iter().any(|p| pkh.starts_with(p)) {
            errors.push(ValidationError::new(
                "wallet.pkh",
                format!("'{}' is not an implicit account address", pkh),
            ));
        }
    }
    if wallet.signer_timeout_secs == 0 {
        errors.push(ValidationError::new("wallet.signer_timeout_secs", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
