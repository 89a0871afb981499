//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the mint
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::Network;

/// Root configuration for the mint service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MintConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Tezos network and node RPC settings.
    pub network: NetworkConfig,

    /// The NFT contract to mint from.
    pub contract: ContractConfig,

    /// Wallet (remote signer) settings.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Total time allowed per HTTP request in seconds. Must cover a mint,
    /// which waits for confirmation.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Tezos network configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Network the wallet is asked to connect to.
    pub network: Network,

    /// Node RPC endpoint URL.
    pub rpc_url: String,

    /// Failover node RPC endpoint URLs.
    pub failover_urls: Vec<String>,

    /// Chain ID override; required to verify a `custom` network.
    pub chain_id: Option<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of blocks (inclusion block counted) required for confirmation.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for confirmation in seconds.
    pub confirmation_timeout_secs: u64,

    /// Head polling interval while waiting for confirmation.
    pub confirmation_poll_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: Network::Florencenet,
            rpc_url: "https://florencenet.api.tez.ie".to_string(),
            failover_urls: Vec::new(),
            chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 180,
            confirmation_poll_ms: 2000,
        }
    }
}

/// Contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Contract address (`KT1...`).
    pub address: String,

    /// How minted tokens are named.
    pub token: TokenConfig,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "KT1C6bQhy4gSSt3HYd1E6xUoHV5ZMUbkRY38".to_string(),
            token: TokenConfig::default(),
        }
    }
}

/// Token metadata naming scheme.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Name prefix; the token number is appended.
    pub name_prefix: String,

    /// Symbol prefix; the token number is appended.
    pub symbol_prefix: String,

    /// Metadata URI shared by every token.
    pub token_uri: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name_prefix: "Kangroo".to_string(),
            symbol_prefix: "Kg".to_string(),
            token_uri: "ipfs://QmV3a1TAdCncfs84Gi9msDsDJVQBDt6Wb5gJRVuFRfrgtG".to_string(),
        }
    }
}

/// Wallet configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Name shown to the user.
    pub app_name: String,

    /// Remote signer base URL.
    pub signer_url: String,

    /// Account (public key hash) held by the signer. Overridden by
    /// `KRAZNIK_WALLET_PKH`.
    pub pkh: Option<String>,

    /// Signer request timeout in seconds.
    pub signer_timeout_secs: u64,

    /// File holding the authorized account across restarts. No file means
    /// the session lives in memory only.
    pub session_file: Option<String>,

    /// Fees and limits applied to submitted operations.
    pub fees: FeeConfig,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            app_name: "KraznikUnderverse".to_string(),
            signer_url: "http://127.0.0.1:6732".to_string(),
            pkh: None,
            signer_timeout_secs: 60,
            session_file: Some("kraznik-session.json".to_string()),
            fees: FeeConfig::default(),
        }
    }
}

/// Fees and limits for manager operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    pub fee_mutez: u64,
    pub gas_limit: u64,
    pub storage_limit: u64,
    pub reveal_fee_mutez: u64,
    pub reveal_gas_limit: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fee_mutez: 20_000,
            gas_limit: 100_000,
            storage_limit: 1_000,
            reveal_fee_mutez: 1_420,
            reveal_gas_limit: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MintConfig::default();
        assert_eq!(config.network.network, Network::Florencenet);
        assert_eq!(config.contract.address, "KT1C6bQhy4gSSt3HYd1E6xUoHV5ZMUbkRY38");
        assert_eq!(config.contract.token.name_prefix, "Kangroo");
        assert_eq!(config.network.confirmation_blocks, 1);
        assert!(config.wallet.pkh.is_none());
    }

    #[test]
    fn test_partial_toml() {
        let config: MintConfig = toml::from_str(
            r#"
            [network]
            network = "custom"
            rpc_url = "http://localhost:8732"
            chain_id = "NetXlocal"

            [wallet.fees]
            fee_mutez = 5000
            "#,
        )
        .unwrap();

        assert_eq!(config.network.network, Network::Custom);
        assert_eq!(config.network.chain_id.as_deref(), Some("NetXlocal"));
        assert_eq!(config.network.rpc_timeout_secs, 10);
        assert_eq!(config.wallet.fees.fee_mutez, 5000);
        assert_eq!(config.wallet.fees.gas_limit, 100_000);
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }
}
