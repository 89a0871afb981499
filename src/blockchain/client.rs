//! Tezos node RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the node RPC endpoint (primary + failovers)
//! - Query chain state (head, balances, counters, contract scripts)
//! - Forge and inject operations
//! - Handle timeouts and network errors gracefully

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::transaction::{ConfirmationWatcher, UnsignedOperation};
use crate::blockchain::types::{
    BlockHeader, BlockOperation, ContractScript, Mutez, NetworkConfig, OperationHash, TezosError,
    TezosResult,
};
use crate::observability::metrics;

/// Read access to the chain, as needed by the mint workflow.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Spendable balance of an account.
    async fn balance(&self, address: &str) -> TezosResult<Mutez>;

    /// Code and storage of a smart contract.
    async fn contract_script(&self, address: &str) -> TezosResult<ContractScript>;

    /// Block until the operation is confirmed; returns its block level.
    async fn wait_for_confirmation(&self, hash: &OperationHash) -> TezosResult<u64>;

    /// Whether the node answers.
    async fn is_healthy(&self) -> bool;
}

/// Parse a base URL so that relative RPC paths join under it.
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, url::ParseError> {
    if raw.ends_with('/') {
        Url::parse(raw)
    } else {
        Url::parse(&format!("{}/", raw))
    }
}

/// Node RPC client wrapper with failover support.
#[derive(Clone)]
pub struct TezosClient {
    http: reqwest::Client,
    /// Primary endpoint followed by failovers.
    endpoints: Vec<Url>,
    config: NetworkConfig,
    timeout_duration: Duration,
}

impl TezosClient {
    /// Create a new client.
    ///
    /// Fails only if the primary RPC URL is invalid. A chain ID mismatch is
    /// logged, not fatal, so the service can start while the node is down.
    pub async fn new(config: NetworkConfig) -> TezosResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut endpoints = Vec::new();

        // 1. Primary endpoint
        let primary = parse_base_url(&config.rpc_url).map_err(|e| {
            TezosError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        endpoints.push(primary);

        // 2. Failover endpoints
        for url_str in &config.failover_urls {
            match parse_base_url(url_str) {
                Ok(url) => endpoints.push(url),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL"),
            }
        }

        let client = Self {
            http: reqwest::Client::new(),
            endpoints,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    network = %config.network,
                    "Tezos client initialized"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Tezos client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Chain identifier the node must report, if one is known.
    pub fn expected_chain_id(&self) -> Option<String> {
        self.config
            .chain_id
            .clone()
            .or_else(|| self.config.network.chain_id().map(str::to_string))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> TezosResult<()> {
        let Some(expected) = self.expected_chain_id() else {
            return Ok(());
        };
        let actual = self.get_chain_id().await?;
        if actual != expected {
            return Err(TezosError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    pub async fn get_chain_id(&self) -> TezosResult<String> {
        self.get("chain_id", "chains/main/chain_id").await
    }

    /// Header of the current head block.
    pub async fn get_head_header(&self) -> TezosResult<BlockHeader> {
        self.get("header", "chains/main/blocks/head/header").await
    }

    pub async fn get_balance(&self, address: &str) -> TezosResult<Mutez> {
        let path = format!("chains/main/blocks/head/context/contracts/{}/balance", address);
        let raw: String = self.get("balance", &path).await?;
        parse_u64(&raw, "balance").map(Mutez)
    }

    /// Current manager counter of an implicit account.
    pub async fn get_counter(&self, address: &str) -> TezosResult<u64> {
        let path = format!("chains/main/blocks/head/context/contracts/{}/counter", address);
        let raw: String = self.get("counter", &path).await?;
        parse_u64(&raw, "counter")
    }

    /// Revealed public key of an account, `None` if unrevealed.
    pub async fn get_manager_key(&self, address: &str) -> TezosResult<Option<String>> {
        let path = format!("chains/main/blocks/head/context/contracts/{}/manager_key", address);
        self.get("manager_key", &path).await
    }

    pub async fn get_script(&self, address: &str) -> TezosResult<ContractScript> {
        let path = format!("chains/main/blocks/head/context/contracts/{}/script", address);
        self.get("script", &path).await
    }

    /// Manager operations (validation pass 3) of the block at `level`.
    pub async fn get_manager_operations(&self, level: u64) -> TezosResult<Vec<BlockOperation>> {
        let path = format!("chains/main/blocks/{}/operations/3", level);
        self.get("operations", &path).await
    }

    /// Forge an operation into its binary form (hex).
    pub async fn forge_operation(&self, operation: &UnsignedOperation) -> TezosResult<String> {
        self.post(
            "forge",
            "chains/main/blocks/head/helpers/forge/operations",
            operation,
            true,
        )
        .await
    }

    /// Inject signed operation bytes. Only the primary node is used.
    pub async fn inject_operation(&self, signed_hex: &str) -> TezosResult<OperationHash> {
        self.post("inject", "injection/operation?chain=main", &signed_hex, false)
            .await
            .map(OperationHash)
    }

    /// Check if the node is reachable.
    pub async fn is_healthy(&self) -> bool {
        let healthy = self.get_head_header().await.is_ok();
        metrics::record_node_health(healthy);
        healthy
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    async fn get<T: DeserializeOwned>(&self, label: &'static str, path: &str) -> TezosResult<T> {
        let mut last_error = String::from("no endpoints configured");
        for (i, base) in self.endpoints.iter().enumerate() {
            let url = base
                .join(path)
                .map_err(|e| TezosError::Rpc(format!("Invalid RPC path '{}': {}", path, e)))?;
            match timeout(self.timeout_duration, self.fetch(self.http.get(url))).await {
                Ok(Ok(value)) => {
                    metrics::record_rpc(label, "ok");
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, rpc = label, error = %e, "RPC error, trying next endpoint");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, rpc = label, "RPC timeout, trying next endpoint");
                    last_error = TezosError::Timeout(self.config.rpc_timeout_secs).to_string();
                }
            }
        }
        metrics::record_rpc(label, "error");
        Err(TezosError::Rpc(format!(
            "All RPC endpoints failed for {}: {}",
            label, last_error
        )))
    }

    async fn post<B, T>(&self, label: &'static str, path: &str, body: &B, failover: bool) -> TezosResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoints = if failover {
            &self.endpoints[..]
        } else {
            &self.endpoints[..1]
        };
        let mut last_error = String::from("no endpoints configured");
        for (i, base) in endpoints.iter().enumerate() {
            let url = base
                .join(path)
                .map_err(|e| TezosError::Rpc(format!("Invalid RPC path '{}': {}", path, e)))?;
            match timeout(self.timeout_duration, self.fetch(self.http.post(url).json(body))).await {
                Ok(Ok(value)) => {
                    metrics::record_rpc(label, "ok");
                    return Ok(value);
                }
                Ok(Err(e)) => {
                    tracing::warn!(endpoint_idx = i, rpc = label, error = %e, "RPC error");
                    last_error = e.to_string();
                }
                Err(_) => {
                    tracing::warn!(endpoint_idx = i, rpc = label, "RPC timeout");
                    last_error = TezosError::Timeout(self.config.rpc_timeout_secs).to_string();
                }
            }
        }
        metrics::record_rpc(label, "error");
        Err(TezosError::Rpc(format!(
            "All RPC endpoints failed for {}: {}",
            label, last_error
        )))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> TezosResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| TezosError::Rpc(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TezosError::Rpc(format!("HTTP {}: {}", status, body.trim())));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| TezosError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ChainRpc for TezosClient {
    async fn balance(&self, address: &str) -> TezosResult<Mutez> {
        self.get_balance(address).await
    }

    async fn contract_script(&self, address: &str) -> TezosResult<ContractScript> {
        self.get_script(address).await
    }

    async fn wait_for_confirmation(&self, hash: &OperationHash) -> TezosResult<u64> {
        ConfirmationWatcher::new(self.clone()).wait(hash).await
    }

    async fn is_healthy(&self) -> bool {
        TezosClient::is_healthy(self).await
    }
}

impl std::fmt::Debug for TezosClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TezosClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("network", &self.config.network)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn parse_u64(raw: &str, what: &str) -> TezosResult<u64> {
    raw.parse()
        .map_err(|e| TezosError::Decode(format!("invalid {} '{}': {}", what, raw, e)))
}
