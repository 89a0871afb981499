//! Wallet backed by a Tezos remote signer.
//!
//! # Security
//! - Keys stay inside the signer; only public keys and signatures cross
//! - Signing requests carry the generic-operation watermark
//! - Operations are injected through the primary node only

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

use crate::blockchain::client::{parse_base_url, TezosClient};
use crate::blockchain::transaction::{total_amount, OperationBuilder};
use crate::blockchain::types::{ContractCall, Network, OperationHash};
use crate::config::schema::{FeeConfig, WalletConfig};
use crate::wallet::provider::{AccountInfo, WalletError, WalletProvider, WalletResult};
use crate::wallet::store::SessionStore;

/// Watermark prepended to manager operation bytes before signing.
const GENERIC_OPERATION_WATERMARK: &str = "03";

/// Base58check prefixes of signature encodings, longest first.
const SIGNATURE_PREFIXES: &[(&str, &[u8])] = &[
    ("spsig1", &[13, 115, 101, 19, 63]),
    ("edsig", &[9, 245, 205, 134, 18]),
    ("p2sig", &[54, 240, 44, 52]),
    ("sig", &[4, 130, 43]),
];

const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Deserialize)]
struct PublicKeyResponse {
    public_key: String,
}

#[derive(Debug, Deserialize)]
struct SignatureResponse {
    signature: String,
}

/// Decode a base58check signature into its 64 raw bytes.
pub fn decode_signature(encoded: &str) -> WalletResult<Vec<u8>> {
    let (_, prefix) = SIGNATURE_PREFIXES
        .iter()
        .find(|(name, _)| encoded.starts_with(name))
        .ok_or_else(|| WalletError::InvalidSignature(format!("unknown encoding '{}'", encoded)))?;

    let decoded = bs58::decode(encoded)
        .with_check(None)
        .into_vec()
        .map_err(|e| WalletError::InvalidSignature(e.to_string()))?;

    let raw = decoded
        .strip_prefix(*prefix)
        .ok_or_else(|| WalletError::InvalidSignature("prefix bytes do not match".into()))?;
    if raw.len() != SIGNATURE_LEN {
        return Err(WalletError::InvalidSignature(format!(
            "expected {} bytes, got {}",
            SIGNATURE_LEN,
            raw.len()
        )));
    }
    Ok(raw.to_vec())
}

/// Wallet whose keys live in a remote signer (`octez-signer` HTTP API).
pub struct RemoteSignerWallet {
    http: reqwest::Client,
    signer_url: Url,
    pkh: String,
    network: Network,
    chain: TezosClient,
    fees: FeeConfig,
    store: SessionStore,
    active: ArcSwapOption<AccountInfo>,
    timeout_duration: Duration,
}

impl RemoteSignerWallet {
    /// Create the wallet and restore a previously authorized account.
    pub fn new(
        config: &WalletConfig,
        network: Network,
        chain: TezosClient,
        store: SessionStore,
    ) -> WalletResult<Self> {
        let signer_url = parse_base_url(&config.signer_url).map_err(|e| {
            WalletError::Signer(format!("Invalid signer URL '{}': {}", config.signer_url, e))
        })?;
        let pkh = config
            .pkh
            .clone()
            .ok_or_else(|| WalletError::Signer("No signer account (wallet.pkh) configured".into()))?;

        let restored = match store.load()? {
            Some(account) if account.address == pkh && account.network == network => {
                Some(Arc::new(account))
            }
            Some(account) => {
                tracing::warn!(
                    address = %account.address,
                    network = %account.network,
                    "Stored session does not match configured account, ignoring"
                );
                None
            }
            None => None,
        };

        tracing::info!(
            app = %config.app_name,
            address = %pkh,
            network = %network,
            restored = restored.is_some(),
            "Remote signer wallet initialized"
        );

        Ok(Self {
            http: reqwest::Client::new(),
            signer_url,
            pkh,
            network,
            chain,
            fees: config.fees.clone(),
            store,
            active: ArcSwapOption::new(restored),
            timeout_duration: Duration::from_secs(config.signer_timeout_secs),
        })
    }

    /// Account address served by the signer.
    pub fn address(&self) -> &str {
        &self.pkh
    }

    fn key_url(&self) -> WalletResult<Url> {
        self.signer_url
            .join(&format!("keys/{}", self.pkh))
            .map_err(|e| WalletError::Signer(format!("Invalid signer path: {}", e)))
    }

    async fn public_key(&self) -> WalletResult<String> {
        let request = self.http.get(self.key_url()?).send();
        let response = timeout(self.timeout_duration, request)
            .await
            .map_err(|_| WalletError::Signer("signer timed out".into()))?
            .map_err(|e| WalletError::Signer(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::FORBIDDEN {
            return Err(WalletError::PermissionDenied(format!(
                "signer does not authorize {} ({})",
                self.pkh, status
            )));
        }
        if !status.is_success() {
            return Err(WalletError::Signer(format!("HTTP {}", status)));
        }
        let body: PublicKeyResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Signer(format!("invalid public key response: {}", e)))?;
        Ok(body.public_key)
    }

    /// Sign forged operation bytes; returns the raw signature.
    async fn sign(&self, forged_hex: &str) -> WalletResult<Vec<u8>> {
        let payload = format!("{}{}", GENERIC_OPERATION_WATERMARK, forged_hex);
        let request = self.http.post(self.key_url()?).json(&payload).send();
        let response = timeout(self.timeout_duration, request)
            .await
            .map_err(|_| WalletError::Signer("signer timed out".into()))?
            .map_err(|e| WalletError::Signer(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WalletError::Signer(format!("HTTP {}: {}", status, body.trim())));
        }
        let body: SignatureResponse = response
            .json()
            .await
            .map_err(|e| WalletError::Signer(format!("invalid signature response: {}", e)))?;
        decode_signature(&body.signature)
    }
}

#[async_trait]
impl WalletProvider for RemoteSignerWallet {
    async fn request_permissions(&self, network: Network) -> WalletResult<AccountInfo> {
        if network != self.network {
            return Err(WalletError::NetworkMismatch {
                expected: self.network,
                actual: network,
            });
        }
        self.chain.verify_chain_id().await?;

        let public_key = self.public_key().await?;
        let account = AccountInfo {
            address: self.pkh.clone(),
            public_key,
            network,
            connected_at: Utc::now(),
        };
        self.store.save(&account)?;
        self.active.store(Some(Arc::new(account.clone())));

        tracing::info!(address = %account.address, network = %network, "Permission granted");
        Ok(account)
    }

    async fn active_account(&self) -> WalletResult<Option<AccountInfo>> {
        Ok(self.active.load_full().map(|account| account.as_ref().clone()))
    }

    async fn clear_active_account(&self) -> WalletResult<()> {
        self.active.store(None);
        self.store.clear()?;
        tracing::info!(address = %self.pkh, "Active account cleared");
        Ok(())
    }

    async fn send_operations(&self, calls: Vec<ContractCall>) -> WalletResult<OperationHash> {
        let account = self.active.load_full().ok_or(WalletError::NoActiveAccount)?;

        let operation = OperationBuilder::new(&self.chain, &self.fees)
            .build(&account.address, &account.public_key, &calls)
            .await?;
        let forged = self.chain.forge_operation(&operation).await?;
        let signature = self.sign(&forged).await?;
        let signed = format!("{}{}", forged, hex::encode(signature));
        let hash = self.chain.inject_operation(&signed).await?;

        tracing::info!(
            operation = %hash,
            source = %account.address,
            amount_mutez = %total_amount(&calls),
            "Operation injected"
        );
        Ok(hash)
    }
}

impl std::fmt::Debug for RemoteSignerWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSignerWallet")
            .field("signer_url", &self.signer_url.as_str())
            .field("pkh", &self.pkh)
            .field("network", &self.network)
            .finish()
    }
}
