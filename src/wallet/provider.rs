//! Wallet provider seam.
//!
//! The mint workflow never holds keys. It asks a [`WalletProvider`] for an
//! authorized account and hands it contract calls to sign and broadcast.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::{ContractCall, Network, OperationHash, TezosError};

/// An account the user authorized this app to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Public key hash (`tz1...`).
    pub address: String,
    /// Public key (`edpk...`), needed to reveal the account.
    pub public_key: String,
    pub network: Network,
    pub connected_at: DateTime<Utc>,
}

/// Errors raised by wallet providers.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The signer refused or does not hold the account.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No account has been authorized yet.
    #[error("No active account")]
    NoActiveAccount,

    #[error("Network mismatch: wallet is on {expected}, request was for {actual}")]
    NetworkMismatch { expected: Network, actual: Network },

    /// Signer request failed.
    #[error("Signer error: {0}")]
    Signer(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Session persistence failed.
    #[error("Session store error: {0}")]
    Store(String),

    #[error(transparent)]
    Chain(#[from] TezosError),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;

/// External service managing key custody and operation signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to authorize an account on `network`.
    async fn request_permissions(&self, network: Network) -> WalletResult<AccountInfo>;

    /// The currently authorized account, if any.
    async fn active_account(&self) -> WalletResult<Option<AccountInfo>>;

    /// Forget the authorized account.
    async fn clear_active_account(&self) -> WalletResult<()>;

    /// Sign and broadcast contract calls as one operation batch.
    async fn send_operations(&self, calls: Vec<ContractCall>) -> WalletResult<OperationHash>;
}
