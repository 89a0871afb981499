//! Mint workflow.
//!
//! # Data Flow
//! ```text
//! connect     → WalletProvider::request_permissions → Session
//! load        → ChainRpc::balance / contract_script → Session, ContractView
//! mint(n)     → MintRequest (records + price) → WalletProvider::send_operations
//!             → ChainRpc::wait_for_confirmation → reload
//! disconnect  → WalletProvider::clear_active_account → reload
//! ```

pub mod client;
pub mod request;
pub mod session;

use thiserror::Error;

use crate::blockchain::types::TezosError;
use crate::contract::ContractError;
use crate::wallet::provider::WalletError;

pub use client::{MintClient, MintReceipt, MintSettings, PageState, RETRY_NOTICE};
pub use request::{total_price, MintRequest};
pub use session::Session;

/// Errors raised by the mint workflow.
#[derive(Debug, Error)]
pub enum MintError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Chain(#[from] TezosError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error("No wallet connected")]
    NotConnected,

    #[error("Contract storage not loaded")]
    ContractNotLoaded,

    #[error("Purchase quantity must be at least 1")]
    ZeroQuantity,

    #[error("Cannot purchase {requested} tokens, at most {max} per transaction")]
    ExceedsMaxPurchase { requested: u64, max: u64 },

    #[error("Minting {requested} tokens would exceed max supply ({minted}/{max_supply} minted)")]
    ExceedsMaxSupply {
        requested: u64,
        minted: u64,
        max_supply: u64,
    },

    #[error("Minting is paused")]
    Paused,

    #[error("Price of {quantity} tokens overflows")]
    PriceOverflow { quantity: u64 },

    #[error("A mint is already in progress")]
    InFlight,

    #[error("Mint task aborted: {0}")]
    Aborted(String),
}

impl MintError {
    /// Whether the request was refused before anything was sent.
    pub fn is_rejected_locally(&self) -> bool {
        matches!(
            self,
            MintError::NotConnected
                | MintError::ContractNotLoaded
                | MintError::ZeroQuantity
                | MintError::ExceedsMaxPurchase { .. }
                | MintError::ExceedsMaxSupply { .. }
                | MintError::Paused
                | MintError::PriceOverflow { .. }
        )
    }
}

/// Result type for the mint workflow.
pub type MintResult<T> = Result<T, MintError>;
