//! The NFT contract as seen by the mint page.
//!
//! # Data Flow
//! ```text
//! ChainRpc::contract_script
//!     → ContractHandle (address + code + storage)
//!     → storage.rs (ContractView from annotated storage)
//!     → metadata.rs (token records for a mint call)
//! ```

pub mod metadata;
pub mod storage;

use thiserror::Error;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::michelson::{entrypoints, section, Micheline};
use crate::blockchain::types::{ContractCall, ContractScript, Mutez, TezosError, TezosResult};

pub use metadata::{token_batch, TokenMetadata, TokenNaming};
pub use storage::ContractView;

/// Entrypoint that issues new tokens.
pub const MINT_ENTRYPOINT: &str = "mint";

/// Errors decoding or using the contract.
#[derive(Debug, Error)]
pub enum ContractError {
    #[error("Contract code has no storage section")]
    MissingStorageType,

    #[error("Storage field '{0}' not found")]
    MissingField(String),

    #[error("Storage field '{field}' has unexpected value {value}")]
    InvalidField { field: String, value: String },

    #[error("Contract has no '{0}' entrypoint")]
    MissingEntrypoint(String),

    #[error(transparent)]
    Decode(#[from] TezosError),
}

/// Result type for contract operations.
pub type ContractResult<T> = Result<T, ContractError>;

/// A deployed contract: its address and the script fetched at load time.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractHandle {
    address: String,
    script: ContractScript,
}

impl ContractHandle {
    /// Fetch the contract's script.
    pub async fn at(chain: &dyn ChainRpc, address: &str) -> TezosResult<Self> {
        let script = chain.contract_script(address).await?;
        Ok(Self::new(address, script))
    }

    pub fn new(address: &str, script: ContractScript) -> Self {
        Self {
            address: address.to_string(),
            script,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Storage snapshot taken when the handle was fetched.
    pub fn storage(&self) -> ContractResult<ContractView> {
        ContractView::from_script(&self.script)
    }

    pub fn entrypoints(&self) -> Vec<String> {
        section(&self.script.code, "parameter")
            .map(entrypoints)
            .unwrap_or_default()
    }

    pub fn ensure_entrypoint(&self, name: &str) -> ContractResult<()> {
        if self.entrypoints().iter().any(|e| e == name) {
            Ok(())
        } else {
            Err(ContractError::MissingEntrypoint(name.to_string()))
        }
    }

    /// A call to the mint entrypoint.
    ///
    /// The parameter is `Pair <purchase_quantity> <token_metadatas>`.
    pub fn mint_call(&self, quantity: u64, tokens: &[TokenMetadata], amount: Mutez) -> ContractCall {
        let metadatas = tokens.iter().map(TokenMetadata::to_micheline).collect();
        ContractCall {
            destination: self.address.clone(),
            amount,
            entrypoint: MINT_ENTRYPOINT.to_string(),
            value: Micheline::pair(Micheline::nat(quantity), Micheline::Seq(metadatas)),
        }
    }
}
