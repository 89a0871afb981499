//! A single mint submission: quantity, token records and price.

use crate::blockchain::types::{ContractCall, Mutez};
use crate::contract::{token_batch, ContractHandle, ContractView, TokenMetadata, TokenNaming};
use crate::mint::{MintError, MintResult};

/// Price of `quantity` tokens: `mint_price × quantity` mutez
/// (`mint_price × quantity / 10^6` tez).
pub fn total_price(mint_price: Mutez, quantity: u64) -> Option<Mutez> {
    mint_price.checked_mul(quantity)
}

/// Built per submit, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MintRequest {
    pub quantity: u64,
    pub records: Vec<TokenMetadata>,
    pub amount: Mutez,
}

impl MintRequest {
    /// Validate `quantity` against the contract's limits and derive the
    /// token records, numbered from the current minted count.
    pub fn new(quantity: u64, view: &ContractView, naming: &TokenNaming) -> MintResult<Self> {
        if quantity == 0 {
            return Err(MintError::ZeroQuantity);
        }
        if view.paused {
            return Err(MintError::Paused);
        }
        if quantity > view.max_purchase {
            return Err(MintError::ExceedsMaxPurchase {
                requested: quantity,
                max: view.max_purchase,
            });
        }
        if quantity > view.remaining_supply() {
            return Err(MintError::ExceedsMaxSupply {
                requested: quantity,
                minted: view.minted_count,
                max_supply: view.max_supply,
            });
        }

        let amount = total_price(view.mint_price, quantity).ok_or(MintError::PriceOverflow { quantity })?;
        Ok(Self {
            quantity,
            records: token_batch(view.minted_count, quantity, naming),
            amount,
        })
    }

    pub fn to_call(&self, contract: &ContractHandle) -> ContractCall {
        contract.mint_call(self.quantity, &self.records, self.amount)
    }
}
