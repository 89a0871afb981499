//! Decoded snapshot of the NFT contract's storage.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::blockchain::michelson::{annotated_fields, section, Micheline};
use crate::blockchain::types::{ContractScript, Mutez};
use crate::contract::{ContractError, ContractResult};

pub const MAX_SUPPLY: &str = "MAX_SUPPLY";
pub const MAX_PURCHASE: &str = "MAX_PURCHASE";
pub const MINT_PRICE: &str = "MINT_PRICE";
pub const ALL_TOKENS: &str = "all_tokens";
pub const PAUSED: &str = "paused";
pub const AMOUNT_RESERVED: &str = "AMOUNT_RESERVED";
pub const RENAME_PRICE: &str = "RENAME_PRICE";
pub const ADMINISTRATOR: &str = "administrator";

/// Read-only view of the contract storage fields the mint page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractView {
    pub max_supply: u64,
    pub max_purchase: u64,
    pub mint_price: Mutez,
    /// Number of tokens minted so far (size of `all_tokens`).
    pub minted_count: u64,
    pub paused: bool,
    pub amount_reserved: Option<u64>,
    pub rename_price: Option<Mutez>,
    pub administrator: Option<String>,
}

impl ContractView {
    /// Decode the view from a contract script.
    pub fn from_script(script: &ContractScript) -> ContractResult<Self> {
        let storage_type = section(&script.code, "storage").ok_or(ContractError::MissingStorageType)?;
        let fields = annotated_fields(storage_type, &script.storage)?;
        Self::from_fields(&fields)
    }

    pub fn from_fields(fields: &BTreeMap<String, Micheline>) -> ContractResult<Self> {
        let minted = required(fields, ALL_TOKENS)?;
        let minted_count = minted
            .seq_len()
            .ok_or_else(|| invalid(ALL_TOKENS, minted))? as u64;

        let paused = match fields.get(PAUSED) {
            Some(value) => value.as_bool().ok_or_else(|| invalid(PAUSED, value))?,
            None => false,
        };

        Ok(Self {
            max_supply: nat(fields, MAX_SUPPLY)?,
            max_purchase: nat(fields, MAX_PURCHASE)?,
            mint_price: Mutez(nat(fields, MINT_PRICE)?),
            minted_count,
            paused,
            amount_reserved: fields.get(AMOUNT_RESERVED).and_then(Micheline::as_u64),
            rename_price: fields.get(RENAME_PRICE).and_then(Micheline::as_u64).map(Mutez),
            administrator: fields.get(ADMINISTRATOR).and_then(address),
        })
    }

    /// Tokens that can still be minted.
    pub fn remaining_supply(&self) -> u64 {
        self.max_supply.saturating_sub(self.minted_count)
    }
}

fn required<'a>(fields: &'a BTreeMap<String, Micheline>, name: &str) -> ContractResult<&'a Micheline> {
    fields
        .get(name)
        .ok_or_else(|| ContractError::MissingField(name.to_string()))
}

fn nat(fields: &BTreeMap<String, Micheline>, name: &str) -> ContractResult<u64> {
    let value = required(fields, name)?;
    value.as_u64().ok_or_else(|| invalid(name, value))
}

fn invalid(name: &str, value: &Micheline) -> ContractError {
    ContractError::InvalidField {
        field: name.to_string(),
        value: format!("{:?}", value),
    }
}

/// Addresses come back readable (`tz1...`) or optimized (hex bytes).
fn address(value: &Micheline) -> Option<String> {
    match value {
        Micheline::String { string } => Some(string.clone()),
        Micheline::Bytes { bytes } => Some(format!("0x{}", bytes)),
        _ => None,
    }
}
