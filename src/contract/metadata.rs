//! Token metadata records attached to a mint.

use serde::Serialize;

use crate::blockchain::michelson::Micheline;
use crate::config::schema::TokenConfig;

/// Metadata of one token, stored by the contract as `map string bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub uri: String,
}

impl TokenMetadata {
    /// Micheline map with keys in order (`name`, `symbol`, `tokenUri`).
    pub fn to_micheline(&self) -> Micheline {
        Micheline::Seq(vec![
            Micheline::elt(Micheline::string("name"), Micheline::bytes(self.name.as_bytes())),
            Micheline::elt(Micheline::string("symbol"), Micheline::bytes(self.symbol.as_bytes())),
            Micheline::elt(Micheline::string("tokenUri"), Micheline::bytes(self.uri.as_bytes())),
        ])
    }
}

/// Naming scheme for sequentially numbered tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenNaming {
    pub name_prefix: String,
    pub symbol_prefix: String,
    pub token_uri: String,
}

impl TokenNaming {
    pub fn record(&self, number: u64) -> TokenMetadata {
        TokenMetadata {
            name: format!("{}{}", self.name_prefix, number),
            symbol: format!("{}{}", self.symbol_prefix, number),
            uri: self.token_uri.clone(),
        }
    }
}

impl From<&TokenConfig> for TokenNaming {
    fn from(config: &TokenConfig) -> Self {
        Self {
            name_prefix: config.name_prefix.clone(),
            symbol_prefix: config.symbol_prefix.clone(),
            token_uri: config.token_uri.clone(),
        }
    }
}

/// `quantity` records numbered from `start`.
pub fn token_batch(start: u64, quantity: u64, naming: &TokenNaming) -> Vec<TokenMetadata> {
    (start..start.saturating_add(quantity))
        .map(|number| naming.record(number))
        .collect()
}
