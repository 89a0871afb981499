//! Connected-account state shown on the page.

use serde::Serialize;

use crate::blockchain::types::Mutez;

/// The user's wallet session. Both fields are empty when disconnected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Session {
    pub address: Option<String>,
    /// Balance in mutez, as a decimal string.
    pub balance: Option<String>,
}

impl Session {
    pub fn connected(address: impl Into<String>, balance: Option<Mutez>) -> Self {
        Self {
            address: Some(address.into()),
            balance: balance.map(|b| b.to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}
