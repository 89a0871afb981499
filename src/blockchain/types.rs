//! Chain-specific types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::blockchain::michelson::Micheline;

// Re-export NetworkConfig from config module to avoid duplication
pub use crate::config::schema::NetworkConfig;

/// Number of mutez in one tez.
pub const MUTEZ_PER_TEZ: u64 = 1_000_000;

/// Amount of the native token, in mutez.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mutez(pub u64);

impl Mutez {
    pub const ZERO: Mutez = Mutez(0);

    pub fn checked_mul(self, factor: u64) -> Option<Mutez> {
        self.0.checked_mul(factor).map(Mutez)
    }

    /// Value in tez, for display only.
    pub fn as_tez(self) -> f64 {
        self.0 as f64 / MUTEZ_PER_TEZ as f64
    }

    /// Decimal tez string without trailing zeros ("69", "1.5").
    pub fn to_tez_string(self) -> String {
        let whole = self.0 / MUTEZ_PER_TEZ;
        let frac = self.0 % MUTEZ_PER_TEZ;
        if frac == 0 {
            return whole.to_string();
        }
        let frac = format!("{:06}", frac);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }
}

impl From<u64> for Mutez {
    fn from(mutez: u64) -> Self {
        Self(mutez)
    }
}

impl fmt::Display for Mutez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tezos networks a wallet can be asked to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Florencenet,
    Granadanet,
    Custom,
}

impl Network {
    /// Well-known chain identifier, if the network has a fixed one.
    pub fn chain_id(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("NetXdQprcVkpaWU"),
            Network::Florencenet => Some("NetXxkAx4woPLyu"),
            Network::Granadanet => Some("NetXz969SFaFn8k"),
            Network::Custom => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Florencenet => "florencenet",
            Network::Granadanet => "granadanet",
            Network::Custom => "custom",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash of an injected operation (`o...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationHash(pub String);

impl OperationHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur during chain operations.
#[derive(Debug, Error)]
pub enum TezosError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Operation was not confirmed within expected time.
    #[error("Operation not confirmed within {0} seconds")]
    ConfirmationTimeout(u64),

    /// Operation was included but did not apply.
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// Node serves a different chain than configured.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: String, actual: String },
}

/// Result type for chain operations.
pub type TezosResult<T> = Result<T, TezosError>;

/// Operation confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Operation is not yet in any block.
    Pending,
    /// Operation is in a block but not deep enough.
    Confirming { current: u32, required: u32 },
    /// Operation is confirmed with required block depth.
    Confirmed { block_level: u64 },
}

/// Head block header fields used by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub hash: String,
    pub level: u64,
    #[serde(default)]
    pub chain_id: Option<String>,
}

/// Contract code and current storage as returned by the `script` RPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractScript {
    pub code: Micheline,
    pub storage: Micheline,
}

/// A call to a smart contract entrypoint, before the wallet fills in
/// source, counter and fees.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractCall {
    pub destination: String,
    pub amount: Mutez,
    pub entrypoint: String,
    pub value: Micheline,
}

/// A manager operation from a block's fourth validation pass.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockOperation {
    pub hash: String,
    #[serde(default)]
    pub contents: Vec<serde_json::Value>,
}

impl BlockOperation {
    /// Describe the first content whose result is not `applied`.
    pub fn failure(&self) -> Option<String> {
        self.contents.iter().find_map(|content| {
            let status = content
                .pointer("/metadata/operation_result/status")
                .and_then(|s| s.as_str())?;
            if status == "applied" {
                return None;
            }
            let kind = content.get("kind").and_then(|k| k.as_str()).unwrap_or("unknown");
            let error_id = content
                .pointer("/metadata/operation_result/errors/0/id")
                .and_then(|id| id.as_str());
            Some(match error_id {
                Some(id) => format!("{} {} ({})", kind, status, id),
                None => format!("{} {}", kind, status),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mutez_tez_string() {
        assert_eq!(Mutez(69_000_000).to_tez_string(), "69");
        assert_eq!(Mutez(1_500_000).to_tez_string(), "1.5");
        assert_eq!(Mutez(1).to_tez_string(), "0.000001");
        assert_eq!(Mutez(3_000_000).as_tez(), 3.0);
    }

    #[test]
    fn test_mutez_checked_mul() {
        assert_eq!(Mutez(1_000_000).checked_mul(3), Some(Mutez(3_000_000)));
        assert_eq!(Mutez(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_network_serde() {
        let network: Network = serde_json::from_str("\"florencenet\"").unwrap();
        assert_eq!(network, Network::Florencenet);
        assert_eq!(network.chain_id(), Some("NetXxkAx4woPLyu"));
        assert_eq!(Network::Custom.chain_id(), None);
    }

    #[test]
    fn test_error_display() {
        let err = TezosError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = TezosError::ConfirmationTimeout(180);
        assert_eq!(err.to_string(), "Operation not confirmed within 180 seconds");

        let err = TezosError::ChainMismatch {
            expected: "NetXdQprcVkpaWU".into(),
            actual: "NetXxkAx4woPLyu".into(),
        };
        assert!(err.to_string().contains("NetXxkAx4woPLyu"));
    }

    #[test]
    fn test_block_operation_failure() {
        let applied: BlockOperation = serde_json::from_value(json!({
            "hash": "ooApplied",
            "contents": [{"kind": "transaction", "metadata": {"operation_result": {"status": "applied"}}}]
        }))
        .unwrap();
        assert_eq!(applied.failure(), None);

        let failed: BlockOperation = serde_json::from_value(json!({
            "hash": "ooFailed",
            "contents": [{
                "kind": "transaction",
                "metadata": {"operation_result": {
                    "status": "failed",
                    "errors": [{"id": "proto.009-PsFLoren.michelson_v1.script_rejected"}]
                }}
            }]
        }))
        .unwrap();
        let reason = failed.failure().unwrap();
        assert!(reason.starts_with("transaction failed"));
        assert!(reason.contains("script_rejected"));
    }
}
