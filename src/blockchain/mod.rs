//! Tezos chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkConfig (RPC URLs, network, timeouts)
//!     → client.rs (node RPC with failover and timeouts)
//!     → michelson.rs (Micheline values, annotated storage)
//!     → transaction.rs (build operations, watch confirmations)
//! ```
//!
//! # Constraints
//! - Keys never pass through this module; signing belongs to the wallet
//! - All RPC calls have configurable timeouts
//! - Injection goes to the primary node only

pub mod client;
pub mod michelson;
pub mod transaction;
pub mod types;

pub use client::{ChainRpc, TezosClient};
pub use michelson::Micheline;
pub use types::{ContractCall, ContractScript, Mutez, Network, OperationHash, TezosError, TezosResult};
