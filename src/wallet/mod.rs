//! Wallet subsystem.
//!
//! # Data Flow
//! ```text
//! MintClient
//!     → provider.rs (WalletProvider: permissions, active account, submit)
//!     → signer.rs (remote signer: public key, sign watermarked bytes)
//!     → store.rs (authorized account persisted across restarts)
//! ```

pub mod provider;
pub mod signer;
pub mod store;

pub use provider::{AccountInfo, WalletError, WalletProvider, WalletResult};
pub use signer::RemoteSignerWallet;
pub use store::SessionStore;
