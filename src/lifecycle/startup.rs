//! Startup orchestration.
//!
//! Subsystems initialize in dependency order: node client, session store,
//! wallet, mint client. The initial session and contract load is best
//! effort; the page shows whatever could be fetched.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::client::TezosClient;
use crate::blockchain::types::TezosError;
use crate::config::schema::MintConfig;
use crate::mint::{MintClient, MintSettings};
use crate::wallet::{RemoteSignerWallet, SessionStore, WalletError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Chain client: {0}")]
    Chain(#[from] TezosError),

    #[error("Wallet: {0}")]
    Wallet(#[from] WalletError),
}

/// Build the mint client from configuration and load initial state.
pub async fn bootstrap(config: &MintConfig) -> Result<Arc<MintClient>, StartupError> {
    let chain = TezosClient::new(config.network.clone()).await?;
    let store = SessionStore::new(config.wallet.session_file.as_ref().map(PathBuf::from));
    let wallet = RemoteSignerWallet::new(&config.wallet, config.network.network, chain.clone(), store)?;

    let client = Arc::new(MintClient::new(
        Arc::new(wallet),
        Arc::new(chain),
        MintSettings::from_config(config),
    ));

    if let Err(e) = client.load_session().await {
        tracing::warn!(error = %e, "Initial session load failed");
    }
    if let Err(e) = client.load_contract().await {
        tracing::warn!(error = %e, "Initial contract load failed");
    }

    tracing::info!(
        contract = %config.contract.address,
        network = %config.network.network,
        "Mint client ready"
    );
    Ok(client)
}
