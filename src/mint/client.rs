//! The mint page controller.

use arc_swap::{ArcSwap, ArcSwapOption};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{Mutez, Network, OperationHash};
use crate::config::schema::MintConfig;
use crate::contract::{ContractHandle, ContractView, TokenMetadata, TokenNaming, MINT_ENTRYPOINT};
use crate::mint::request::MintRequest;
use crate::mint::session::Session;
use crate::mint::{MintError, MintResult};
use crate::observability::metrics;
use crate::wallet::provider::WalletProvider;

/// Message shown to the user after any failed mint.
pub const RETRY_NOTICE: &str = "Please try again after 50 seconds";

/// Static inputs of the mint workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSettings {
    pub contract_address: String,
    pub network: Network,
    pub naming: TokenNaming,
}

impl MintSettings {
    pub fn from_config(config: &MintConfig) -> Self {
        Self {
            contract_address: config.contract.address.clone(),
            network: config.network.network,
            naming: TokenNaming::from(&config.contract.token),
        }
    }
}

/// Everything the page renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageState {
    pub session: Session,
    pub contract_address: String,
    pub network: Network,
    pub contract: Option<ContractView>,
}

/// Outcome of a confirmed mint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MintReceipt {
    pub operation_hash: OperationHash,
    pub block_level: u64,
    pub quantity: u64,
    pub amount: Mutez,
    pub tokens: Vec<TokenMetadata>,
}

struct LoadedContract {
    handle: ContractHandle,
    view: ContractView,
}

/// Connects a wallet, reads the contract, and submits mints.
pub struct MintClient {
    wallet: Arc<dyn WalletProvider>,
    chain: Arc<dyn ChainRpc>,
    settings: MintSettings,
    session: ArcSwap<Session>,
    contract: ArcSwapOption<LoadedContract>,
    notice: ArcSwapOption<String>,
    /// Held for the whole submit; a second submit is refused.
    in_flight: Mutex<()>,
}

impl MintClient {
    pub fn new(wallet: Arc<dyn WalletProvider>, chain: Arc<dyn ChainRpc>, settings: MintSettings) -> Self {
        Self {
            wallet,
            chain,
            settings,
            session: ArcSwap::from_pointee(Session::default()),
            contract: ArcSwapOption::empty(),
            notice: ArcSwapOption::empty(),
            in_flight: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &MintSettings {
        &self.settings
    }

    /// Ask the wallet for permission, then load the account's balance.
    pub async fn connect(&self) -> MintResult<Session> {
        let account = self.wallet.request_permissions(self.settings.network).await?;
        tracing::info!(address = %account.address, network = %account.network, "Wallet connected");
        self.session
            .store(Arc::new(Session::connected(account.address.clone(), None)));
        self.load_session().await
    }

    /// Pick up an already-authorized account and fetch its balance.
    pub async fn load_session(&self) -> MintResult<Session> {
        let session = match self.wallet.active_account().await? {
            Some(account) => {
                let balance = self.chain.balance(&account.address).await?;
                tracing::debug!(address = %account.address, balance_mutez = %balance, "Session loaded");
                Session::connected(account.address, Some(balance))
            }
            None => Session::default(),
        };
        self.session.store(Arc::new(session.clone()));
        Ok(session)
    }

    /// Fetch the contract and its storage snapshot.
    pub async fn load_contract(&self) -> MintResult<ContractView> {
        let handle = ContractHandle::at(self.chain.as_ref(), &self.settings.contract_address).await?;
        handle.ensure_entrypoint(MINT_ENTRYPOINT)?;
        let view = handle.storage()?;

        tracing::info!(
            contract = %handle.address(),
            minted = view.minted_count,
            max_supply = view.max_supply,
            max_purchase = view.max_purchase,
            mint_price_mutez = %view.mint_price,
            "Contract loaded"
        );
        self.contract.store(Some(Arc::new(LoadedContract {
            handle,
            view: view.clone(),
        })));
        Ok(view)
    }

    /// Refresh session and contract state.
    pub async fn reload(&self) -> MintResult<()> {
        self.load_session().await?;
        self.load_contract().await?;
        Ok(())
    }

    /// Mint `quantity` tokens and wait for confirmation.
    ///
    /// On failure a retry notice is queued and state is left untouched.
    /// On success state is reloaded.
    pub async fn mint(&self, quantity: u64) -> MintResult<MintReceipt> {
        let result = self.submit_mint(quantity).await;

        match &result {
            Ok(receipt) => {
                tracing::info!(
                    operation = %receipt.operation_hash,
                    block_level = receipt.block_level,
                    quantity = receipt.quantity,
                    amount_mutez = %receipt.amount,
                    "Minted successfully"
                );
                metrics::record_mint("success", receipt.quantity);
                if let Err(e) = self.reload().await {
                    tracing::warn!(error = %e, "Reload after mint failed");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, quantity = quantity, "Mint failed");
                let outcome = if e.is_rejected_locally() || matches!(e, MintError::InFlight) {
                    "rejected"
                } else {
                    "failed"
                };
                metrics::record_mint(outcome, 0);
                self.notice.store(Some(Arc::new(RETRY_NOTICE.to_string())));
            }
        }
        result
    }

    /// [`mint`](Self::mint) on its own task. Dropping the returned future
    /// leaves the mint running to completion.
    pub async fn mint_detached(self: &Arc<Self>, quantity: u64) -> MintResult<MintReceipt> {
        let client = Arc::clone(self);
        match tokio::spawn(async move { client.mint(quantity).await }).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, quantity = quantity, "Mint task aborted");
                metrics::record_mint("failed", 0);
                self.notice.store(Some(Arc::new(RETRY_NOTICE.to_string())));
                Err(MintError::Aborted(e.to_string()))
            }
        }
    }

    async fn submit_mint(&self, quantity: u64) -> MintResult<MintReceipt> {
        let _guard = self.in_flight.try_lock().map_err(|_| MintError::InFlight)?;

        if !self.session.load().is_connected() {
            return Err(MintError::NotConnected);
        }
        let contract = self.contract.load_full().ok_or(MintError::ContractNotLoaded)?;

        let request = MintRequest::new(quantity, &contract.view, &self.settings.naming)?;
        tracing::info!(
            quantity = request.quantity,
            first_token = %request.records.first().map(|r| r.name.as_str()).unwrap_or(""),
            amount_tez = %request.amount.to_tez_string(),
            "Minting"
        );

        let call = request.to_call(&contract.handle);
        let operation_hash = self.wallet.send_operations(vec![call]).await?;
        let block_level = self.chain.wait_for_confirmation(&operation_hash).await?;

        Ok(MintReceipt {
            operation_hash,
            block_level,
            quantity: request.quantity,
            amount: request.amount,
            tokens: request.records,
        })
    }

    /// Clear the wallet session and reload.
    pub async fn disconnect(&self) -> MintResult<()> {
        self.wallet.clear_active_account().await?;
        tracing::info!("Wallet disconnected");
        self.reload().await
    }

    /// Whether the chain node answers.
    pub async fn node_healthy(&self) -> bool {
        self.chain.is_healthy().await
    }

    pub fn session(&self) -> Session {
        self.session.load().as_ref().clone()
    }

    pub fn contract_view(&self) -> Option<ContractView> {
        self.contract.load().as_ref().map(|c| c.view.clone())
    }

    pub fn snapshot(&self) -> PageState {
        PageState {
            session: self.session(),
            contract_address: self.settings.contract_address.clone(),
            network: self.settings.network,
            contract: self.contract_view(),
        }
    }

    /// Return and clear the pending notice.
    pub fn take_notice(&self) -> Option<String> {
        self.notice.swap(None).map(|n| n.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{ContractCall, ContractScript, TezosError, TezosResult};
    use crate::config::schema::TokenConfig;
    use crate::wallet::provider::{AccountInfo, WalletError, WalletResult};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const ADDRESS: &str = "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb";
    const CONTRACT: &str = "KT1C6bQhy4gSSt3HYd1E6xUoHV5ZMUbkRY38";

    struct MockWallet {
        active: std::sync::Mutex<Option<AccountInfo>>,
        sent: std::sync::Mutex<Vec<ContractCall>>,
        fail_send: bool,
    }

    impl MockWallet {
        fn new(fail_send: bool) -> Self {
            Self {
                active: std::sync::Mutex::new(None),
                sent: std::sync::Mutex::new(Vec::new()),
                fail_send,
            }
        }
    }

    #[async_trait]
    impl WalletProvider for MockWallet {
        async fn request_permissions(&self, network: Network) -> WalletResult<AccountInfo> {
            let account = AccountInfo {
                address: ADDRESS.to_string(),
                public_key: "edpkTest".to_string(),
                network,
                connected_at: Utc::now(),
            };
            *self.active.lock().unwrap() = Some(account.clone());
            Ok(account)
        }

        async fn active_account(&self) -> WalletResult<Option<AccountInfo>> {
            Ok(self.active.lock().unwrap().clone())
        }

        async fn clear_active_account(&self) -> WalletResult<()> {
            *self.active.lock().unwrap() = None;
            Ok(())
        }

        async fn send_operations(&self, calls: Vec<ContractCall>) -> WalletResult<OperationHash> {
            if self.fail_send {
                return Err(WalletError::Signer("user rejected".into()));
            }
            self.sent.lock().unwrap().extend(calls);
            Ok(OperationHash("ooTestHash".to_string()))
        }
    }

    struct MockChain {
        balance: Mutez,
        script: ContractScript,
        script_calls: AtomicUsize,
        confirm_delay: Duration,
    }

    #[async_trait]
    impl ChainRpc for MockChain {
        async fn balance(&self, _address: &str) -> TezosResult<Mutez> {
            Ok(self.balance)
        }

        async fn contract_script(&self, address: &str) -> TezosResult<ContractScript> {
            if address != CONTRACT {
                return Err(TezosError::Rpc("HTTP 404 Not Found".into()));
            }
            self.script_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.script.clone())
        }

        async fn wait_for_confirmation(&self, _hash: &OperationHash) -> TezosResult<u64> {
            tokio::time::sleep(self.confirm_delay).await;
            Ok(42)
        }

        async fn is_healthy(&self) -> bool {
            true
        }
    }

    fn script(minted: u64, max_purchase: u64, mint_price: u64) -> ContractScript {
        let tokens: Vec<_> = (0..minted).map(|i| json!({"int": i.to_string()})).collect();
        serde_json::from_value(json!({
            "code": [
                {"prim": "parameter", "args": [{"prim": "pair", "args": [
                    {"prim": "nat"},
                    {"prim": "list", "args": [{"prim": "map", "args": [{"prim": "string"}, {"prim": "bytes"}]}]}
                ], "annots": ["%mint"]}]},
                {"prim": "storage", "args": [{"prim": "pair", "args": [
                    {"prim": "pair", "args": [{"prim": "nat", "annots": ["%MAX_PURCHASE"]}, {"prim": "nat", "annots": ["%MAX_SUPPLY"]}]},
                    {"prim": "pair", "args": [
                        {"prim": "mutez", "annots": ["%MINT_PRICE"]},
                        {"prim": "pair", "args": [
                            {"prim": "set", "args": [{"prim": "nat"}], "annots": ["%all_tokens"]},
                            {"prim": "bool", "annots": ["%paused"]}
                        ]}
                    ]}
                ]}]},
                {"prim": "code", "args": [[]]}
            ],
            "storage": {"prim": "Pair", "args": [
                {"prim": "Pair", "args": [{"int": max_purchase.to_string()}, {"int": "10000"}]},
                {"prim": "Pair", "args": [
                    {"int": mint_price.to_string()},
                    {"prim": "Pair", "args": [tokens, {"prim": "False"}]}
                ]}
            ]}
        }))
        .unwrap()
    }

    fn settings() -> MintSettings {
        MintSettings {
            contract_address: CONTRACT.to_string(),
            network: Network::Florencenet,
            naming: TokenNaming::from(&TokenConfig::default()),
        }
    }

    fn client_with(wallet: Arc<MockWallet>, chain: Arc<MockChain>) -> MintClient {
        MintClient::new(wallet, chain, settings())
    }

    fn chain(minted: u64, max_purchase: u64, mint_price: u64) -> Arc<MockChain> {
        Arc::new(MockChain {
            balance: Mutez(12_345_678),
            script: script(minted, max_purchase, mint_price),
            script_calls: AtomicUsize::new(0),
            confirm_delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_connect_sets_address_and_balance() {
        let client = client_with(Arc::new(MockWallet::new(false)), chain(0, 2, 69_000_000));
        assert_eq!(client.session(), Session::default());

        let session = client.connect().await.unwrap();
        assert_eq!(session.address.as_deref(), Some(ADDRESS));
        assert_eq!(session.balance.as_deref(), Some("12345678"));
        assert_eq!(client.session(), session);
    }

    #[tokio::test]
    async fn test_load_session_without_account() {
        let client = client_with(Arc::new(MockWallet::new(false)), chain(0, 2, 69_000_000));
        let session = client.load_session().await.unwrap();
        assert!(!session.is_connected());
        assert_eq!(session.balance, None);
    }

    #[tokio::test]
    async fn test_disconnect_clears_session_and_reloads() {
        let chain = chain(3, 2, 69_000_000);
        let client = client_with(Arc::new(MockWallet::new(false)), chain.clone());
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();
        assert_eq!(chain.script_calls.load(Ordering::SeqCst), 1);

        client.disconnect().await.unwrap();
        assert_eq!(client.session(), Session::default());
        assert_eq!(chain.script_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.contract_view().unwrap().minted_count, 3);
    }

    #[tokio::test]
    async fn test_mint_builds_sequential_records() {
        let wallet = Arc::new(MockWallet::new(false));
        let client = client_with(wallet.clone(), chain(5, 2, 69_000_000));
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        let receipt = client.mint(2).await.unwrap();
        let names: Vec<_> = receipt.tokens.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Kangroo5", "Kangroo6"]);
        assert_eq!(receipt.block_level, 42);
        assert_eq!(receipt.amount, Mutez(138_000_000));

        let sent = wallet.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].entrypoint, "mint");
        assert_eq!(sent[0].destination, CONTRACT);
        let value = serde_json::to_value(&sent[0].value).unwrap();
        assert_eq!(value["args"][0], json!({"int": "2"}));
        assert_eq!(value["args"][1].as_array().unwrap().len(), 2);
        // "Kangroo6"
        assert_eq!(value["args"][1][1][0]["args"][1], json!({"bytes": "4b616e67726f6f36"}));
    }

    #[tokio::test]
    async fn test_mint_price_attached() {
        let wallet = Arc::new(MockWallet::new(false));
        let client = client_with(wallet.clone(), chain(0, 5, 1_000_000));
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        let receipt = client.mint(3).await.unwrap();
        assert_eq!(receipt.amount.as_tez(), 3.0);
        assert_eq!(wallet.sent.lock().unwrap()[0].amount, Mutez(3_000_000));
    }

    #[tokio::test]
    async fn test_mint_success_reloads() {
        let chain = chain(0, 2, 69_000_000);
        let client = client_with(Arc::new(MockWallet::new(false)), chain.clone());
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        client.mint(1).await.unwrap();
        assert_eq!(chain.script_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.take_notice(), None);
    }

    #[tokio::test]
    async fn test_failed_submit_sets_notice_without_state_change() {
        let chain = chain(5, 2, 69_000_000);
        let client = client_with(Arc::new(MockWallet::new(true)), chain.clone());
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();
        let before = client.snapshot();

        let err = client.mint(2).await.unwrap_err();
        assert!(matches!(err, MintError::Wallet(_)));
        assert_eq!(client.snapshot(), before);
        assert_eq!(chain.script_calls.load(Ordering::SeqCst), 1);

        assert_eq!(client.take_notice().as_deref(), Some(RETRY_NOTICE));
        assert_eq!(client.take_notice(), None);
    }

    #[tokio::test]
    async fn test_mint_rejected_over_max_purchase() {
        let wallet = Arc::new(MockWallet::new(false));
        let client = client_with(wallet.clone(), chain(0, 2, 69_000_000));
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        let err = client.mint(3).await.unwrap_err();
        assert!(matches!(err, MintError::ExceedsMaxPurchase { requested: 3, max: 2 }));
        assert!(err.is_rejected_locally());
        assert!(wallet.sent.lock().unwrap().is_empty());
        assert_eq!(client.take_notice().as_deref(), Some(RETRY_NOTICE));
    }

    #[tokio::test]
    async fn test_mint_requires_connection_and_contract() {
        let client = client_with(Arc::new(MockWallet::new(false)), chain(0, 2, 69_000_000));
        assert!(matches!(client.mint(1).await, Err(MintError::NotConnected)));

        client.connect().await.unwrap();
        assert!(matches!(client.mint(1).await, Err(MintError::ContractNotLoaded)));
    }

    #[tokio::test]
    async fn test_concurrent_mint_refused() {
        let client = client_with(Arc::new(MockWallet::new(false)), chain(0, 2, 69_000_000));
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        let _guard = client.in_flight.try_lock().unwrap();
        assert!(matches!(client.mint(1).await, Err(MintError::InFlight)));
    }

    #[tokio::test]
    async fn test_detached_mint_survives_dropped_caller() {
        let wallet = Arc::new(MockWallet::new(false));
        let chain = Arc::new(MockChain {
            balance: Mutez(12_345_678),
            script: script(0, 2, 69_000_000),
            script_calls: AtomicUsize::new(0),
            confirm_delay: Duration::from_millis(200),
        });
        let client = Arc::new(client_with(wallet.clone(), chain.clone()));
        client.connect().await.unwrap();
        client.load_contract().await.unwrap();

        let pending = client.mint_detached(1);
        assert!(tokio::time::timeout(Duration::from_millis(20), pending).await.is_err());

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(wallet.sent.lock().unwrap().len(), 1);
        // Reloaded once the confirmation landed
        assert_eq!(chain.script_calls.load(Ordering::SeqCst), 2);
        assert_eq!(client.take_notice(), None);
        assert!(client.in_flight.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_load_contract_unknown_address() {
        let mut settings = settings();
        settings.contract_address = "KT1Unknown".to_string();
        let client = MintClient::new(Arc::new(MockWallet::new(false)), chain(0, 2, 1), settings);
        assert!(matches!(client.load_contract().await, Err(MintError::Chain(_))));
        assert!(client.contract_view().is_none());
    }
}
