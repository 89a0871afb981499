//! Mock Tezos node and remote signer for integration tests.
#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path as FsPath;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use kraznik_mint::blockchain::types::Network;
use kraznik_mint::config::{MintConfig, NetworkConfig};

pub const CHAIN_ID: &str = "NetXmockChain";
pub const PKH: &str = "tz1VSUr8wwNhLAzempoch5d6hLRiTh8Cjcjb";
pub const PUBLIC_KEY: &str = "edpkvGfYw3LyB1UcCahKQk4rF2tvbMUk8GFiTuMjL75uGXrpvKXhjn";
pub const CONTRACT: &str = "KT1C6bQhy4gSSt3HYd1E6xUoHV5ZMUbkRY38";
pub const OP_HASH: &str = "ooYympR9wfV98X4MUHtE78NjXYRDeMTAD4ei7zEZDqoHv2rfb1M";
pub const FORGED: &str = "a1b2c3d4e5f6";
pub const START_LEVEL: u64 = 100;

/// Bind a local port and serve `router` on it in the background.
async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Script JSON of a KraznikCollections-like contract.
pub fn script_json(minted: u64, max_purchase: u64, mint_price: u64) -> Value {
    let tokens: Vec<Value> = (0..minted).map(|i| json!({"int": i.to_string()})).collect();
    json!({
        "code": [
            {"prim": "parameter", "args": [{"prim": "or", "args": [
                {"prim": "pair", "args": [
                    {"prim": "nat", "annots": ["%purchase_quantity"]},
                    {"prim": "list", "args": [{"prim": "map", "args": [{"prim": "string"}, {"prim": "bytes"}]}], "annots": ["%token_metadatas"]}
                ], "annots": ["%mint"]},
                {"prim": "bool", "annots": ["%set_pause"]}
            ]}]},
            {"prim": "storage", "args": [{"prim": "pair", "args": [
                {"prim": "pair", "args": [
                    {"prim": "nat", "annots": ["%MAX_PURCHASE"]},
                    {"prim": "nat", "annots": ["%MAX_SUPPLY"]}
                ]},
                {"prim": "pair", "args": [
                    {"prim": "mutez", "annots": ["%MINT_PRICE"]},
                    {"prim": "pair", "args": [
                        {"prim": "address", "annots": ["%administrator"]},
                        {"prim": "pair", "args": [
                            {"prim": "set", "args": [{"prim": "nat"}], "annots": ["%all_tokens"]},
                            {"prim": "bool", "annots": ["%paused"]}
                        ]}
                    ]}
                ]}
            ]}]},
            {"prim": "code", "args": [[]]}
        ],
        "storage": {"prim": "Pair", "args": [
            {"prim": "Pair", "args": [{"int": max_purchase.to_string()}, {"int": "10000"}]},
            {"prim": "Pair", "args": [
                {"int": mint_price.to_string()},
                {"prim": "Pair", "args": [
                    {"string": "tz1admin"},
                    {"prim": "Pair", "args": [tokens, {"prim": "False"}]}
                ]}
            ]}
        ]}
    })
}

/// State of the mock node. Injection bakes a new block holding the operation.
pub struct NodeState {
    pub head_level: AtomicU64,
    pub minted: AtomicU64,
    pub max_purchase: u64,
    pub mint_price: u64,
    pub balance: u64,
    pub revealed: bool,
    pub fail_operation: bool,
    /// Time between injection and the block including the operation.
    pub inclusion_delay: Duration,
    pub forged: Mutex<Vec<Value>>,
    pub injected: Mutex<Vec<String>>,
    blocks: Mutex<HashMap<u64, Value>>,
}

impl NodeState {
    pub fn new(minted: u64, max_purchase: u64, mint_price: u64) -> Self {
        Self {
            head_level: AtomicU64::new(START_LEVEL),
            minted: AtomicU64::new(minted),
            max_purchase,
            mint_price,
            balance: 250_000_000,
            revealed: false,
            fail_operation: false,
            inclusion_delay: Duration::ZERO,
            forged: Mutex::new(Vec::new()),
            injected: Mutex::new(Vec::new()),
            blocks: Mutex::new(HashMap::new()),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_operation = true;
        self
    }

    pub fn slow(mut self, inclusion_delay: Duration) -> Self {
        self.inclusion_delay = inclusion_delay;
        self
    }

    pub fn minted(&self) -> u64 {
        self.minted.load(Ordering::SeqCst)
    }
}

/// Quantity of the mint call in a forge request body.
fn forged_quantity(body: &Value) -> u64 {
    body["contents"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|c| c["kind"] == "transaction")
        .filter_map(|c| c["parameters"]["value"]["args"][0]["int"].as_str())
        .filter_map(|q| q.parse::<u64>().ok())
        .sum()
}

async fn chain_id() -> Json<&'static str> {
    Json(CHAIN_ID)
}

async fn header(State(state): State<Arc<NodeState>>) -> Json<Value> {
    let level = state.head_level.load(Ordering::SeqCst);
    Json(json!({
        "hash": format!("BLmockBlock{}", level),
        "level": level,
        "chain_id": CHAIN_ID,
    }))
}

async fn contract_field(
    State(state): State<Arc<NodeState>>,
    Path((_block, address, field)): Path<(String, String, String)>,
) -> Response {
    match field.as_str() {
        "balance" => Json(json!(state.balance.to_string())).into_response(),
        "counter" => Json(json!("41")).into_response(),
        "manager_key" if state.revealed => Json(json!(PUBLIC_KEY)).into_response(),
        "manager_key" => Json(Value::Null).into_response(),
        "script" if address == CONTRACT => Json(script_json(
            state.minted(),
            state.max_purchase,
            state.mint_price,
        ))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!([]))).into_response(),
    }
}

async fn operations(
    State(state): State<Arc<NodeState>>,
    Path((level, _pass)): Path<(u64, u32)>,
) -> Json<Value> {
    let blocks = state.blocks.lock().unwrap();
    Json(blocks.get(&level).cloned().unwrap_or_else(|| json!([])))
}

async fn forge(State(state): State<Arc<NodeState>>, Json(body): Json<Value>) -> Json<Value> {
    state.forged.lock().unwrap().push(body);
    Json(json!(FORGED))
}

/// Bake a block holding the last injected operation.
fn bake(state: &NodeState) {
    let status = if state.fail_operation { "backtracked" } else { "applied" };
    let level = state.head_level.fetch_add(1, Ordering::SeqCst) + 1;
    state.blocks.lock().unwrap().insert(
        level,
        json!([{
            "hash": OP_HASH,
            "contents": [{
                "kind": "transaction",
                "metadata": {"operation_result": {"status": status}}
            }]
        }]),
    );

    if !state.fail_operation {
        let quantity = state.forged.lock().unwrap().last().map(forged_quantity).unwrap_or(0);
        state.minted.fetch_add(quantity, Ordering::SeqCst);
    }
}

async fn inject(State(state): State<Arc<NodeState>>, Json(signed): Json<String>) -> Json<Value> {
    state.injected.lock().unwrap().push(signed);

    if state.inclusion_delay.is_zero() {
        bake(&state);
    } else {
        let state = state.clone();
        tokio::spawn(async move {
            tokio::time::sleep(state.inclusion_delay).await;
            bake(&state);
        });
    }
    Json(json!(OP_HASH))
}

pub struct MockNode {
    pub url: String,
    pub state: Arc<NodeState>,
}

/// Start a mock node RPC server.
pub async fn start_node(state: NodeState) -> MockNode {
    let state = Arc::new(state);
    let router = Router::new()
        .route("/chains/main/chain_id", get(chain_id))
        .route("/chains/main/blocks/{block}/header", get(header))
        .route(
            "/chains/main/blocks/{block}/context/contracts/{address}/{field}",
            get(contract_field),
        )
        .route("/chains/main/blocks/{block}/operations/{pass}", get(operations))
        .route("/chains/main/blocks/{block}/helpers/forge/operations", post(forge))
        .route("/injection/operation", post(inject))
        .with_state(state.clone());
    MockNode {
        url: serve(router).await,
        state,
    }
}

/// Base58check signature the mock signer returns.
pub fn mock_signature() -> String {
    let mut bytes = vec![9, 245, 205, 134, 18];
    bytes.extend_from_slice(&[7u8; 64]);
    bs58::encode(bytes).with_check().into_string()
}

pub struct SignerState {
    pub pkh: String,
    pub sign_requests: Mutex<Vec<String>>,
}

async fn public_key(State(state): State<Arc<SignerState>>, Path(pkh): Path<String>) -> Response {
    if pkh != state.pkh {
        return (StatusCode::NOT_FOUND, "unknown key").into_response();
    }
    Json(json!({ "public_key": PUBLIC_KEY })).into_response()
}

async fn sign(
    State(state): State<Arc<SignerState>>,
    Path(pkh): Path<String>,
    Json(payload): Json<String>,
) -> Response {
    if pkh != state.pkh {
        return (StatusCode::NOT_FOUND, "unknown key").into_response();
    }
    state.sign_requests.lock().unwrap().push(payload);
    Json(json!({ "signature": mock_signature() })).into_response()
}

pub struct MockSigner {
    pub url: String,
    pub state: Arc<SignerState>,
}

/// Start a mock remote signer holding the key of `pkh`.
pub async fn start_signer(pkh: &str) -> MockSigner {
    let state = Arc::new(SignerState {
        pkh: pkh.to_string(),
        sign_requests: Mutex::new(Vec::new()),
    });
    let router = Router::new()
        .route("/keys/{pkh}", get(public_key).post(sign))
        .with_state(state.clone());
    MockSigner {
        url: serve(router).await,
        state,
    }
}

pub fn network_config(node_url: &str) -> NetworkConfig {
    NetworkConfig {
        network: Network::Custom,
        rpc_url: node_url.to_string(),
        chain_id: Some(CHAIN_ID.to_string()),
        rpc_timeout_secs: 5,
        confirmation_blocks: 1,
        confirmation_timeout_secs: 5,
        confirmation_poll_ms: 10,
        ..Default::default()
    }
}

/// Configuration pointing at the mocks. `session_dir` holds the session file.
pub fn mint_config(node: &MockNode, signer: &MockSigner, session_dir: Option<&FsPath>) -> MintConfig {
    let mut config = MintConfig::default();
    config.network = network_config(&node.url);
    config.contract.address = CONTRACT.to_string();
    config.wallet.signer_url = signer.url.clone();
    config.wallet.pkh = Some(PKH.to_string());
    config.wallet.signer_timeout_secs = 5;
    config.wallet.session_file =
        session_dir.map(|dir| dir.join("session.json").to_string_lossy().into_owned());
    config
}
