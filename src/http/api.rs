//! JSON API and health endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::http::server::AppState;
use crate::mint::{MintError, MintReceipt, PageState, Session};

#[derive(Debug, Deserialize)]
pub struct MintBody {
    pub quantity: u64,
}

/// Error body: `{"error": ..., "notice": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    notice: Option<String>,
}

impl ApiError {
    fn internal(err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
            notice: None,
        }
    }

    /// Map a failed mint; the notice it queued is returned with it.
    fn from_mint(err: MintError, notice: Option<String>) -> Self {
        let status = match &err {
            MintError::InFlight => StatusCode::CONFLICT,
            e if e.is_rejected_locally() => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
            notice,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message, "notice": self.notice });
        (self.status, Json(body)).into_response()
    }
}

pub async fn state(State(state): State<AppState>) -> Json<PageState> {
    Json(state.mint.snapshot())
}

pub async fn connect(State(state): State<AppState>) -> Result<Json<Session>, ApiError> {
    state.mint.connect().await.map(Json).map_err(|e| {
        tracing::error!(error = %e, "Connect failed");
        ApiError::internal(e)
    })
}

pub async fn disconnect(State(state): State<AppState>) -> Result<Json<PageState>, ApiError> {
    match state.mint.disconnect().await {
        Ok(()) => Ok(Json(state.mint.snapshot())),
        Err(e) => {
            tracing::error!(error = %e, "Disconnect failed");
            Err(ApiError::internal(e))
        }
    }
}

pub async fn mint(
    State(state): State<AppState>,
    Json(body): Json<MintBody>,
) -> Result<Json<MintReceipt>, ApiError> {
    match state.mint.mint_detached(body.quantity).await {
        Ok(receipt) => Ok(Json(receipt)),
        Err(e) => Err(ApiError::from_mint(e, state.mint.take_notice())),
    }
}

/// Always 200; `node_healthy` reports the chain node separately.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.mint.snapshot();
    let node_healthy = state.mint.node_healthy().await;
    Json(json!({
        "status": "ok",
        "node_healthy": node_healthy,
        "network": snapshot.network,
        "contract_loaded": snapshot.contract.is_some(),
        "connected": snapshot.session.is_connected(),
    }))
}
