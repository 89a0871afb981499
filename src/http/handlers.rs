//! Page and form handlers.
//!
//! Each form post performs its action and answers `303 See Other` back to
//! the page, which re-renders from fresh state.

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use crate::http::page;
use crate::http::server::AppState;

#[derive(Debug, Deserialize)]
pub struct MintForm {
    #[serde(default)]
    pub quantity: String,
}

/// Parse the form's quantity. Anything unparsable counts as zero, which the
/// mint workflow rejects.
pub fn parse_quantity(raw: &str) -> u64 {
    raw.trim().parse().unwrap_or(0)
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.mint.snapshot();
    let notice = state.mint.take_notice();
    Html(page::render(&snapshot, notice.as_deref()))
}

pub async fn connect(State(state): State<AppState>) -> Response {
    match state.mint.connect().await {
        Ok(_) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Connect failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

pub async fn disconnect(State(state): State<AppState>) -> Response {
    match state.mint.disconnect().await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Disconnect failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Failures surface as the page notice, so this always redirects.
pub async fn mint(State(state): State<AppState>, Form(form): Form<MintForm>) -> Redirect {
    let _ = state.mint.mint_detached(parse_quantity(&form.quantity)).await;
    Redirect::to("/")
}
