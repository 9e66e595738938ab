//! Reference-ledger endpoints: register tokens, mint, query balances.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    BalanceResponse, MintRequest, RegisterTokenRequest, RegisterTokenResponse, parse_amount,
    parse_id,
};
use crate::app_state::AppState;
use crate::domain::{AccountId, TokenId};
use crate::error::{DexError, ErrorResponse};
use crate::ledger::Ledger;

/// `POST /tokens`: Register a token with its minter.
///
/// # Errors
///
/// Returns [`DexError::Unauthorized`] if the token is already registered
/// or the minter is the null identity.
#[utoipa::path(
    post,
    path = "/api/v1/tokens",
    tag = "Ledger",
    summary = "Register a token",
    request_body = RegisterTokenRequest,
    responses(
        (status = 201, description = "Token registered", body = RegisterTokenResponse),
        (status = 400, description = "Invalid identifiers", body = ErrorResponse),
        (status = 403, description = "Already registered", body = ErrorResponse),
    )
)]
pub async fn register_token(
    State(state): State<AppState>,
    Json(req): Json<RegisterTokenRequest>,
) -> Result<impl IntoResponse, DexError> {
    let token: TokenId = parse_id("token", &req.token)?;
    let minter: AccountId = parse_id("minter", &req.minter)?;
    state.ledger.register_token(token, minter)?;
    Ok((
        StatusCode::CREATED,
        Json(RegisterTokenResponse { token, minter }),
    ))
}

/// `POST /tokens/{token}/mint`: Mint to an account.
///
/// # Errors
///
/// Returns [`DexError::Unauthorized`] if the caller is not the minter.
#[utoipa::path(
    post,
    path = "/api/v1/tokens/{token}/mint",
    tag = "Ledger",
    summary = "Mint tokens",
    params(
        ("token" = String, Path, description = "Token (hex)"),
    ),
    request_body = MintRequest,
    responses(
        (status = 200, description = "Minted; returns the new balance", body = BalanceResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 403, description = "Caller is not the minter", body = ErrorResponse),
    )
)]
pub async fn mint(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(req): Json<MintRequest>,
) -> Result<impl IntoResponse, DexError> {
    let token: TokenId = parse_id("token", &token)?;
    let minter: AccountId = parse_id("minter", &req.minter)?;
    let to: AccountId = parse_id("to", &req.to)?;
    let amount = parse_amount("amount", &req.amount)?;
    let balance = state.ledger.mint(token, minter, to, amount)?;
    Ok(Json(BalanceResponse {
        token,
        owner: to,
        balance: balance.to_string(),
    }))
}

/// `GET /tokens/{token}/balances/{owner}`: Ledger balance.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on malformed identifiers.
#[utoipa::path(
    get,
    path = "/api/v1/tokens/{token}/balances/{owner}",
    tag = "Ledger",
    summary = "Get balance",
    params(
        ("token" = String, Path, description = "Token (hex)"),
        ("owner" = String, Path, description = "Account (hex)"),
    ),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 400, description = "Invalid identifiers", body = ErrorResponse),
    )
)]
pub async fn balance_of(
    State(state): State<AppState>,
    Path((token, owner)): Path<(String, String)>,
) -> Result<impl IntoResponse, DexError> {
    let token: TokenId = parse_id("token", &token)?;
    let owner: AccountId = parse_id("owner", &owner)?;
    Ok(Json(BalanceResponse {
        token,
        owner,
        balance: state.ledger.balance_of(token, owner).to_string(),
    }))
}

/// Ledger routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tokens", post(register_token))
        .route("/tokens/{token}/mint", post(mint))
        .route("/tokens/{token}/balances/{owner}", get(balance_of))
}
