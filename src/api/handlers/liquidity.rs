//! Liquidity add/remove endpoint handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    AddLiquidityRequest, AddLiquidityResponse, RemoveLiquidityRequest, RemoveLiquidityResponse,
    parse_amount, parse_id, parse_optional_amount,
};
use crate::app_state::AppState;
use crate::domain::{AccountId, PoolId};
use crate::error::{DexError, ErrorResponse};

/// `POST /pools/{id}/liquidity/add`: Deposit at the pool ratio.
///
/// # Errors
///
/// Returns [`DexError`] on invalid parameters, missing pool, a zero mint,
/// slippage, or a failed ledger pull.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/liquidity/add",
    tag = "Liquidity",
    summary = "Add liquidity",
    description = "Deposits at most the desired amounts at the current reserve ratio and mints LP units. Excess is never taken.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
    ),
    request_body = AddLiquidityRequest,
    responses(
        (status = 200, description = "Liquidity added", body = AddLiquidityResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool busy", body = ErrorResponse),
        (status = 422, description = "Zero mint, slippage or balance", body = ErrorResponse),
    )
)]
pub async fn add_liquidity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddLiquidityRequest>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let provider: AccountId = parse_id("provider", &req.provider)?;
    let amount0 = parse_amount("amount0_desired", &req.amount0_desired)?;
    let amount1 = parse_amount("amount1_desired", &req.amount1_desired)?;
    let min_lp_out = parse_optional_amount("min_lp_out", req.min_lp_out.as_deref())?;

    let added = state
        .dex
        .add_liquidity(provider, pool_id, amount0, amount1, min_lp_out)
        .await?;

    Ok(Json(AddLiquidityResponse {
        pool_id,
        amount0: added.amount0.to_string(),
        amount1: added.amount1.to_string(),
        lp_minted: added.lp_minted.to_string(),
        lp_balance: added.lp_balance.to_string(),
    }))
}

/// `POST /pools/{id}/liquidity/remove`: Burn LP units.
///
/// # Errors
///
/// Returns [`DexError`] on invalid parameters, missing pool, insufficient
/// LP balance or slippage.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/liquidity/remove",
    tag = "Liquidity",
    summary = "Remove liquidity",
    description = "Burns LP units and pays out the proportional share of both reserves.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
    ),
    request_body = RemoveLiquidityRequest,
    responses(
        (status = 200, description = "Liquidity removed", body = RemoveLiquidityResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool busy", body = ErrorResponse),
        (status = 422, description = "Insufficient LP balance or slippage", body = ErrorResponse),
    )
)]
pub async fn remove_liquidity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RemoveLiquidityRequest>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let provider: AccountId = parse_id("provider", &req.provider)?;
    let lp_amount = parse_amount("lp_amount", &req.lp_amount)?;
    let amount0_min = parse_optional_amount("amount0_min", req.amount0_min.as_deref())?;
    let amount1_min = parse_optional_amount("amount1_min", req.amount1_min.as_deref())?;

    let removed = state
        .dex
        .remove_liquidity(provider, pool_id, lp_amount, amount0_min, amount1_min)
        .await?;

    Ok(Json(RemoveLiquidityResponse {
        pool_id,
        amount0: removed.amount0.to_string(),
        amount1: removed.amount1.to_string(),
        lp_balance: removed.lp_balance.to_string(),
    }))
}

/// Liquidity routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/liquidity/add", post(add_liquidity))
        .route("/pools/{id}/liquidity/remove", post(remove_liquidity))
}
