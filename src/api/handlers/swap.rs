//! Swap, quote and multi-hop route endpoint handlers.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    QuoteRequest, QuoteResponse, RouteQuoteRequest, RouteQuoteResponse, RouteSwapRequest,
    SwapRequest, SwapResponse, parse_amount, parse_id, parse_optional_amount,
};
use crate::app_state::AppState;
use crate::domain::{AccountId, PathElement, PoolId, SwapPath, TokenId};
use crate::error::{DexError, ErrorResponse};

/// `POST /pools/{id}/swap`: Execute an exact-input swap.
///
/// # Errors
///
/// Returns [`DexError`] on invalid parameters, missing pool, a foreign
/// token, slippage, or a failed ledger transfer.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/swap",
    tag = "Swaps",
    summary = "Execute a swap",
    description = "Sells `amount_in` of `token_in` into the pool and sends the output to the recipient.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
    ),
    request_body = SwapRequest,
    responses(
        (status = 200, description = "Swap executed", body = SwapResponse),
        (status = 400, description = "Invalid swap parameters", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 409, description = "Pool busy", body = ErrorResponse),
        (status = 422, description = "Slippage or insufficient liquidity", body = ErrorResponse),
    )
)]
pub async fn execute_swap(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SwapRequest>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let sender: AccountId = parse_id("sender", &req.sender)?;
    let token_in: TokenId = parse_id("token_in", &req.token_in)?;
    let amount_in = parse_amount("amount_in", &req.amount_in)?;
    let min_amount_out = parse_optional_amount("min_amount_out", req.min_amount_out.as_deref())?;
    let recipient: AccountId = match req.recipient.as_deref() {
        Some(raw) => parse_id("recipient", raw)?,
        None => sender,
    };

    let receipt = state
        .dex
        .swap(sender, pool_id, token_in, amount_in, min_amount_out, recipient)
        .await?;

    Ok(Json(SwapResponse::from(receipt)))
}

/// `POST /pools/{id}/quote`: Get swap quote (read-only).
///
/// # Errors
///
/// Returns [`DexError`] on invalid parameters, missing pool or a zero
/// output.
#[utoipa::path(
    post,
    path = "/api/v1/pools/{id}/quote",
    tag = "Swaps",
    summary = "Get swap quote",
    description = "Returns the output a swap would deliver without executing it. The pool state is not modified.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
    ),
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Quote computed", body = QuoteResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 422, description = "Insufficient liquidity", body = ErrorResponse),
    )
)]
pub async fn quote_swap(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<QuoteRequest>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let token_in: TokenId = parse_id("token_in", &req.token_in)?;
    let amount_in = parse_amount("amount_in", &req.amount_in)?;

    let outcome = state.dex.quote_swap(pool_id, token_in, amount_in).await?;
    Ok(Json(QuoteResponse::new(pool_id, outcome)))
}

/// `POST /routes/swap`: Execute a multi-hop swap.
///
/// # Errors
///
/// Returns [`DexError`] on an invalid path, zero input or recipient,
/// final-output slippage, or a failed ledger transfer. No hop is applied
/// unless all of them are.
#[utoipa::path(
    post,
    path = "/api/v1/routes/swap",
    tag = "Routes",
    summary = "Execute a multi-hop swap",
    description = "Swaps along `[token, pool, token, ..., token]`; each hop's output is the next hop's input. Slippage is checked on the final output only.",
    request_body = RouteSwapRequest,
    responses(
        (status = 200, description = "Route executed", body = SwapResponse),
        (status = 400, description = "Invalid path or parameters", body = ErrorResponse),
        (status = 409, description = "A pool on the path is busy", body = ErrorResponse),
        (status = 422, description = "Slippage or insufficient liquidity", body = ErrorResponse),
    )
)]
pub async fn swap_route(
    State(state): State<AppState>,
    Json(req): Json<RouteSwapRequest>,
) -> Result<impl IntoResponse, DexError> {
    let sender: AccountId = parse_id("sender", &req.sender)?;
    let recipient: AccountId = parse_id("recipient", &req.recipient)?;
    let amount_in = parse_amount("amount_in", &req.amount_in)?;
    let min_amount_out = parse_optional_amount("min_amount_out", req.min_amount_out.as_deref())?;
    let path = parse_path(&req.path)?;

    let receipt = state
        .dex
        .swap_multi_hop(sender, &path, amount_in, min_amount_out, recipient)
        .await?;

    Ok(Json(SwapResponse::from(receipt)))
}

/// `POST /routes/quote`: Quote a multi-hop swap (read-only).
///
/// # Errors
///
/// Returns [`DexError`] on an invalid path or a hop with zero output.
#[utoipa::path(
    post,
    path = "/api/v1/routes/quote",
    tag = "Routes",
    summary = "Quote a multi-hop swap",
    request_body = RouteQuoteRequest,
    responses(
        (status = 200, description = "Route quoted", body = RouteQuoteResponse),
        (status = 400, description = "Invalid path or parameters", body = ErrorResponse),
        (status = 422, description = "Insufficient liquidity", body = ErrorResponse),
    )
)]
pub async fn quote_route(
    State(state): State<AppState>,
    Json(req): Json<RouteQuoteRequest>,
) -> Result<impl IntoResponse, DexError> {
    let amount_in = parse_amount("amount_in", &req.amount_in)?;
    let path = parse_path(&req.path)?;
    let quote = state.dex.quote_route(&path, amount_in).await?;
    Ok(Json(RouteQuoteResponse::from(quote)))
}

/// Decodes hex path words and types them by position: tokens at even
/// indices, pool keys at odd ones.
fn parse_path(raw: &[String]) -> Result<Vec<PathElement>, DexError> {
    let words = raw
        .iter()
        .enumerate()
        .map(|(i, word)| parse_id::<TokenId>(&format!("path[{i}]"), word).map(|id| *id.as_bytes()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SwapPath::from_words(&words)?.elements())
}

/// Swap and route routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pools/{id}/swap", post(execute_swap))
        .route("/pools/{id}/quote", post(quote_swap))
        .route("/routes/swap", post(swap_route))
        .route("/routes/quote", post(quote_route))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn word(b: u8) -> String {
        format!("0x{}", hex::encode([b; 32]))
    }

    #[test]
    fn path_words_are_typed_by_position() {
        let Ok(elements) = parse_path(&[word(1), word(9), word(2)]) else {
            panic!("valid path");
        };
        assert_eq!(
            elements,
            vec![
                PathElement::Token(TokenId::from_bytes([1; 32])),
                PathElement::Pool(PoolId::from_bytes([9; 32])),
                PathElement::Token(TokenId::from_bytes([2; 32])),
            ]
        );
    }

    #[test]
    fn short_path_is_invalid() {
        assert!(matches!(
            parse_path(&[word(1), word(9)]),
            Err(DexError::InvalidPath(_))
        ));
    }

    #[test]
    fn malformed_word_is_a_request_error() {
        assert!(matches!(
            parse_path(&[word(1), "0xnothex".to_string(), word(2)]),
            Err(DexError::InvalidRequest(msg)) if msg.starts_with("path[1]")
        ));
    }
}
