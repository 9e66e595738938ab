//! Swap, quote and route DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PoolId, SwapOutcome, TokenId};
use crate::service::{HopFill, RouteQuote, SwapReceipt};

/// Request body for `POST /pools/{id}/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SwapRequest {
    /// Account paying the input.
    pub sender: String,
    /// Token sold into the pool.
    pub token_in: String,
    /// Exact input amount (string-encoded u128).
    pub amount_in: String,
    /// Minimum output for slippage protection. Defaults to 0.
    #[serde(default)]
    pub min_amount_out: Option<String>,
    /// Receiver of the output. Defaults to `sender`.
    #[serde(default)]
    pub recipient: Option<String>,
}

/// Request body for `POST /pools/{id}/quote`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    /// Token sold into the pool.
    pub token_in: String,
    /// Exact input amount (string-encoded u128).
    pub amount_in: String,
}

/// Response body for `POST /pools/{id}/quote`.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuoteResponse {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Token sold into the pool.
    #[schema(value_type = String)]
    pub token_in: TokenId,
    /// Token bought from the pool.
    #[schema(value_type = String)]
    pub token_out: TokenId,
    /// Input amount.
    pub amount_in: String,
    /// Output the swap would deliver.
    pub amount_out: String,
    /// Fee the pool would retain.
    pub fee: String,
}

impl QuoteResponse {
    /// Builds the response for `pool_id` from a quoted outcome.
    #[must_use]
    pub fn new(pool_id: PoolId, outcome: SwapOutcome) -> Self {
        Self {
            pool_id,
            token_in: outcome.token_in,
            token_out: outcome.token_out,
            amount_in: outcome.amount_in.to_string(),
            amount_out: outcome.amount_out.to_string(),
            fee: outcome.fee.to_string(),
        }
    }
}

/// One hop of an executed or quoted swap.
#[derive(Debug, Serialize, ToSchema)]
pub struct HopDto {
    /// Pool traded against.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Token sold into the pool.
    #[schema(value_type = String)]
    pub token_in: TokenId,
    /// Token bought from the pool.
    #[schema(value_type = String)]
    pub token_out: TokenId,
    /// Hop input.
    pub amount_in: String,
    /// Hop output.
    pub amount_out: String,
    /// Fee retained by the pool.
    pub fee: String,
    /// `token0` reserve after the hop.
    pub reserve0: String,
    /// `token1` reserve after the hop.
    pub reserve1: String,
}

impl From<&HopFill> for HopDto {
    fn from(fill: &HopFill) -> Self {
        Self {
            pool_id: fill.pool_id,
            token_in: fill.outcome.token_in,
            token_out: fill.outcome.token_out,
            amount_in: fill.outcome.amount_in.to_string(),
            amount_out: fill.outcome.amount_out.to_string(),
            fee: fill.outcome.fee.to_string(),
            reserve0: fill.reserve0.to_string(),
            reserve1: fill.reserve1.to_string(),
        }
    }
}

/// Response body for single- and multi-hop swaps.
#[derive(Debug, Serialize, ToSchema)]
pub struct SwapResponse {
    /// Identifier shared by the swap's events.
    pub swap_id: String,
    /// Input paid by the sender.
    pub amount_in: String,
    /// Output delivered to the recipient.
    pub amount_out: String,
    /// Hops in execution order.
    pub hops: Vec<HopDto>,
}

impl From<SwapReceipt> for SwapResponse {
    fn from(receipt: SwapReceipt) -> Self {
        Self {
            swap_id: receipt.swap_id.to_string(),
            amount_in: receipt.amount_in.to_string(),
            amount_out: receipt.amount_out.to_string(),
            hops: receipt.hops.iter().map(HopDto::from).collect(),
        }
    }
}

/// Request body for `POST /routes/swap`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteSwapRequest {
    /// Account paying the input.
    pub sender: String,
    /// Alternating `[token, pool, token, ..., token]` hex identifiers.
    pub path: Vec<String>,
    /// Input of the first hop (string-encoded u128).
    pub amount_in: String,
    /// Minimum output of the last hop. Defaults to 0.
    #[serde(default)]
    pub min_amount_out: Option<String>,
    /// Receiver of the final output.
    pub recipient: String,
}

/// Request body for `POST /routes/quote`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RouteQuoteRequest {
    /// Alternating `[token, pool, token, ..., token]` hex identifiers.
    pub path: Vec<String>,
    /// Input of the first hop (string-encoded u128).
    pub amount_in: String,
}

/// Response body for `POST /routes/quote`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RouteQuoteResponse {
    /// Output the route would deliver.
    pub amount_out: String,
    /// Simulated hops in execution order.
    pub hops: Vec<HopDto>,
}

impl From<RouteQuote> for RouteQuoteResponse {
    fn from(quote: RouteQuote) -> Self {
        Self {
            amount_out: quote.amount_out.to_string(),
            hops: quote.hops.iter().map(HopDto::from).collect(),
        }
    }
}
