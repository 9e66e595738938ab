//! Pool-related DTOs for keys, creation, lookup and listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::PaginationMeta;
use crate::domain::{AccountId, PoolId, PoolSummary, PoolView, TokenId};
use crate::persistence::StoredEvent;

/// Query parameters for `GET /pool-keys`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PoolKeyParams {
    /// One token of the pair (hex).
    pub token_a: String,
    /// The other token of the pair (hex).
    pub token_b: String,
    /// Fee tier; defaults to the exchange default.
    #[serde(default)]
    pub fee_bps: Option<u32>,
}

/// Response body for `GET /pool-keys`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolKeyResponse {
    /// Derived pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Lower token.
    #[schema(value_type = String)]
    pub token0: TokenId,
    /// Higher token.
    #[schema(value_type = String)]
    pub token1: TokenId,
    /// Fee tier used for the derivation.
    pub fee_bps: u32,
    /// Whether a pool is registered under the key.
    pub exists: bool,
}

/// Request body for `POST /pools`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePoolRequest {
    /// Account funding the pool.
    pub creator: String,
    /// One token of the pair.
    pub token_a: String,
    /// The other token of the pair.
    pub token_b: String,
    /// Deposit of `token_a` (string-encoded u128).
    pub amount_a: String,
    /// Deposit of `token_b` (string-encoded u128).
    pub amount_b: String,
    /// Lowest acceptable LP issuance. Defaults to 0.
    #[serde(default)]
    pub min_lp_out: Option<String>,
    /// Fee tier in basis points. Defaults to the exchange default.
    #[serde(default)]
    pub fee_bps: Option<u32>,
}

/// Pool fields as returned by every pool endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolDto {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Lower token.
    #[schema(value_type = String)]
    pub token0: TokenId,
    /// Higher token.
    #[schema(value_type = String)]
    pub token1: TokenId,
    /// `token0` reserve.
    pub reserve0: String,
    /// `token1` reserve.
    pub reserve1: String,
    /// Fee in basis points.
    pub fee_bps: u32,
    /// Outstanding LP units, locked minimum included.
    pub total_lp_supply: String,
}

impl From<PoolView> for PoolDto {
    fn from(view: PoolView) -> Self {
        Self {
            pool_id: view.pool_id,
            token0: view.token0,
            token1: view.token1,
            reserve0: view.reserve0.to_string(),
            reserve1: view.reserve1.to_string(),
            fee_bps: view.fee_bps,
            total_lp_supply: view.total_lp_supply.to_string(),
        }
    }
}

/// Response body for `POST /pools` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePoolResponse {
    /// LP units credited to the creator.
    pub lp_minted: String,
    /// Pool state after creation.
    pub pool: PoolDto,
}

/// Pool fields plus activity metadata.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolSummaryDto {
    /// Pool fields.
    pub pool: PoolDto,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
    /// Swap hops executed.
    pub swap_count: u64,
    /// Cumulative `token0` input.
    pub volume0: String,
    /// Cumulative `token1` input.
    pub volume1: String,
    /// LP holders, locked-liquidity sink included.
    pub holder_count: usize,
}

impl From<PoolSummary> for PoolSummaryDto {
    fn from(summary: PoolSummary) -> Self {
        Self {
            pool: summary.view.into(),
            created_at: summary.created_at,
            updated_at: summary.last_modified_at,
            swap_count: summary.swap_count,
            volume0: summary.volume0.to_string(),
            volume1: summary.volume1.to_string(),
            holder_count: summary.holder_count,
        }
    }
}

/// Paginated list response for `GET /pools`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PoolListResponse {
    /// Pool summaries for the current page.
    pub pools: Vec<PoolSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response body for `GET /pools/{id}/positions/{owner}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LpBalanceResponse {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Position owner.
    #[schema(value_type = String)]
    pub owner: AccountId,
    /// LP units held (string-encoded u128).
    pub lp_balance: String,
}

/// Query parameters for `GET /pools/{id}/events`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventHistoryParams {
    /// Only events strictly after this instant. Defaults to the epoch.
    #[serde(default)]
    pub after: Option<DateTime<Utc>>,
}

/// One persisted event.
#[derive(Debug, Serialize, ToSchema)]
pub struct StoredEventDto {
    /// Event log row id.
    pub id: i64,
    /// Event type discriminator.
    pub event_type: String,
    /// Serialized event.
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
    /// Time the event was emitted.
    pub created_at: DateTime<Utc>,
}

impl From<StoredEvent> for StoredEventDto {
    fn from(event: StoredEvent) -> Self {
        Self {
            id: event.id,
            event_type: event.event_type,
            payload: event.payload,
            created_at: event.created_at,
        }
    }
}

/// Response body for `GET /pools/{id}/events`.
#[derive(Debug, Serialize, ToSchema)]
pub struct EventHistoryResponse {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// Events in emission order.
    pub events: Vec<StoredEventDto>,
}
