//! Liquidity add/remove DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::PoolId;

/// Request body for `POST /pools/{id}/liquidity/add`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddLiquidityRequest {
    /// Liquidity provider.
    pub provider: String,
    /// Most `token0` the provider will deposit.
    pub amount0_desired: String,
    /// Most `token1` the provider will deposit.
    pub amount1_desired: String,
    /// Lowest acceptable LP mint. Defaults to 0.
    #[serde(default)]
    pub min_lp_out: Option<String>,
}

/// Response body for `POST /pools/{id}/liquidity/add`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AddLiquidityResponse {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// `token0` deposited.
    pub amount0: String,
    /// `token1` deposited.
    pub amount1: String,
    /// LP units minted.
    pub lp_minted: String,
    /// Provider's LP balance afterwards.
    pub lp_balance: String,
}

/// Request body for `POST /pools/{id}/liquidity/remove`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveLiquidityRequest {
    /// Liquidity provider.
    pub provider: String,
    /// LP units to burn.
    pub lp_amount: String,
    /// Lowest acceptable `token0` payout. Defaults to 0.
    #[serde(default)]
    pub amount0_min: Option<String>,
    /// Lowest acceptable `token1` payout. Defaults to 0.
    #[serde(default)]
    pub amount1_min: Option<String>,
}

/// Response body for `POST /pools/{id}/liquidity/remove`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RemoveLiquidityResponse {
    /// Pool key.
    #[schema(value_type = String)]
    pub pool_id: PoolId,
    /// `token0` paid out.
    pub amount0: String,
    /// `token1` paid out.
    pub amount1: String,
    /// Provider's LP balance afterwards.
    pub lp_balance: String,
}
