//! OpenAPI document for the REST API.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{liquidity, pool, swap, system, token};
use crate::error::{ErrorBody, ErrorResponse};

/// Generated OpenAPI 3 description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "hydra-dex",
        description = "Constant-product DEX: pools, liquidity, swaps and multi-hop routes."
    ),
    paths(
        system::health_handler,
        system::default_fee_handler,
        pool::derive_key,
        pool::create_pool,
        pool::list_pools,
        pool::get_pool,
        pool::get_position,
        pool::pool_events,
        liquidity::add_liquidity,
        liquidity::remove_liquidity,
        swap::execute_swap,
        swap::quote_swap,
        swap::swap_route,
        swap::quote_route,
        token::register_token,
        token::mint,
        token::balance_of,
    ),
    components(schemas(
        ErrorResponse,
        ErrorBody,
        dto::PaginationMeta,
        dto::PoolKeyResponse,
        dto::CreatePoolRequest,
        dto::CreatePoolResponse,
        dto::PoolDto,
        dto::PoolSummaryDto,
        dto::PoolListResponse,
        dto::LpBalanceResponse,
        dto::StoredEventDto,
        dto::EventHistoryResponse,
        dto::AddLiquidityRequest,
        dto::AddLiquidityResponse,
        dto::RemoveLiquidityRequest,
        dto::RemoveLiquidityResponse,
        dto::SwapRequest,
        dto::QuoteRequest,
        dto::QuoteResponse,
        dto::HopDto,
        dto::SwapResponse,
        dto::RouteSwapRequest,
        dto::RouteQuoteRequest,
        dto::RouteQuoteResponse,
        dto::RegisterTokenRequest,
        dto::RegisterTokenResponse,
        dto::MintRequest,
        dto::BalanceResponse,
        system::HealthResponse,
        system::DefaultFeeResponse,
    )),
    tags(
        (name = "System", description = "Health and configuration"),
        (name = "Pools", description = "Pool keys, creation and state"),
        (name = "Liquidity", description = "Deposits and withdrawals"),
        (name = "Swaps", description = "Single-pool swaps and quotes"),
        (name = "Routes", description = "Multi-hop swaps"),
        (name = "Ledger", description = "Reference token ledger"),
    )
)]
pub struct ApiDoc;
