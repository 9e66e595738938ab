//! Pool endpoints: key derivation, creation, lookup, listing, LP
//! positions and event history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};

use crate::api::dto::{
    CreatePoolRequest, CreatePoolResponse, EventHistoryParams, EventHistoryResponse,
    LpBalanceResponse, PaginationParams, PoolDto, PoolKeyParams, PoolKeyResponse,
    PoolListResponse, PoolSummaryDto, StoredEventDto, parse_amount, parse_id,
    parse_optional_amount,
};
use crate::app_state::AppState;
use crate::domain::{AccountId, PoolId, TokenId, pool_id::sort_tokens};
use crate::error::{DexError, ErrorResponse};

/// `GET /pool-keys`: Derive a pool key.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on malformed token ids and
/// [`DexError::InvalidFee`] on an out-of-range fee.
#[utoipa::path(
    get,
    path = "/api/v1/pool-keys",
    tag = "Pools",
    summary = "Derive a pool key",
    description = "Returns the deterministic key of a token pair and fee tier. Token order does not matter.",
    params(PoolKeyParams),
    responses(
        (status = 200, description = "Key derived", body = PoolKeyResponse),
        (status = 400, description = "Invalid token or fee", body = ErrorResponse),
    )
)]
pub async fn derive_key(
    State(state): State<AppState>,
    Query(params): Query<PoolKeyParams>,
) -> Result<impl IntoResponse, DexError> {
    let token_a: TokenId = parse_id("token_a", &params.token_a)?;
    let token_b: TokenId = parse_id("token_b", &params.token_b)?;
    let fee_bps = crate::math::validate_fee(params.fee_bps.unwrap_or(state.dex.default_fee()))?;
    let pool_id = state.dex.derive_key(token_a, token_b, Some(fee_bps));
    let (token0, token1) = sort_tokens(token_a, token_b);

    Ok(Json(PoolKeyResponse {
        pool_id,
        token0,
        token1,
        fee_bps,
        exists: state.dex.registry().contains(pool_id).await,
    }))
}

/// `POST /pools`: Create and fund a pool.
///
/// # Errors
///
/// Returns [`DexError`] on invalid parameters, an existing pool, too
/// little initial liquidity, or a failed ledger pull.
#[utoipa::path(
    post,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "Create a pool",
    description = "Creates a constant-product pool funded by the creator. Mints sqrt(a*b) - 1000 LP units; 1000 are locked forever.",
    request_body = CreatePoolRequest,
    responses(
        (status = 201, description = "Pool created", body = CreatePoolResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 409, description = "Pool already exists", body = ErrorResponse),
        (status = 422, description = "Insufficient initial liquidity or balance", body = ErrorResponse),
    )
)]
pub async fn create_pool(
    State(state): State<AppState>,
    Json(req): Json<CreatePoolRequest>,
) -> Result<impl IntoResponse, DexError> {
    let creator: AccountId = parse_id("creator", &req.creator)?;
    let token_a: TokenId = parse_id("token_a", &req.token_a)?;
    let token_b: TokenId = parse_id("token_b", &req.token_b)?;
    let amount_a = parse_amount("amount_a", &req.amount_a)?;
    let amount_b = parse_amount("amount_b", &req.amount_b)?;
    let min_lp_out = parse_optional_amount("min_lp_out", req.min_lp_out.as_deref())?;

    let created = state
        .dex
        .create_pool(
            creator, token_a, token_b, amount_a, amount_b, min_lp_out, req.fee_bps,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePoolResponse {
            lp_minted: created.lp_minted.to_string(),
            pool: created.pool.into(),
        }),
    ))
}

/// `GET /pools`: List pools with pagination.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] on a malformed token filter.
#[utoipa::path(
    get,
    path = "/api/v1/pools",
    tag = "Pools",
    summary = "List pools",
    description = "Returns pools ordered by creation time, optionally only those trading a given token.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated pool list", body = PoolListResponse),
        (status = 400, description = "Invalid token filter", body = ErrorResponse),
    )
)]
pub async fn list_pools(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, DexError> {
    let token = params
        .token
        .as_deref()
        .map(|raw| parse_id::<TokenId>("token", raw))
        .transpose()?;
    let summaries = state.dex.list_pools(token).await;
    let (page, pagination) = params.paginate(summaries);

    Ok(Json(PoolListResponse {
        pools: page.into_iter().map(PoolSummaryDto::from).collect(),
        pagination,
    }))
}

/// `GET /pools/{id}`: Get pool state.
///
/// # Errors
///
/// Returns [`DexError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}",
    tag = "Pools",
    summary = "Get pool",
    description = "Returns tokens, reserves, fee and total LP supply of a pool.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
    ),
    responses(
        (status = 200, description = "Pool state", body = PoolDto),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_pool(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let view = state.dex.get_pool(pool_id).await?;
    Ok(Json(PoolDto::from(view)))
}

/// `GET /pools/{id}/positions/{owner}`: LP balance of an account.
///
/// # Errors
///
/// Returns [`DexError::PoolNotFound`] if the pool does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/positions/{owner}",
    tag = "Pools",
    summary = "Get LP balance",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
        ("owner" = String, Path, description = "Account (hex)"),
    ),
    responses(
        (status = 200, description = "LP balance", body = LpBalanceResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
    )
)]
pub async fn get_position(
    State(state): State<AppState>,
    Path((id, owner)): Path<(String, String)>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let owner: AccountId = parse_id("owner", &owner)?;
    let lp_balance = state.dex.get_lp_balance(pool_id, owner).await?;
    Ok(Json(LpBalanceResponse {
        pool_id,
        owner,
        lp_balance: lp_balance.to_string(),
    }))
}

/// `GET /pools/{id}/events`: Persisted event history.
///
/// # Errors
///
/// Returns [`DexError::PersistenceDisabled`] without a database,
/// [`DexError::PoolNotFound`] for an unknown pool.
#[utoipa::path(
    get,
    path = "/api/v1/pools/{id}/events",
    tag = "Pools",
    summary = "Pool event history",
    description = "Returns the pool's events from the PostgreSQL event log.",
    params(
        ("id" = String, Path, description = "Pool key (hex)"),
        EventHistoryParams,
    ),
    responses(
        (status = 200, description = "Event history", body = EventHistoryResponse),
        (status = 404, description = "Pool not found", body = ErrorResponse),
        (status = 503, description = "Persistence disabled", body = ErrorResponse),
    )
)]
pub async fn pool_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<EventHistoryParams>,
) -> Result<impl IntoResponse, DexError> {
    let pool_id: PoolId = parse_id("id", &id)?;
    let persistence = state
        .persistence
        .as_ref()
        .ok_or(DexError::PersistenceDisabled)?;
    state.dex.get_pool(pool_id).await?;

    let after = params.after.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let events = persistence.load_events_after(after, Some(pool_id)).await?;

    Ok(Json(EventHistoryResponse {
        pool_id,
        events: events.into_iter().map(StoredEventDto::from).collect(),
    }))
}

/// Pool routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/pool-keys", get(derive_key))
        .route("/pools", post(create_pool).get(list_pools))
        .route("/pools/{id}", get(get_pool))
        .route("/pools/{id}/positions/{owner}", get(get_position))
        .route("/pools/{id}/events", get(pool_events))
}
