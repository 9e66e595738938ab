//! System endpoints: health check and exchange configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
    pools: usize,
    ws_subscribers: usize,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, pool count and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            pools: state.dex.registry().len().await,
            ws_subscribers: state.event_bus.receiver_count(),
        }),
    )
}

/// Default fee response.
#[derive(Debug, Serialize, ToSchema)]
pub struct DefaultFeeResponse {
    /// Fee in basis points applied when a pool is created without one.
    pub fee_bps: u32,
}

/// `GET /config/default-fee`: Exchange default fee.
#[utoipa::path(
    get,
    path = "/config/default-fee",
    tag = "System",
    summary = "Default fee",
    description = "Returns the fee tier, in basis points, used for pools created without an explicit fee.",
    responses(
        (status = 200, description = "Default fee", body = DefaultFeeResponse),
    )
)]
pub async fn default_fee_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(DefaultFeeResponse {
        fee_bps: state.dex.default_fee(),
    })
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/default-fee", get(default_fee_handler))
}
