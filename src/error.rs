//! Exchange error types with HTTP status code mapping.
//!
//! [`DexError`] is the central error type for the engine and the gateway.
//! Every failure is terminal for the call that raised it and leaves pool
//! state and ledger balances untouched. Each variant maps to a numeric code
//! and an HTTP status used by the structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{IdentityParseError, PoolId};
use crate::ledger::LedgerError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 4005,
///     "message": "slippage exceeded: received 181, minimum 200",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Engine and gateway error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category           | HTTP Status                  |
/// |-----------|--------------------|------------------------------|
/// | 1000–1999 | Validation         | 400 Bad Request              |
/// | 2000–2999 | State / Not Found  | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server             | 500 / 503                    |
/// | 4000–4999 | Pool economics     | 422 Unprocessable Entity     |
/// | 5000–5999 | Ledger             | 403 Forbidden / 422          |
#[derive(Debug, thiserror::Error)]
pub enum DexError {
    /// A pool with the derived key already exists.
    #[error("pool already exists: {0}")]
    PoolExists(PoolId),

    /// No pool with the given key exists.
    #[error("pool not found: {0}")]
    PoolNotFound(PoolId),

    /// A deposit or burn amount is zero.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Initial LP issuance is non-positive or below the caller's minimum.
    #[error("insufficient initial liquidity: would mint {minted}, minimum {minimum}")]
    InsufficientInitialLiquidity {
        /// LP units the deposit would mint (0 if non-positive).
        minted: u128,
        /// Minimum requested by the caller.
        minimum: u128,
    },

    /// A deposit is too small to mint any LP units.
    #[error("deposit mints zero liquidity")]
    ZeroLiquidityMinted,

    /// The caller holds fewer LP units than requested.
    #[error("insufficient lp balance: requested {requested}, available {available}")]
    InsufficientLpBalance {
        /// LP units the caller tried to burn.
        requested: u128,
        /// LP units the caller holds.
        available: u128,
    },

    /// A token is not part of the pool, or a pair repeats one token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The received amount is below the caller's floor.
    #[error("slippage exceeded: received {received}, minimum {minimum}")]
    SlippageExceeded {
        /// Amount the operation would deliver.
        received: u128,
        /// Minimum accepted by the caller.
        minimum: u128,
    },

    /// A swap input is zero.
    #[error("input amount must be non-zero")]
    ZeroInput,

    /// The output recipient is the null identity.
    #[error("recipient must not be the null identity")]
    ZeroRecipient,

    /// A multi-hop path is malformed or does not match the registry.
    #[error("invalid path: {0}")]
    InvalidPath(&'static str),

    /// The caller may not perform the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Fee rate is outside `0..10_000` basis points.
    #[error("invalid fee: {0} bps")]
    InvalidFee(u32),

    /// The pool cannot deliver a non-zero output for the input.
    #[error("insufficient liquidity in pool")]
    InsufficientLiquidity,

    /// A mutating call on a pool is already in flight.
    #[error("pool {0} is locked by an in-flight operation")]
    Reentrant(PoolId),

    /// Intermediate arithmetic overflowed.
    #[error("arithmetic overflow: {0}")]
    Overflow(&'static str),

    /// The ledger rejected a token movement.
    #[error("ledger error: {0}")]
    Ledger(LedgerError),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// The persistence layer is switched off.
    #[error("persistence is disabled")]
    PersistenceDisabled,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DexError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::ZeroAmount => 1002,
            Self::ZeroInput => 1003,
            Self::ZeroRecipient => 1004,
            Self::InvalidToken(_) => 1005,
            Self::InvalidPath(_) => 1006,
            Self::InvalidFee(_) => 1007,
            Self::PoolNotFound(_) => 2001,
            Self::PoolExists(_) => 2002,
            Self::Reentrant(_) => 2003,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::PersistenceDisabled => 3002,
            Self::Overflow(_) => 3003,
            Self::InsufficientInitialLiquidity { .. } => 4001,
            Self::ZeroLiquidityMinted => 4002,
            Self::InsufficientLpBalance { .. } => 4003,
            Self::InsufficientLiquidity => 4004,
            Self::SlippageExceeded { .. } => 4005,
            Self::Unauthorized(_) => 5001,
            Self::Ledger(_) => 5002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::ZeroAmount
            | Self::ZeroInput
            | Self::ZeroRecipient
            | Self::InvalidToken(_)
            | Self::InvalidPath(_)
            | Self::InvalidFee(_) => StatusCode::BAD_REQUEST,
            Self::PoolNotFound(_) => StatusCode::NOT_FOUND,
            Self::PoolExists(_) | Self::Reentrant(_) => StatusCode::CONFLICT,
            Self::InsufficientInitialLiquidity { .. }
            | Self::ZeroLiquidityMinted
            | Self::InsufficientLpBalance { .. }
            | Self::InsufficientLiquidity
            | Self::SlippageExceeded { .. }
            | Self::Ledger(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::PersistenceDisabled => StatusCode::SERVICE_UNAVAILABLE,
            Self::Overflow(_) | Self::PersistenceError(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LedgerError> for DexError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unauthorized(reason) => Self::Unauthorized(reason),
            other => Self::Ledger(other),
        }
    }
}

impl From<IdentityParseError> for DexError {
    fn from(err: IdentityParseError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl IntoResponse for DexError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let details = match &self {
            Self::Ledger(inner) => Some(format!("{inner:?}")),
            _ => None,
        };
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
