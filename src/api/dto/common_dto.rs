//! Shared DTO types and request parsing helpers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::DexError;

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Only list pools trading this token (hex).
    #[serde(default)]
    pub token: Option<String>,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items.
    pub total: u32,
    /// Total number of pages.
    pub total_pages: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl PaginationParams {
    /// Clamps `page` to at least 1 and `per_page` to `1..=100`.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, 100),
            token: self.token.clone(),
        }
    }

    /// Returns the requested page of `items` and its metadata.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> (Vec<T>, PaginationMeta) {
        let params = self.clamped();
        let total = u32::try_from(items.len()).unwrap_or(u32::MAX);
        let total_pages = total.div_ceil(params.per_page);
        let skip = usize::try_from((params.page - 1).saturating_mul(params.per_page))
            .unwrap_or(usize::MAX);
        let page = items
            .into_iter()
            .skip(skip)
            .take(params.per_page as usize)
            .collect();
        (
            page,
            PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages,
            },
        )
    }
}

/// Parses a decimal string amount.
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] naming `field` if the value is not
/// a base-10 `u128`.
pub fn parse_amount(field: &str, raw: &str) -> Result<u128, DexError> {
    raw.parse::<u128>()
        .map_err(|_| DexError::InvalidRequest(format!("{field}: invalid amount {raw:?}")))
}

/// Parses an optional amount, defaulting to zero.
///
/// # Errors
///
/// See [`parse_amount`].
pub fn parse_optional_amount(field: &str, raw: Option<&str>) -> Result<u128, DexError> {
    raw.map_or(Ok(0), |raw| parse_amount(field, raw))
}

/// Parses a hex identity (`TokenId`, `AccountId` or `PoolId`).
///
/// # Errors
///
/// Returns [`DexError::InvalidRequest`] naming `field` on malformed hex.
pub fn parse_id<T>(field: &str, raw: &str) -> Result<T, DexError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| DexError::InvalidRequest(format!("{field}: {e}")))
}
