//! Reference-ledger DTOs: token registration, minting and balances.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AccountId, TokenId};

/// Request body for `POST /tokens`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterTokenRequest {
    /// Token identifier (hex).
    pub token: String,
    /// Sole account allowed to mint the token.
    pub minter: String,
}

/// Response body for `POST /tokens` (201 Created).
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterTokenResponse {
    /// Registered token.
    #[schema(value_type = String)]
    pub token: TokenId,
    /// Its minter.
    #[schema(value_type = String)]
    pub minter: AccountId,
}

/// Request body for `POST /tokens/{token}/mint`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MintRequest {
    /// Caller; must be the token's minter.
    pub minter: String,
    /// Account credited.
    pub to: String,
    /// Amount minted (string-encoded u128).
    pub amount: String,
}

/// Response body for `GET /tokens/{token}/balances/{owner}` and mints.
#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    /// Token.
    #[schema(value_type = String)]
    pub token: TokenId,
    /// Account.
    #[schema(value_type = String)]
    pub owner: AccountId,
    /// Balance (string-encoded u128).
    pub balance: String,
}
