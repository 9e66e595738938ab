//! Domain events reflecting pool state mutations.
//!
//! Every committed mutation emits a [`PoolEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers and
//! optionally persisted to the PostgreSQL event log. Nothing is emitted for
//! a call that fails, including one whose settlement was rolled back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, PoolId, TokenId};

/// Type of liquidity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityChangeType {
    /// Liquidity was added to the pool.
    Add,
    /// Liquidity was removed from the pool.
    Remove,
}

/// Domain event emitted after every committed mutation.
///
/// Amounts are stored as `String` to preserve u128 precision when
/// serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PoolEvent {
    /// Emitted when a new pool is created.
    PoolCreated {
        /// Pool key.
        pool_id: PoolId,
        /// Lower token.
        token0: TokenId,
        /// Higher token.
        token1: TokenId,
        /// Fee in basis points.
        fee_bps: u32,
        /// Creator of the pool.
        creator: AccountId,
        /// Initial `token0` reserve.
        reserve0: String,
        /// Initial `token1` reserve.
        reserve1: String,
        /// LP units credited to the creator.
        lp_minted: String,
        /// Creation timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Emitted after liquidity is added or removed.
    LiquidityChanged {
        /// Pool key.
        pool_id: PoolId,
        /// Whether liquidity was added or removed.
        change_type: LiquidityChangeType,
        /// Liquidity provider.
        provider: AccountId,
        /// Amount of `token0` moved.
        amount0: String,
        /// Amount of `token1` moved.
        amount1: String,
        /// LP units minted or burned.
        lp_amount: String,
        /// Total LP supply after the change.
        new_total_lp_supply: String,
        /// Timestamp of the change.
        timestamp: DateTime<Utc>,
    },

    /// Emitted for each hop of a successful swap.
    SwapExecuted {
        /// Pool key.
        pool_id: PoolId,
        /// Identifier shared by every hop of one call.
        swap_id: Uuid,
        /// Zero-based hop position within the call.
        hop_index: u32,
        /// Caller paying the input.
        sender: AccountId,
        /// Receiver of the final output.
        recipient: AccountId,
        /// Token sold into the pool.
        token_in: TokenId,
        /// Token bought from the pool.
        token_out: TokenId,
        /// Input amount (string-encoded u128).
        amount_in: String,
        /// Output amount (string-encoded u128).
        amount_out: String,
        /// Fee retained (string-encoded u128).
        fee: String,
        /// `token0` reserve after the hop.
        reserve0: String,
        /// `token1` reserve after the hop.
        reserve1: String,
        /// Execution timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl PoolEvent {
    /// Returns the pool ID associated with this event.
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::PoolCreated { pool_id, .. }
            | Self::LiquidityChanged { pool_id, .. }
            | Self::SwapExecuted { pool_id, .. } => *pool_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PoolCreated { .. } => "pool_created",
            Self::LiquidityChanged { .. } => "liquidity_changed",
            Self::SwapExecuted { .. } => "swap_executed",
        }
    }

    /// Returns the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::PoolCreated { timestamp, .. }
            | Self::LiquidityChanged { timestamp, .. }
            | Self::SwapExecuted { timestamp, .. } => *timestamp,
        }
    }
}
