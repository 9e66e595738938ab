//! Database models for events and snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{PoolId, PoolSummary, TokenId};

/// A stored event row from the `events` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Auto-increment row ID.
    pub id: i64,
    /// Pool that generated the event.
    pub pool_id: PoolId,
    /// Event type discriminator (e.g. `"swap_executed"`).
    pub event_type: String,
    /// JSONB payload with the serialized event.
    pub payload: serde_json::Value,
    /// Server-side creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A pool snapshot row from the `pool_snapshots` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Auto-increment row ID.
    pub id: i64,
    /// Pool that was snapshotted.
    pub pool_id: PoolId,
    /// Lower token.
    pub token0: TokenId,
    /// Higher token.
    pub token1: TokenId,
    /// Fee in basis points.
    pub fee_bps: u32,
    /// Reserves, supply and counters as JSONB.
    pub state_json: serde_json::Value,
    /// Snapshot timestamp.
    pub snapshot_at: DateTime<Utc>,
}

/// Builds the `state_json` column for a pool summary.
///
/// u128 quantities are written as strings; JSONB numbers cannot hold them.
#[must_use]
pub fn snapshot_state(summary: &PoolSummary) -> serde_json::Value {
    serde_json::json!({
        "reserve0": summary.view.reserve0.to_string(),
        "reserve1": summary.view.reserve1.to_string(),
        "total_lp_supply": summary.view.total_lp_supply.to_string(),
        "swap_count": summary.swap_count,
        "volume0": summary.volume0.to_string(),
        "volume1": summary.volume1.to_string(),
        "holder_count": summary.holder_count,
        "created_at": summary.created_at,
        "last_modified_at": summary.last_modified_at,
    })
}
