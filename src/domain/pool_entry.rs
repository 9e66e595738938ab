//! Pool entry combining pool state, LP positions and server-side metadata.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::pool::Pool;
use super::{AccountId, PoolId, TokenId};
use crate::error::DexError;
use crate::math::MINIMUM_LIQUIDITY;

/// Aggregate stored in the registry for every pool.
///
/// The `pool` field holds reserves and supply; `positions` holds the LP
/// ledger of the pool, including the minimum liquidity locked under
/// [`AccountId::ZERO`]. The sum of `positions` always equals
/// `pool.total_lp_supply`.
#[derive(Debug)]
pub struct PoolEntry {
    /// Pool key (immutable after creation).
    pub pool_id: PoolId,

    /// Reserves, fee and LP supply.
    pub pool: Pool,

    /// LP balance per owner.
    positions: BTreeMap<AccountId, u128>,

    /// Creation timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,

    /// Timestamp of last state mutation.
    pub last_modified_at: DateTime<Utc>,

    /// Number of swap hops executed on this pool.
    pub swap_count: u64,

    /// Cumulative swap input in `token0` units.
    pub volume0: u128,

    /// Cumulative swap input in `token1` units.
    pub volume1: u128,
}

/// State captured before a mutation so that it can be undone if token
/// settlement fails.
#[derive(Debug, Clone)]
pub struct EntryCheckpoint {
    pool: Pool,
    position: Option<(AccountId, Option<u128>)>,
    last_modified_at: DateTime<Utc>,
    swap_count: u64,
    volume0: u128,
    volume1: u128,
}

impl PoolEntry {
    /// Creates an entry for a freshly opened pool.
    ///
    /// The creator is credited `creator_lp` and the sink is credited
    /// [`MINIMUM_LIQUIDITY`].
    #[must_use]
    pub fn new(pool_id: PoolId, pool: Pool, creator: AccountId, creator_lp: u128) -> Self {
        let now = Utc::now();
        let mut positions = BTreeMap::new();
        positions.insert(AccountId::ZERO, MINIMUM_LIQUIDITY);
        positions.insert(creator, creator_lp);
        Self {
            pool_id,
            pool,
            positions,
            created_at: now,
            last_modified_at: now,
            swap_count: 0,
            volume0: 0,
            volume1: 0,
        }
    }

    /// LP balance of `owner`; zero if the owner never deposited.
    #[must_use]
    pub fn lp_balance(&self, owner: AccountId) -> u128 {
        self.positions.get(&owner).copied().unwrap_or(0)
    }

    /// Number of owners with a non-zero LP balance, the sink included.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.positions.len()
    }

    /// Iterates over `(owner, balance)` pairs in owner order.
    pub fn positions(&self) -> impl Iterator<Item = (&AccountId, &u128)> {
        self.positions.iter()
    }

    /// Credits `amount` LP units to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Overflow`] if the balance would overflow.
    pub fn credit(&mut self, owner: AccountId, amount: u128) -> Result<u128, DexError> {
        let balance = self
            .lp_balance(owner)
            .checked_add(amount)
            .ok_or(DexError::Overflow("lp balance"))?;
        self.positions.insert(owner, balance);
        Ok(balance)
    }

    /// Debits `amount` LP units from `owner`, dropping emptied positions.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientLpBalance`] if `owner` holds less
    /// than `amount`.
    pub fn debit(&mut self, owner: AccountId, amount: u128) -> Result<u128, DexError> {
        let available = self.lp_balance(owner);
        let balance = available
            .checked_sub(amount)
            .ok_or(DexError::InsufficientLpBalance {
                requested: amount,
                available,
            })?;
        if balance == 0 {
            self.positions.remove(&owner);
        } else {
            self.positions.insert(owner, balance);
        }
        Ok(balance)
    }

    /// Records one swap hop selling `amount_in` of `token_in`.
    pub fn record_swap(&mut self, token_in: TokenId, amount_in: u128) {
        self.swap_count = self.swap_count.saturating_add(1);
        if token_in == self.pool.token0 {
            self.volume0 = self.volume0.saturating_add(amount_in);
        } else {
            self.volume1 = self.volume1.saturating_add(amount_in);
        }
        self.touch();
    }

    /// Updates the last-modified timestamp.
    pub fn touch(&mut self) {
        self.last_modified_at = Utc::now();
    }

    /// Captures the pool state and, if given, one owner's LP position.
    #[must_use]
    pub fn checkpoint(&self, owner: Option<AccountId>) -> EntryCheckpoint {
        EntryCheckpoint {
            pool: self.pool,
            position: owner.map(|o| (o, self.positions.get(&o).copied())),
            last_modified_at: self.last_modified_at,
            swap_count: self.swap_count,
            volume0: self.volume0,
            volume1: self.volume1,
        }
    }

    /// Restores the state captured by [`PoolEntry::checkpoint`].
    pub fn restore(&mut self, checkpoint: EntryCheckpoint) {
        self.pool = checkpoint.pool;
        if let Some((owner, balance)) = checkpoint.position {
            match balance {
                Some(balance) => {
                    self.positions.insert(owner, balance);
                }
                None => {
                    self.positions.remove(&owner);
                }
            }
        }
        self.last_modified_at = checkpoint.last_modified_at;
        self.swap_count = checkpoint.swap_count;
        self.volume0 = checkpoint.volume0;
        self.volume1 = checkpoint.volume1;
    }

    /// Read-only view of the pool fields.
    #[must_use]
    pub fn view(&self) -> PoolView {
        PoolView {
            pool_id: self.pool_id,
            token0: self.pool.token0,
            token1: self.pool.token1,
            reserve0: self.pool.reserve0,
            reserve1: self.pool.reserve1,
            fee_bps: self.pool.fee_bps,
            total_lp_supply: self.pool.total_lp_supply,
        }
    }
}

/// Snapshot returned by `get_pool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolView {
    /// Pool key.
    pub pool_id: PoolId,
    /// Lower token.
    pub token0: TokenId,
    /// Higher token.
    pub token1: TokenId,
    /// `token0` reserve.
    pub reserve0: u128,
    /// `token1` reserve.
    pub reserve1: u128,
    /// Fee in basis points.
    pub fee_bps: u32,
    /// Outstanding LP units.
    pub total_lp_supply: u128,
}

/// Pool view plus metadata, for list endpoints and snapshots.
#[derive(Debug, Clone)]
pub struct PoolSummary {
    /// Pool fields.
    pub view: PoolView,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last mutation timestamp.
    pub last_modified_at: DateTime<Utc>,
    /// Swap hops executed.
    pub swap_count: u64,
    /// Cumulative `token0` input.
    pub volume0: u128,
    /// Cumulative `token1` input.
    pub volume1: u128,
    /// LP holders, sink included.
    pub holder_count: usize,
}

impl From<&PoolEntry> for PoolSummary {
    fn from(entry: &PoolEntry) -> Self {
        Self {
            view: entry.view(),
            created_at: entry.created_at,
            last_modified_at: entry.last_modified_at,
            swap_count: entry.swap_count,
            volume0: entry.volume0,
            volume1: entry.volume1,
            holder_count: entry.holder_count(),
        }
    }
}
