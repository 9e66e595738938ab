//! Concurrent pool storage with per-pool fine-grained locking.
//!
//! [`PoolRegistry`] stores all pools in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`]. This allows
//! concurrent reads on the same pool and concurrent writes on different
//! pools. Pools are never removed once inserted.
//!
//! The registry also owns the in-flight set used to reject reentrant
//! mutations: [`PoolRegistry::enter`] marks pools busy for the lifetime of
//! the returned [`InFlightGuard`] and fails immediately, without waiting,
//! if any of them is already busy.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::RwLock;

use super::pool_entry::{PoolEntry, PoolSummary, PoolView};
use super::{PoolId, TokenId};
use crate::error::DexError;

/// Central store for all pools.
///
/// # Concurrency
///
/// - Multiple tasks may read the same pool concurrently.
/// - Writes to different pools are concurrent.
/// - A mutation holds an [`InFlightGuard`] on its pools; a second mutation
///   on one of them fails with [`DexError::Reentrant`].
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<PoolId, Arc<RwLock<PoolEntry>>>>,
    in_flight: Mutex<HashSet<PoolId>>,
}

/// Marks a set of pools busy until dropped.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<PoolId>>,
    pools: Vec<PoolId>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for pool_id in &self.pools {
            set.remove(pool_id);
        }
    }
}

impl PoolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic, order-independent key for `(token_a, token_b, fee_bps)`.
    #[must_use]
    pub fn derive_key(token_a: TokenId, token_b: TokenId, fee_bps: u32) -> PoolId {
        PoolId::derive(token_a, token_b, fee_bps)
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashSet<PoolId>> {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks `pool_ids` as in flight.
    ///
    /// Either every pool is marked or none is.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Reentrant`] naming the first pool that is
    /// already in flight.
    pub fn enter(&self, pool_ids: &[PoolId]) -> Result<InFlightGuard<'_>, DexError> {
        let mut set = self.lock_in_flight();
        if let Some(busy) = pool_ids.iter().find(|id| set.contains(*id)) {
            tracing::warn!(pool_id = %busy, "reentrant call rejected");
            return Err(DexError::Reentrant(*busy));
        }
        let mut pools = Vec::with_capacity(pool_ids.len());
        for pool_id in pool_ids {
            if set.insert(*pool_id) {
                pools.push(*pool_id);
            }
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            pools,
        })
    }

    /// Returns `true` if a mutation on `pool_id` is in progress.
    #[must_use]
    pub fn is_in_flight(&self, pool_id: PoolId) -> bool {
        self.lock_in_flight().contains(&pool_id)
    }

    /// Inserts a new pool entry and runs `settle` before publishing it.
    ///
    /// The outer map stays write-locked while `settle` runs, so no other
    /// call can observe the entry before its funds are in custody. If
    /// `settle` fails, the entry is dropped and the error returned.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolExists`] if the key is already registered.
    /// - Any error returned by `settle`.
    pub async fn insert_settled<F>(&self, entry: PoolEntry, settle: F) -> Result<PoolId, DexError>
    where
        F: FnOnce(&PoolEntry) -> Result<(), DexError>,
    {
        let pool_id = entry.pool_id;
        let mut map = self.pools.write().await;
        if map.contains_key(&pool_id) {
            return Err(DexError::PoolExists(pool_id));
        }
        settle(&entry)?;
        map.insert(pool_id, Arc::new(RwLock::new(entry)));
        Ok(pool_id)
    }

    /// Inserts a new pool entry.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolExists`] if the key is already registered.
    pub async fn insert(&self, entry: PoolEntry) -> Result<PoolId, DexError> {
        self.insert_settled(entry, |_| Ok(())).await
    }

    /// Returns the pool entry behind its per-pool lock.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if no pool with the key exists.
    pub async fn get(&self, pool_id: PoolId) -> Result<Arc<RwLock<PoolEntry>>, DexError> {
        let map = self.pools.read().await;
        map.get(&pool_id)
            .cloned()
            .ok_or(DexError::PoolNotFound(pool_id))
    }

    /// Read-only view of one pool.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if no pool with the key exists.
    pub async fn view(&self, pool_id: PoolId) -> Result<PoolView, DexError> {
        let entry_lock = self.get(pool_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.view())
    }

    /// Returns `true` if a pool with the key exists.
    pub async fn contains(&self, pool_id: PoolId) -> bool {
        self.pools.read().await.contains_key(&pool_id)
    }

    /// Returns summaries of all pools, oldest first, optionally filtered to
    /// pools trading `token`.
    pub async fn list(&self, token: Option<TokenId>) -> Vec<PoolSummary> {
        let entries: Vec<Arc<RwLock<PoolEntry>>> =
            self.pools.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(entries.len());
        for entry_lock in entries {
            let entry = entry_lock.read().await;
            if let Some(token) = token
                && !entry.pool.contains(token)
            {
                continue;
            }
            summaries.push(PoolSummary::from(&*entry));
        }
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.view.pool_id.cmp(&b.view.pool_id))
        });
        summaries
    }

    /// Returns the number of pools in the registry.
    pub async fn len(&self) -> usize {
        self.pools.read().await.len()
    }

    /// Returns `true` if the registry contains no pools.
    pub async fn is_empty(&self) -> bool {
        self.pools.read().await.is_empty()
    }
}
