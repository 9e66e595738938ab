//! Service layer: business logic orchestration.
//!
//! [`LiquidityManager`] creates pools and moves liquidity, [`SwapEngine`]
//! executes single-hop swaps, [`SwapRouter`] validates and runs multi-hop
//! routes, and [`DexService`] fronts all three for the API.
//!
//! Every mutation follows the same sequence: take the pool write lock
//! (concurrent callers queue here), enter the in-flight guard, checkpoint,
//! apply the state change, settle the resulting token movements with the
//! ledger in one batch, and restore the checkpoint if anything fails. The
//! guard is released before the lock. Events are published only after the
//! whole sequence succeeds.

pub mod dex_service;
pub mod liquidity;
pub mod router;
pub mod swap_engine;

#[cfg(test)]
mod proptest_properties;
#[cfg(test)]
pub(crate) mod test_support;

pub use dex_service::DexService;
pub use liquidity::{
    CreatePoolParams, CreatedPool, LiquidityAdded, LiquidityManager, LiquidityRemoved,
};
pub use router::{RouteQuote, SwapRouter};
pub use swap_engine::{HopFill, SwapEngine, SwapReceipt};

use crate::domain::{AccountId, PoolEntry};
use crate::error::DexError;
use crate::ledger::{Ledger, Transfer};

/// Rejects the null identity as a caller.
pub(crate) fn ensure_caller(caller: AccountId) -> Result<(), DexError> {
    if caller.is_zero() {
        return Err(DexError::Unauthorized(
            "the null identity cannot act as a caller".to_string(),
        ));
    }
    Ok(())
}

/// Applies a mutation to `entry`, then settles its transfers.
///
/// `apply` performs the state change and returns the token movements it
/// implies. If `apply` or the settlement fails, `entry` is restored to its
/// state before the call, including the LP position of `owner`.
pub(crate) fn settle_entry<T>(
    entry: &mut PoolEntry,
    owner: Option<AccountId>,
    ledger: &dyn Ledger,
    apply: impl FnOnce(&mut PoolEntry) -> Result<(T, Vec<Transfer>), DexError>,
) -> Result<T, DexError> {
    let checkpoint = entry.checkpoint(owner);
    let result = apply(entry).and_then(|(value, transfers)| {
        ledger.settle(&transfers)?;
        Ok(value)
    });
    if let Err(err) = &result {
        tracing::debug!(pool_id = %entry.pool_id, %err, "mutation rolled back");
        entry.restore(checkpoint);
    }
    result
}
