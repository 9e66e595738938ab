//! Multi-hop path validation and execution.
//!
//! A route runs its hops strictly left to right, feeding each hop's output
//! into the next with no intermediate floor. All pools on the path are
//! guarded and write-locked in key order for the whole route; the caller's
//! input pull and the recipient's output push settle as one batch at the
//! end. A failure at any point restores every pool touched.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OwnedRwLockWriteGuard;
use uuid::Uuid;

use super::ensure_caller;
use super::swap_engine::{HopFill, SwapEngine, SwapReceipt};
use crate::domain::{
    AccountId, EntryCheckpoint, EventBus, PathElement, Pool, PoolEntry, PoolId, PoolRegistry,
    SwapPath,
};
use crate::error::DexError;
use crate::ledger::{Ledger, Transfer};

/// Read-only result of [`SwapRouter::quote_route`].
#[derive(Debug, Clone)]
pub struct RouteQuote {
    /// Output the route would deliver.
    pub amount_out: u128,
    /// Simulated hops in execution order.
    pub hops: Vec<HopFill>,
}

/// Validates paths and sequences swaps across pools.
#[derive(Debug, Clone)]
pub struct SwapRouter {
    registry: Arc<PoolRegistry>,
    ledger: Arc<dyn Ledger>,
    event_bus: EventBus,
}

impl SwapRouter {
    /// Creates a new `SwapRouter`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry>, ledger: Arc<dyn Ledger>, event_bus: EventBus) -> Self {
        Self {
            registry,
            ledger,
            event_bus,
        }
    }

    /// Checks that every pool on the path exists and trades exactly the two
    /// tokens next to it.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidPath`] on the first hop that fails.
    pub async fn validate_path(&self, path: &SwapPath) -> Result<(), DexError> {
        for hop in path.hops() {
            let entry_lock = self
                .registry
                .get(hop.pool_id)
                .await
                .map_err(|_| DexError::InvalidPath("pool key is not registered"))?;
            let entry = entry_lock.read().await;
            if !entry.pool.connects(hop.token_in, hop.token_out) {
                return Err(DexError::InvalidPath(
                    "pool does not trade the adjacent tokens",
                ));
            }
        }
        Ok(())
    }

    /// Builds a [`SwapPath`] from raw elements and validates it against the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidPath`] for a malformed or unroutable path.
    pub async fn validate_elements(&self, elements: &[PathElement]) -> Result<SwapPath, DexError> {
        let path = SwapPath::new(elements)?;
        self.validate_path(&path).await?;
        Ok(path)
    }

    /// Simulates the route against copies of the current pools.
    ///
    /// A pool visited twice sees the effect of its own earlier hop.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroInput`] if `amount_in == 0`.
    /// - [`DexError::InvalidPath`] for a malformed or unroutable path.
    /// - [`DexError::InsufficientLiquidity`] if a hop yields nothing.
    pub async fn quote_route(
        &self,
        elements: &[PathElement],
        amount_in: u128,
    ) -> Result<RouteQuote, DexError> {
        if amount_in == 0 {
            return Err(DexError::ZeroInput);
        }
        let path = self.validate_elements(elements).await?;

        let mut pools: HashMap<PoolId, Pool> = HashMap::new();
        for pool_id in path.distinct_pools() {
            let entry_lock = self.registry.get(pool_id).await?;
            pools.insert(pool_id, entry_lock.read().await.pool);
        }

        let mut amount = amount_in;
        let mut hops = Vec::with_capacity(path.hops().len());
        for hop in path.hops() {
            let pool = pools
                .get_mut(&hop.pool_id)
                .ok_or(DexError::PoolNotFound(hop.pool_id))?;
            let outcome = pool.swap(hop.token_in, amount)?;
            hops.push(HopFill {
                pool_id: hop.pool_id,
                outcome,
                reserve0: pool.reserve0,
                reserve1: pool.reserve1,
            });
            amount = outcome.amount_out;
        }
        Ok(RouteQuote {
            amount_out: amount,
            hops,
        })
    }

    /// Executes the route atomically.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroInput`] if `amount_in == 0`.
    /// - [`DexError::ZeroRecipient`] if `recipient` is the null identity.
    /// - [`DexError::InvalidPath`] for a malformed or unroutable path.
    /// - [`DexError::SlippageExceeded`] if the final output is below
    ///   `min_amount_out`.
    /// - [`DexError::Reentrant`] if a pool on the path is mid-mutation.
    /// - Any hop or settlement error; all hops are undone.
    pub async fn swap_multi_hop(
        &self,
        sender: AccountId,
        elements: &[PathElement],
        amount_in: u128,
        min_amount_out: u128,
        recipient: AccountId,
    ) -> Result<SwapReceipt, DexError> {
        if amount_in == 0 {
            return Err(DexError::ZeroInput);
        }
        if recipient.is_zero() {
            return Err(DexError::ZeroRecipient);
        }
        ensure_caller(sender)?;
        let path = self.validate_elements(elements).await?;

        // Lock in key order; `distinct_pools` is sorted.
        let pool_ids = path.distinct_pools();
        let mut entries: HashMap<PoolId, OwnedRwLockWriteGuard<PoolEntry>> =
            HashMap::with_capacity(pool_ids.len());
        for pool_id in &pool_ids {
            let entry_lock = self.registry.get(*pool_id).await?;
            entries.insert(*pool_id, entry_lock.write_owned().await);
        }
        let guard = self.registry.enter(&pool_ids)?;
        let checkpoints: Vec<(PoolId, EntryCheckpoint)> = entries
            .iter()
            .map(|(id, entry)| (*id, entry.checkpoint(None)))
            .collect();

        let result = self.run_hops(
            &path,
            &mut entries,
            sender,
            amount_in,
            min_amount_out,
            recipient,
        );
        let fills = match result {
            Ok(fills) => fills,
            Err(err) => {
                for (pool_id, checkpoint) in checkpoints {
                    if let Some(entry) = entries.get_mut(&pool_id) {
                        entry.restore(checkpoint);
                    }
                }
                tracing::debug!(%err, hops = path.hops().len(), "route rolled back");
                return Err(err);
            }
        };
        drop(guard);
        drop(entries);

        let amount_out = fills.last().map_or(0, |fill| fill.outcome.amount_out);
        let receipt = SwapReceipt {
            swap_id: Uuid::new_v4(),
            amount_in,
            amount_out,
            hops: fills,
        };
        self.event_bus.publish_all(receipt.events(sender, recipient));
        tracing::info!(
            %sender,
            hops = receipt.hops.len(),
            amount_in,
            amount_out,
            swap_id = %receipt.swap_id,
            "route executed"
        );
        Ok(receipt)
    }

    /// Applies every hop, checks the final floor, then settles.
    fn run_hops(
        &self,
        path: &SwapPath,
        entries: &mut HashMap<PoolId, OwnedRwLockWriteGuard<PoolEntry>>,
        sender: AccountId,
        amount_in: u128,
        min_amount_out: u128,
        recipient: AccountId,
    ) -> Result<Vec<HopFill>, DexError> {
        let mut amount = amount_in;
        let mut fills = Vec::with_capacity(path.hops().len());
        for hop in path.hops() {
            let entry = entries
                .get_mut(&hop.pool_id)
                .ok_or(DexError::PoolNotFound(hop.pool_id))?;
            let fill = SwapEngine::apply_hop(entry, hop.token_in, amount)?;
            amount = fill.outcome.amount_out;
            fills.push(fill);
        }

        if amount < min_amount_out {
            return Err(DexError::SlippageExceeded {
                received: amount,
                minimum: min_amount_out,
            });
        }

        self.ledger.settle(&[
            Transfer::Pull {
                token: path.token_in(),
                from: sender,
                amount: amount_in,
            },
            Transfer::Push {
                token: path.token_out(),
                to: recipient,
                amount,
            },
        ])?;
        Ok(fills)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{PoolEvent, TokenId};
    use crate::service::liquidity::{CreatePoolParams, LiquidityManager};
    use crate::service::test_support::{
        ALICE, BOB, CUSTODY, ReentrantLedger, SwitchableLedger, funded_ledger, shared_parts, tok,
    };

    struct Fixture {
        router: SwapRouter,
        registry: Arc<PoolRegistry>,
        bus: EventBus,
        pool_12: PoolId,
        pool_23: PoolId,
    }

    async fn create(manager: &LiquidityManager, a: TokenId, b: TokenId) -> PoolId {
        let Ok(created) = manager
            .create_pool(CreatePoolParams {
                creator: ALICE,
                token_a: a,
                token_b: b,
                amount_a: 1_000_000,
                amount_b: 1_000_000,
                min_lp_out: 0,
                fee_bps: 30,
            })
            .await
        else {
            panic!("create failed");
        };
        created.pool_id
    }

    async fn fixture(ledger: Arc<dyn Ledger>) -> Fixture {
        let (registry, bus) = shared_parts();
        let manager =
            LiquidityManager::new(Arc::clone(&registry), Arc::clone(&ledger), bus.clone());
        let pool_12 = create(&manager, tok(1), tok(2)).await;
        let pool_23 = create(&manager, tok(2), tok(3)).await;
        Fixture {
            router: SwapRouter::new(Arc::clone(&registry), ledger, bus.clone()),
            registry,
            bus,
            pool_12,
            pool_23,
        }
    }

    fn t(b: u8) -> PathElement {
        PathElement::Token(tok(b))
    }

    fn p(id: PoolId) -> PathElement {
        PathElement::Pool(id)
    }

    #[tokio::test]
    async fn validate_path_checks_pool_membership() {
        let fx = fixture(Arc::new(funded_ledger())).await;
        assert!(fx
            .router
            .validate_elements(&[t(1), p(fx.pool_12), t(2), p(fx.pool_23), t(3)])
            .await
            .is_ok());
        assert!(matches!(
            fx.router
                .validate_elements(&[t(1), p(fx.pool_23), t(3)])
                .await,
            Err(DexError::InvalidPath(_))
        ));
        let unknown = PoolRegistry::derive_key(tok(1), tok(4), 30);
        assert!(matches!(
            fx.router.validate_elements(&[t(1), p(unknown), t(4)]).await,
            Err(DexError::InvalidPath(_))
        ));
        assert!(matches!(
            fx.router.validate_elements(&[t(1), p(fx.pool_12), t(1)]).await,
            Err(DexError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn shape_and_argument_errors() {
        let fx = fixture(Arc::new(funded_ledger())).await;
        let two = [t(1), p(fx.pool_12)];
        let four = [t(1), p(fx.pool_12), t(2), p(fx.pool_23)];
        let good = [t(1), p(fx.pool_12), t(2)];

        assert!(matches!(
            fx.router.swap_multi_hop(ALICE, &two, 10, 0, BOB).await,
            Err(DexError::InvalidPath(_))
        ));
        assert!(matches!(
            fx.router.swap_multi_hop(ALICE, &four, 10, 0, BOB).await,
            Err(DexError::InvalidPath(_))
        ));
        assert!(matches!(
            fx.router.swap_multi_hop(ALICE, &good, 0, 0, BOB).await,
            Err(DexError::ZeroInput)
        ));
        assert!(matches!(
            fx.router
                .swap_multi_hop(ALICE, &good, 10, 0, AccountId::ZERO)
                .await,
            Err(DexError::ZeroRecipient)
        ));
    }

    #[tokio::test]
    async fn two_hop_route_chains_outputs() {
        let ledger = Arc::new(funded_ledger());
        let fx = fixture(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let mut rx = fx.bus.subscribe();
        let path = [t(1), p(fx.pool_12), t(2), p(fx.pool_23), t(3)];

        let Ok(quote) = fx.router.quote_route(&path, 10_000).await else {
            panic!("quote failed");
        };
        let bob_before = ledger.balance_of(tok(3), BOB);
        let Ok(receipt) = fx.router.swap_multi_hop(ALICE, &path, 10_000, 0, BOB).await else {
            panic!("route failed");
        };

        // hop 1: 1e6 * 10_000 * 9970 / (1e10 + 10_000 * 9970) = 9_871
        // hop 2: 1e6 * 9_871 * 9970 / (1e10 + 9_871 * 9970)   = 9_745
        assert_eq!(receipt.hops[0].outcome.amount_out, 9_871);
        assert_eq!(receipt.amount_out, 9_745);
        assert_eq!(quote.amount_out, receipt.amount_out);
        assert_eq!(ledger.balance_of(tok(3), BOB), bob_before + 9_745);
        // the intermediate token never leaves custody
        assert_eq!(ledger.balance_of(tok(2), CUSTODY), 2_000_000);

        let mut swap_ids = Vec::new();
        for expected_hop in 0..2u32 {
            let Ok(PoolEvent::SwapExecuted {
                hop_index, swap_id, ..
            }) = rx.recv().await
            else {
                panic!("expected SwapExecuted");
            };
            assert_eq!(hop_index, expected_hop);
            swap_ids.push(swap_id);
        }
        assert_eq!(swap_ids[0], swap_ids[1]);
    }

    #[tokio::test]
    async fn final_slippage_unwinds_every_hop() {
        let ledger = Arc::new(funded_ledger());
        let fx = fixture(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let path = [t(1), p(fx.pool_12), t(2), p(fx.pool_23), t(3)];
        let (Ok(before_12), Ok(before_23)) = (
            fx.registry.view(fx.pool_12).await,
            fx.registry.view(fx.pool_23).await,
        ) else {
            panic!("view failed");
        };

        let result = fx.router.swap_multi_hop(ALICE, &path, 10_000, 9_746, BOB).await;
        assert!(matches!(
            result,
            Err(DexError::SlippageExceeded {
                received: 9_745,
                minimum: 9_746
            })
        ));
        assert_eq!(fx.registry.view(fx.pool_12).await.ok(), Some(before_12));
        assert_eq!(fx.registry.view(fx.pool_23).await.ok(), Some(before_23));
        assert_eq!(ledger.balance_of(tok(1), CUSTODY), 1_000_000);
    }

    #[tokio::test]
    async fn failed_settlement_unwinds_every_hop() {
        let ledger = Arc::new(SwitchableLedger::new(funded_ledger()));
        let fx = fixture(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let path = [t(1), p(fx.pool_12), t(2), p(fx.pool_23), t(3)];
        let Ok(before) = fx.registry.view(fx.pool_23).await else {
            panic!("view failed");
        };

        ledger.set_failing(true);
        assert!(fx.router.swap_multi_hop(ALICE, &path, 10_000, 0, BOB).await.is_err());
        assert_eq!(fx.registry.view(fx.pool_23).await.ok(), Some(before));
        assert!(!fx.registry.is_in_flight(fx.pool_12));
    }

    #[tokio::test]
    async fn route_revisiting_a_pool_sees_its_own_hop() {
        let ledger = Arc::new(funded_ledger());
        let fx = fixture(ledger).await;
        let path = [t(1), p(fx.pool_12), t(2), p(fx.pool_12), t(1)];

        let Ok(quote) = fx.router.quote_route(&path, 10_000).await else {
            panic!("quote failed");
        };
        let Ok(receipt) = fx.router.swap_multi_hop(ALICE, &path, 10_000, 0, ALICE).await else {
            panic!("route failed");
        };
        assert_eq!(quote.amount_out, receipt.amount_out);
        assert!(receipt.amount_out < 10_000);
        let Ok(entry_lock) = fx.registry.get(fx.pool_12).await else {
            panic!("get failed");
        };
        assert_eq!(entry_lock.read().await.swap_count, 2);
    }

    #[tokio::test]
    async fn settlement_cannot_reenter_route_pools() {
        let ledger = Arc::new(ReentrantLedger::default());
        let fx = fixture(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let _ = ledger.registry.set(Arc::clone(&fx.registry));
        let _ = ledger.target.set(fx.pool_23);
        let path = [t(1), p(fx.pool_12), t(2), p(fx.pool_23), t(3)];

        assert!(fx.router.swap_multi_hop(ALICE, &path, 10_000, 0, BOB).await.is_ok());
        let Ok(observed) = ledger.observed.lock() else {
            panic!("lock poisoned");
        };
        assert_eq!(observed.len(), 1);
        assert!(observed[0].is_err());
    }
}
