//! Single-hop swap execution.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::{ensure_caller, settle_entry};
use crate::domain::{
    AccountId, EventBus, PoolEntry, PoolEvent, PoolId, PoolRegistry, SwapOutcome, TokenId,
};
use crate::error::DexError;
use crate::ledger::{Ledger, Transfer};
use crate::math;

/// One executed hop with the pool's reserves right after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopFill {
    /// Pool traded against.
    pub pool_id: PoolId,
    /// Amounts and tokens of the hop.
    pub outcome: SwapOutcome,
    /// `token0` reserve after the hop.
    pub reserve0: u128,
    /// `token1` reserve after the hop.
    pub reserve1: u128,
}

/// Result of a single- or multi-hop swap.
#[derive(Debug, Clone)]
pub struct SwapReceipt {
    /// Identifier shared by the events of this swap.
    pub swap_id: Uuid,
    /// Input paid by the sender.
    pub amount_in: u128,
    /// Output delivered to the recipient.
    pub amount_out: u128,
    /// Hops in execution order.
    pub hops: Vec<HopFill>,
}

impl SwapReceipt {
    /// Builds the per-hop events of this swap.
    pub(crate) fn events(&self, sender: AccountId, recipient: AccountId) -> Vec<PoolEvent> {
        let timestamp = Utc::now();
        self.hops
            .iter()
            .zip(0u32..)
            .map(|(fill, hop_index)| PoolEvent::SwapExecuted {
                pool_id: fill.pool_id,
                swap_id: self.swap_id,
                hop_index,
                sender,
                recipient,
                token_in: fill.outcome.token_in,
                token_out: fill.outcome.token_out,
                amount_in: fill.outcome.amount_in.to_string(),
                amount_out: fill.outcome.amount_out.to_string(),
                fee: fill.outcome.fee.to_string(),
                reserve0: fill.reserve0.to_string(),
                reserve1: fill.reserve1.to_string(),
                timestamp,
            })
            .collect()
    }
}

/// Computes and applies constant-product swaps against one pool.
#[derive(Debug, Clone)]
pub struct SwapEngine {
    registry: Arc<PoolRegistry>,
    ledger: Arc<dyn Ledger>,
    event_bus: EventBus,
}

impl SwapEngine {
    /// Creates a new `SwapEngine`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry>, ledger: Arc<dyn Ledger>, event_bus: EventBus) -> Self {
        Self {
            registry,
            ledger,
            event_bus,
        }
    }

    /// Pure constant-product quote; see [`math::quote`].
    ///
    /// # Errors
    ///
    /// Same as [`math::quote`].
    pub fn quote(
        reserve_in: u128,
        reserve_out: u128,
        amount_in: u128,
        fee_bps: u32,
    ) -> Result<u128, DexError> {
        math::quote(reserve_in, reserve_out, amount_in, fee_bps)
    }

    /// Swaps one hop on `entry` and records it in the entry metadata.
    pub(crate) fn apply_hop(
        entry: &mut PoolEntry,
        token_in: TokenId,
        amount_in: u128,
    ) -> Result<HopFill, DexError> {
        let outcome = entry.pool.swap(token_in, amount_in)?;
        entry.record_swap(token_in, amount_in);
        Ok(HopFill {
            pool_id: entry.pool_id,
            outcome,
            reserve0: entry.pool.reserve0,
            reserve1: entry.pool.reserve1,
        })
    }

    /// Quotes a swap against the current reserves without executing it.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotFound`] if the pool does not exist.
    /// - [`DexError::ZeroInput`] / [`DexError::InvalidToken`] /
    ///   [`DexError::InsufficientLiquidity`] as for [`SwapEngine::swap`].
    pub async fn quote_swap(
        &self,
        pool_id: PoolId,
        token_in: TokenId,
        amount_in: u128,
    ) -> Result<SwapOutcome, DexError> {
        let entry_lock = self.registry.get(pool_id).await?;
        let entry = entry_lock.read().await;
        entry.pool.quote(token_in, amount_in)
    }

    /// Sells `amount_in` of `token_in` into the pool and sends the output
    /// to `recipient`.
    ///
    /// Reserves are updated and the constant product checked before any
    /// tokens move; the input pull and output push then settle as one
    /// batch.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroInput`] if `amount_in == 0`.
    /// - [`DexError::ZeroRecipient`] if `recipient` is the null identity.
    /// - [`DexError::PoolNotFound`] if the pool does not exist.
    /// - [`DexError::InvalidToken`] if `token_in` is not a pool token.
    /// - [`DexError::InsufficientLiquidity`] if the output rounds to zero.
    /// - [`DexError::SlippageExceeded`] if the output is below
    ///   `min_amount_out`.
    /// - [`DexError::Reentrant`] if the pool is mid-mutation.
    pub async fn swap(
        &self,
        sender: AccountId,
        pool_id: PoolId,
        token_in: TokenId,
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
        let entry_lock = self.registry.get(pool_id).await?;

        let mut entry = entry_lock.write().await;
        let guard = self.registry.enter(&[pool_id])?;
        let fill = settle_entry(&mut entry, None, self.ledger.as_ref(), |entry| {
            let fill = Self::apply_hop(entry, token_in, amount_in)?;
            let amount_out = fill.outcome.amount_out;
            if amount_out < min_amount_out {
                return Err(DexError::SlippageExceeded {
                    received: amount_out,
                    minimum: min_amount_out,
                });
            }
            let transfers = vec![
                Transfer::Pull {
                    token: token_in,
                    from: sender,
                    amount: amount_in,
                },
                Transfer::Push {
                    token: fill.outcome.token_out,
                    to: recipient,
                    amount: amount_out,
                },
            ];
            Ok((fill, transfers))
        })?;
        drop(guard);
        drop(entry);

        let receipt = SwapReceipt {
            swap_id: Uuid::new_v4(),
            amount_in,
            amount_out: fill.outcome.amount_out,
            hops: vec![fill],
        };
        self.event_bus.publish_all(receipt.events(sender, recipient));
        tracing::info!(
            %pool_id,
            %sender,
            amount_in,
            amount_out = receipt.amount_out,
            swap_id = %receipt.swap_id,
            "swap executed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::service::liquidity::{CreatePoolParams, LiquidityManager};
    use crate::service::test_support::{
        ALICE, BOB, CUSTODY, FrozenRecipientLedger, SwitchableLedger, funded_ledger,
        shared_parts, tok,
    };

    async fn setup(
        ledger: Arc<dyn Ledger>,
    ) -> (SwapEngine, Arc<PoolRegistry>, EventBus, PoolId) {
        let (registry, bus) = shared_parts();
        let manager =
            LiquidityManager::new(Arc::clone(&registry), Arc::clone(&ledger), bus.clone());
        let Ok(created) = manager
            .create_pool(CreatePoolParams {
                creator: ALICE,
                token_a: tok(1),
                token_b: tok(2),
                amount_a: 1_000_000,
                amount_b: 2_000_000,
                min_lp_out: 0,
                fee_bps: 30,
            })
            .await
        else {
            panic!("create failed");
        };
        let engine = SwapEngine::new(Arc::clone(&registry), ledger, bus.clone());
        (engine, registry, bus, created.pool_id)
    }

    #[test]
    fn pure_quote_reference_example() {
        assert_eq!(SwapEngine::quote(1_000, 2_000, 100, 30).ok(), Some(181));
    }

    #[tokio::test]
    async fn swap_moves_tokens_and_reserves() {
        let ledger = Arc::new(funded_ledger());
        let (engine, registry, bus, pool_id) = setup(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let mut rx = bus.subscribe();
        let bob_before = ledger.balance_of(tok(2), BOB);

        let Ok(receipt) = engine.swap(ALICE, pool_id, tok(1), 100_000, 0, BOB).await else {
            panic!("swap failed");
        };
        // 2_000_000 * 100_000 * 9970 / (1_000_000 * 10000 + 100_000 * 9970)
        assert_eq!(receipt.amount_out, 181_322);
        assert_eq!(ledger.balance_of(tok(2), BOB), bob_before + 181_322);
        assert_eq!(ledger.balance_of(tok(1), CUSTODY), 1_100_000);
        assert_eq!(ledger.balance_of(tok(2), CUSTODY), 2_000_000 - 181_322);

        let Ok(view) = registry.view(pool_id).await else {
            panic!("view failed");
        };
        assert_eq!(view.reserve0, 1_100_000);
        assert_eq!(view.reserve1, 2_000_000 - 181_322);

        let Ok(PoolEvent::SwapExecuted {
            amount_out,
            hop_index,
            ..
        }) = rx.recv().await
        else {
            panic!("expected SwapExecuted");
        };
        assert_eq!(amount_out, "181322");
        assert_eq!(hop_index, 0);
    }

    #[tokio::test]
    async fn quote_swap_matches_execution() {
        let ledger = Arc::new(funded_ledger());
        let (engine, _, _, pool_id) = setup(ledger).await;
        let Ok(quoted) = engine.quote_swap(pool_id, tok(2), 50_000).await else {
            panic!("quote failed");
        };
        let Ok(receipt) = engine.swap(BOB, pool_id, tok(2), 50_000, 0, BOB).await else {
            panic!("swap failed");
        };
        assert_eq!(quoted.amount_out, receipt.amount_out);
        assert_eq!(quoted.token_out, tok(1));
    }

    #[tokio::test]
    async fn swap_validation_errors() {
        let ledger = Arc::new(funded_ledger());
        let (engine, _, _, pool_id) = setup(ledger).await;
        assert!(matches!(
            engine.swap(ALICE, pool_id, tok(1), 0, 0, BOB).await,
            Err(DexError::ZeroInput)
        ));
        assert!(matches!(
            engine.swap(ALICE, pool_id, tok(1), 10, 0, AccountId::ZERO).await,
            Err(DexError::ZeroRecipient)
        ));
        assert!(matches!(
            engine.swap(ALICE, pool_id, tok(3), 10, 0, BOB).await,
            Err(DexError::InvalidToken(_))
        ));
        let missing = PoolRegistry::derive_key(tok(3), tok(4), 30);
        assert!(matches!(
            engine.swap(ALICE, missing, tok(3), 10, 0, BOB).await,
            Err(DexError::PoolNotFound(_))
        ));
        assert!(matches!(
            engine.swap(AccountId::ZERO, pool_id, tok(1), 10, 0, BOB).await,
            Err(DexError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn slippage_leaves_state_untouched() {
        let ledger = Arc::new(funded_ledger());
        let (engine, registry, _, pool_id) = setup(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let Ok(before) = registry.view(pool_id).await else {
            panic!("view failed");
        };
        let result = engine
            .swap(ALICE, pool_id, tok(1), 100_000, 181_323, BOB)
            .await;
        assert!(matches!(
            result,
            Err(DexError::SlippageExceeded {
                received: 181_322,
                minimum: 181_323
            })
        ));
        assert_eq!(registry.view(pool_id).await.ok(), Some(before));
        assert_eq!(ledger.balance_of(tok(1), CUSTODY), 1_000_000);
    }

    #[tokio::test]
    async fn failed_settlement_restores_reserves() {
        let ledger = Arc::new(SwitchableLedger::new(funded_ledger()));
        let (engine, registry, bus, pool_id) = setup(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let mut rx = bus.subscribe();
        let Ok(before) = registry.view(pool_id).await else {
            panic!("view failed");
        };

        ledger.set_failing(true);
        assert!(engine.swap(ALICE, pool_id, tok(1), 1_000, 0, BOB).await.is_err());
        assert_eq!(registry.view(pool_id).await.ok(), Some(before));
        assert!(rx.try_recv().is_err());

        let Ok(entry_lock) = registry.get(pool_id).await else {
            panic!("get failed");
        };
        assert_eq!(entry_lock.read().await.swap_count, 0);
    }

    #[tokio::test]
    async fn rejected_payout_returns_the_input() {
        let ledger = Arc::new(FrozenRecipientLedger::new(funded_ledger()));
        let (engine, registry, _, pool_id) = setup(Arc::clone(&ledger) as Arc<dyn Ledger>).await;
        let Ok(before) = registry.view(pool_id).await else {
            panic!("view failed");
        };
        let alice_before = ledger.balance_of(tok(1), ALICE);

        ledger.freeze(BOB);
        let result = engine.swap(ALICE, pool_id, tok(1), 10_000, 0, BOB).await;
        assert!(matches!(result, Err(DexError::Unauthorized(_))));

        assert_eq!(ledger.balance_of(tok(1), ALICE), alice_before);
        assert_eq!(ledger.balance_of(tok(1), CUSTODY), 1_000_000);
        assert_eq!(ledger.balance_of(tok(2), CUSTODY), 2_000_000);
        assert_eq!(registry.view(pool_id).await.ok(), Some(before));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_swaps_are_serialized_not_rejected() {
        let ledger = Arc::new(funded_ledger());
        let (engine, registry, _, pool_id) = setup(Arc::clone(&ledger) as Arc<dyn Ledger>).await;

        let mut handles = Vec::with_capacity(200);
        for i in 0..200u32 {
            let engine = engine.clone();
            let (trader, token_in) = if i % 2 == 0 {
                (ALICE, tok(1))
            } else {
                (BOB, tok(2))
            };
            handles.push(tokio::spawn(async move {
                engine.swap(trader, pool_id, token_in, 1_000, 0, trader).await
            }));
        }

        let mut executed = 0u64;
        for handle in handles {
            let Ok(result) = handle.await else {
                panic!("task panicked");
            };
            if let Err(err) = result {
                panic!("swap failed: {err}");
            }
            executed += 1;
        }
        assert_eq!(executed, 200);

        let Ok(entry_lock) = registry.get(pool_id).await else {
            panic!("get failed");
        };
        let entry = entry_lock.read().await;
        assert_eq!(entry.swap_count, 200);
        assert_eq!(ledger.balance_of(tok(1), CUSTODY), entry.pool.reserve0);
        assert_eq!(ledger.balance_of(tok(2), CUSTODY), entry.pool.reserve1);
        assert!(!registry.is_in_flight(pool_id));
    }

    #[tokio::test]
    async fn repeated_swaps_never_decrease_k() {
        let ledger = Arc::new(funded_ledger());
        let (engine, registry, _, pool_id) = setup(ledger).await;
        let mut k = 1_000_000u128 * 2_000_000;
        for (i, amount) in [10_000u128, 77_777, 3, 250_000, 1_234].into_iter().enumerate() {
            let token_in = if i % 2 == 0 { tok(1) } else { tok(2) };
            let _ = engine.swap(ALICE, pool_id, token_in, amount, 0, ALICE).await;
            let Ok(view) = registry.view(pool_id).await else {
                panic!("view failed");
            };
            let k_after = view.reserve0 * view.reserve1;
            assert!(k_after >= k);
            k = k_after;
        }
    }
}
