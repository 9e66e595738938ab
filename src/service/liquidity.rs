//! Pool creation and proportional liquidity provisioning.

use std::sync::Arc;

use chrono::Utc;

use super::{ensure_caller, settle_entry};
use crate::domain::pool_event::LiquidityChangeType;
use crate::domain::{
    AccountId, EventBus, Pool, PoolEntry, PoolEvent, PoolId, PoolRegistry, PoolView, TokenId,
};
use crate::error::DexError;
use crate::ledger::{Ledger, Transfer};

/// Arguments of [`LiquidityManager::create_pool`].
#[derive(Debug, Clone, Copy)]
pub struct CreatePoolParams {
    /// Account funding the pool and receiving the LP units.
    pub creator: AccountId,
    /// One token of the pair, in any order.
    pub token_a: TokenId,
    /// The other token of the pair.
    pub token_b: TokenId,
    /// Deposit of `token_a`.
    pub amount_a: u128,
    /// Deposit of `token_b`.
    pub amount_b: u128,
    /// Lowest acceptable LP issuance.
    pub min_lp_out: u128,
    /// Fee tier of the pool.
    pub fee_bps: u32,
}

/// Result of a pool creation.
#[derive(Debug, Clone, Copy)]
pub struct CreatedPool {
    /// Registry key of the new pool.
    pub pool_id: PoolId,
    /// LP units credited to the creator.
    pub lp_minted: u128,
    /// Pool state after creation.
    pub pool: PoolView,
}

/// Result of a deposit.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityAdded {
    /// `token0` taken from the provider.
    pub amount0: u128,
    /// `token1` taken from the provider.
    pub amount1: u128,
    /// LP units minted.
    pub lp_minted: u128,
    /// Provider's LP balance afterwards.
    pub lp_balance: u128,
}

/// Result of a withdrawal.
#[derive(Debug, Clone, Copy)]
pub struct LiquidityRemoved {
    /// `token0` paid to the provider.
    pub amount0: u128,
    /// `token1` paid to the provider.
    pub amount1: u128,
    /// Provider's LP balance afterwards.
    pub lp_balance: u128,
}

/// Creates pools and mediates LP-share accounting.
#[derive(Debug, Clone)]
pub struct LiquidityManager {
    registry: Arc<PoolRegistry>,
    ledger: Arc<dyn Ledger>,
    event_bus: EventBus,
}

impl LiquidityManager {
    /// Creates a new `LiquidityManager`.
    #[must_use]
    pub fn new(registry: Arc<PoolRegistry>, ledger: Arc<dyn Ledger>, event_bus: EventBus) -> Self {
        Self {
            registry,
            ledger,
            event_bus,
        }
    }

    /// Creates and funds a pool.
    ///
    /// # Errors
    ///
    /// - [`DexError::Unauthorized`] if the creator is the null identity.
    /// - [`DexError::InvalidToken`] / [`DexError::InvalidFee`] for a bad
    ///   pair or fee.
    /// - [`DexError::PoolExists`] if the pair already has a pool at this fee.
    /// - [`DexError::ZeroAmount`] / [`DexError::InsufficientInitialLiquidity`]
    ///   for a deposit that cannot seed the pool.
    /// - [`DexError::Ledger`] if the creator cannot pay.
    pub async fn create_pool(&self, params: CreatePoolParams) -> Result<CreatedPool, DexError> {
        ensure_caller(params.creator)?;
        if params.token_a == params.token_b {
            return Err(DexError::InvalidToken(format!(
                "pair repeats token {}",
                params.token_a
            )));
        }
        let fee_bps = crate::math::validate_fee(params.fee_bps)?;
        let pool_id = PoolRegistry::derive_key(params.token_a, params.token_b, fee_bps);
        if self.registry.contains(pool_id).await {
            return Err(DexError::PoolExists(pool_id));
        }

        let opening = Pool::open(
            params.token_a,
            params.token_b,
            params.amount_a,
            params.amount_b,
            fee_bps,
            params.min_lp_out,
        )?;

        let entry = PoolEntry::new(pool_id, opening.pool, params.creator, opening.lp_minted);
        let view = entry.view();
        let transfers = [
            Transfer::Pull {
                token: opening.pool.token0,
                from: params.creator,
                amount: opening.amount0,
            },
            Transfer::Pull {
                token: opening.pool.token1,
                from: params.creator,
                amount: opening.amount1,
            },
        ];
        self.registry
            .insert_settled(entry, |_| {
                let _guard = self.registry.enter(&[pool_id])?;
                self.ledger.settle(&transfers)?;
                Ok(())
            })
            .await?;

        let _ = self.event_bus.publish(PoolEvent::PoolCreated {
            pool_id,
            token0: view.token0,
            token1: view.token1,
            fee_bps,
            creator: params.creator,
            reserve0: view.reserve0.to_string(),
            reserve1: view.reserve1.to_string(),
            lp_minted: opening.lp_minted.to_string(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            %pool_id,
            token0 = %view.token0,
            token1 = %view.token1,
            fee_bps,
            lp_minted = opening.lp_minted,
            "pool created"
        );
        Ok(CreatedPool {
            pool_id,
            lp_minted: opening.lp_minted,
            pool: view,
        })
    }

    /// Deposits liquidity at the current reserve ratio.
    ///
    /// Of the desired amounts only the ratio-matched pair is pulled.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotFound`] if the pool does not exist.
    /// - [`DexError::ZeroAmount`] if a desired amount is zero.
    /// - [`DexError::ZeroLiquidityMinted`] if the deposit is too small.
    /// - [`DexError::SlippageExceeded`] if fewer than `min_lp_out` units
    ///   would be minted.
    /// - [`DexError::Reentrant`] if the pool is mid-mutation.
    /// - [`DexError::Ledger`] if the provider cannot pay.
    pub async fn add_liquidity(
        &self,
        provider: AccountId,
        pool_id: PoolId,
        amount0_desired: u128,
        amount1_desired: u128,
        min_lp_out: u128,
    ) -> Result<LiquidityAdded, DexError> {
        ensure_caller(provider)?;
        let entry_lock = self.registry.get(pool_id).await?;
        if amount0_desired == 0 || amount1_desired == 0 {
            return Err(DexError::ZeroAmount);
        }

        let mut entry = entry_lock.write().await;
        let guard = self.registry.enter(&[pool_id])?;
        let added = settle_entry(&mut entry, Some(provider), self.ledger.as_ref(), |entry| {
            let deposit = entry.pool.deposit(amount0_desired, amount1_desired)?;
            if deposit.lp_minted < min_lp_out {
                return Err(DexError::SlippageExceeded {
                    received: deposit.lp_minted,
                    minimum: min_lp_out,
                });
            }
            let lp_balance = entry.credit(provider, deposit.lp_minted)?;
            entry.touch();
            let transfers = vec![
                Transfer::Pull {
                    token: entry.pool.token0,
                    from: provider,
                    amount: deposit.amount0,
                },
                Transfer::Pull {
                    token: entry.pool.token1,
                    from: provider,
                    amount: deposit.amount1,
                },
            ];
            Ok((
                LiquidityAdded {
                    amount0: deposit.amount0,
                    amount1: deposit.amount1,
                    lp_minted: deposit.lp_minted,
                    lp_balance,
                },
                transfers,
            ))
        })?;
        let total_lp_supply = entry.pool.total_lp_supply;
        drop(guard);
        drop(entry);

        let _ = self.event_bus.publish(PoolEvent::LiquidityChanged {
            pool_id,
            change_type: LiquidityChangeType::Add,
            provider,
            amount0: added.amount0.to_string(),
            amount1: added.amount1.to_string(),
            lp_amount: added.lp_minted.to_string(),
            new_total_lp_supply: total_lp_supply.to_string(),
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %provider, lp_minted = added.lp_minted, "liquidity added");
        Ok(added)
    }

    /// Burns LP units and pays out the proportional reserves.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotFound`] if the pool does not exist.
    /// - [`DexError::ZeroAmount`] if `lp_amount == 0`.
    /// - [`DexError::InsufficientLpBalance`] if the provider holds less.
    /// - [`DexError::SlippageExceeded`] if a payout is below its minimum.
    /// - [`DexError::Reentrant`] if the pool is mid-mutation.
    pub async fn remove_liquidity(
        &self,
        provider: AccountId,
        pool_id: PoolId,
        lp_amount: u128,
        amount0_min: u128,
        amount1_min: u128,
    ) -> Result<LiquidityRemoved, DexError> {
        ensure_caller(provider)?;
        let entry_lock = self.registry.get(pool_id).await?;
        if lp_amount == 0 {
            return Err(DexError::ZeroAmount);
        }

        let mut entry = entry_lock.write().await;
        let guard = self.registry.enter(&[pool_id])?;
        let removed = settle_entry(&mut entry, Some(provider), self.ledger.as_ref(), |entry| {
            let lp_balance = entry.debit(provider, lp_amount)?;
            let (amount0, amount1) = entry.pool.withdraw(lp_amount)?;
            if amount0 < amount0_min {
                return Err(DexError::SlippageExceeded {
                    received: amount0,
                    minimum: amount0_min,
                });
            }
            if amount1 < amount1_min {
                return Err(DexError::SlippageExceeded {
                    received: amount1,
                    minimum: amount1_min,
                });
            }
            entry.touch();
            let transfers = vec![
                Transfer::Push {
                    token: entry.pool.token0,
                    to: provider,
                    amount: amount0,
                },
                Transfer::Push {
                    token: entry.pool.token1,
                    to: provider,
                    amount: amount1,
                },
            ];
            Ok((
                LiquidityRemoved {
                    amount0,
                    amount1,
                    lp_balance,
                },
                transfers,
            ))
        })?;
        let total_lp_supply = entry.pool.total_lp_supply;
        drop(guard);
        drop(entry);

        let _ = self.event_bus.publish(PoolEvent::LiquidityChanged {
            pool_id,
            change_type: LiquidityChangeType::Remove,
            provider,
            amount0: removed.amount0.to_string(),
            amount1: removed.amount1.to_string(),
            lp_amount: lp_amount.to_string(),
            new_total_lp_supply: total_lp_supply.to_string(),
            timestamp: Utc::now(),
        });
        tracing::info!(%pool_id, %provider, lp_amount, "liquidity removed");
        Ok(removed)
    }

    /// LP balance of `owner` in the pool.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if the pool does not exist.
    pub async fn lp_balance(&self, pool_id: PoolId, owner: AccountId) -> Result<u128, DexError> {
        let entry_lock = self.registry.get(pool_id).await?;
        let entry = entry_lock.read().await;
        Ok(entry.lp_balance(owner))
    }
}
