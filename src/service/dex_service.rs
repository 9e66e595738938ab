//! Exchange facade: the public entrypoints of the engine.

use std::sync::Arc;

use super::liquidity::{
    CreatePoolParams, CreatedPool, LiquidityAdded, LiquidityManager, LiquidityRemoved,
};
use super::router::{RouteQuote, SwapRouter};
use super::swap_engine::{SwapEngine, SwapReceipt};
use crate::domain::{
    AccountId, EventBus, PathElement, PoolId, PoolRegistry, PoolSummary, PoolView, SwapOutcome,
    TokenId,
};
use crate::error::DexError;
use crate::ledger::Ledger;
use crate::math;

/// Orchestration layer for every exchange operation.
///
/// Owns the shared [`PoolRegistry`], the [`Ledger`] handle and the
/// [`EventBus`], and hands them to the [`LiquidityManager`],
/// [`SwapEngine`] and [`SwapRouter`] it delegates to.
#[derive(Debug, Clone)]
pub struct DexService {
    registry: Arc<PoolRegistry>,
    ledger: Arc<dyn Ledger>,
    event_bus: EventBus,
    default_fee_bps: u32,
    liquidity: LiquidityManager,
    engine: SwapEngine,
    router: SwapRouter,
}

impl DexService {
    /// Creates a new `DexService`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidFee`] if `default_fee_bps >= 10_000`.
    pub fn new(
        registry: Arc<PoolRegistry>,
        ledger: Arc<dyn Ledger>,
        event_bus: EventBus,
        default_fee_bps: u32,
    ) -> Result<Self, DexError> {
        let default_fee_bps = math::validate_fee(default_fee_bps)?;
        Ok(Self {
            liquidity: LiquidityManager::new(
                Arc::clone(&registry),
                Arc::clone(&ledger),
                event_bus.clone(),
            ),
            engine: SwapEngine::new(Arc::clone(&registry), Arc::clone(&ledger), event_bus.clone()),
            router: SwapRouter::new(Arc::clone(&registry), Arc::clone(&ledger), event_bus.clone()),
            registry,
            ledger,
            event_bus,
            default_fee_bps,
        })
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns a reference to the inner [`PoolRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<PoolRegistry> {
        &self.registry
    }

    /// Fee applied when a pool is created without an explicit one.
    #[must_use]
    pub const fn default_fee(&self) -> u32 {
        self.default_fee_bps
    }

    /// Deterministic, order-independent pool key.
    #[must_use]
    pub fn derive_key(&self, token_a: TokenId, token_b: TokenId, fee_bps: Option<u32>) -> PoolId {
        PoolRegistry::derive_key(token_a, token_b, fee_bps.unwrap_or(self.default_fee_bps))
    }

    /// Creates and funds a pool; `fee_bps` defaults to [`Self::default_fee`].
    ///
    /// # Errors
    ///
    /// See [`LiquidityManager::create_pool`].
    #[allow(clippy::too_many_arguments)]
    pub async fn create_pool(
        &self,
        creator: AccountId,
        token_a: TokenId,
        token_b: TokenId,
        amount_a: u128,
        amount_b: u128,
        min_lp_out: u128,
        fee_bps: Option<u32>,
    ) -> Result<CreatedPool, DexError> {
        self.liquidity
            .create_pool(CreatePoolParams {
                creator,
                token_a,
                token_b,
                amount_a,
                amount_b,
                min_lp_out,
                fee_bps: fee_bps.unwrap_or(self.default_fee_bps),
            })
            .await
    }

    /// Returns the current pool fields.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if the pool does not exist.
    pub async fn get_pool(&self, pool_id: PoolId) -> Result<PoolView, DexError> {
        self.registry.view(pool_id).await
    }

    /// Returns summaries of all pools, optionally only those trading `token`.
    pub async fn list_pools(&self, token: Option<TokenId>) -> Vec<PoolSummary> {
        self.registry.list(token).await
    }

    /// Returns the summaries of every pool, for periodic snapshots.
    pub async fn snapshot_pools(&self) -> Vec<PoolSummary> {
        self.registry.list(None).await
    }

    /// Deposits liquidity at the current ratio.
    ///
    /// # Errors
    ///
    /// See [`LiquidityManager::add_liquidity`].
    pub async fn add_liquidity(
        &self,
        provider: AccountId,
        pool_id: PoolId,
        amount0_desired: u128,
        amount1_desired: u128,
        min_lp_out: u128,
    ) -> Result<LiquidityAdded, DexError> {
        self.liquidity
            .add_liquidity(provider, pool_id, amount0_desired, amount1_desired, min_lp_out)
            .await
    }

    /// Burns LP units for the proportional reserves.
    ///
    /// # Errors
    ///
    /// See [`LiquidityManager::remove_liquidity`].
    pub async fn remove_liquidity(
        &self,
        provider: AccountId,
        pool_id: PoolId,
        lp_amount: u128,
        amount0_min: u128,
        amount1_min: u128,
    ) -> Result<LiquidityRemoved, DexError> {
        self.liquidity
            .remove_liquidity(provider, pool_id, lp_amount, amount0_min, amount1_min)
            .await
    }

    /// LP balance of `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::PoolNotFound`] if the pool does not exist.
    pub async fn get_lp_balance(
        &self,
        pool_id: PoolId,
        owner: AccountId,
    ) -> Result<u128, DexError> {
        self.liquidity.lp_balance(pool_id, owner).await
    }

    /// Single-hop swap.
    ///
    /// # Errors
    ///
    /// See [`SwapEngine::swap`].
    pub async fn swap(
        &self,
        sender: AccountId,
        pool_id: PoolId,
        token_in: TokenId,
        amount_in: u128,
        min_amount_out: u128,
        recipient: AccountId,
    ) -> Result<SwapReceipt, DexError> {
        self.engine
            .swap(sender, pool_id, token_in, amount_in, min_amount_out, recipient)
            .await
    }

    /// Read-only single-hop quote.
    ///
    /// # Errors
    ///
    /// See [`SwapEngine::quote_swap`].
    pub async fn quote_swap(
        &self,
        pool_id: PoolId,
        token_in: TokenId,
        amount_in: u128,
    ) -> Result<SwapOutcome, DexError> {
        self.engine.quote_swap(pool_id, token_in, amount_in).await
    }

    /// Multi-hop swap along `path`.
    ///
    /// # Errors
    ///
    /// See [`SwapRouter::swap_multi_hop`].
    pub async fn swap_multi_hop(
        &self,
        sender: AccountId,
        path: &[PathElement],
        amount_in: u128,
        min_amount_out: u128,
        recipient: AccountId,
    ) -> Result<SwapReceipt, DexError> {
        self.router
            .swap_multi_hop(sender, path, amount_in, min_amount_out, recipient)
            .await
    }

    /// Read-only multi-hop quote.
    ///
    /// # Errors
    ///
    /// See [`SwapRouter::quote_route`].
    pub async fn quote_route(
        &self,
        path: &[PathElement],
        amount_in: u128,
    ) -> Result<RouteQuote, DexError> {
        self.router.quote_route(path, amount_in).await
    }

    /// Validates a path against the registry.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidPath`] for a malformed or unroutable path.
    pub async fn validate_path(&self, path: &[PathElement]) -> Result<(), DexError> {
        self.router.validate_elements(path).await.map(|_| ())
    }

    /// Ledger balance of `owner` in `token`.
    #[must_use]
    pub fn balance_of(&self, token: TokenId, owner: AccountId) -> u128 {
        self.ledger.balance_of(token, owner)
    }
}
