//! Constant-product pool state and its transitions.
//!
//! [`Pool`] is a plain `Copy` value. Every transition validates and
//! computes first and only writes `self` once nothing else can fail, so a
//! rejected call never leaves a half-updated pool behind.

use super::{PoolId, TokenId};
use crate::error::DexError;
use crate::math::{self, MINIMUM_LIQUIDITY};

/// Reserves, fee and LP supply of one pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    /// Lower token by identifier ordering.
    pub token0: TokenId,
    /// Higher token by identifier ordering.
    pub token1: TokenId,
    /// Amount of `token0` held by the pool.
    pub reserve0: u128,
    /// Amount of `token1` held by the pool.
    pub reserve1: u128,
    /// Swap fee in basis points, fixed at creation.
    pub fee_bps: u32,
    /// Outstanding LP units, including the locked minimum.
    pub total_lp_supply: u128,
}

/// Result of a successful [`Pool::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening {
    /// The funded pool.
    pub pool: Pool,
    /// LP units credited to the creator.
    pub lp_minted: u128,
    /// Amount of `token0` the creator deposits.
    pub amount0: u128,
    /// Amount of `token1` the creator deposits.
    pub amount1: u128,
}

/// Result of a successful [`Pool::deposit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    /// Amount of `token0` taken from the provider.
    pub amount0: u128,
    /// Amount of `token1` taken from the provider.
    pub amount1: u128,
    /// LP units minted to the provider.
    pub lp_minted: u128,
}

/// Result of a successful [`Pool::swap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOutcome {
    /// Token sold to the pool.
    pub token_in: TokenId,
    /// Token bought from the pool.
    pub token_out: TokenId,
    /// Full input amount, fee included.
    pub amount_in: u128,
    /// Output amount.
    pub amount_out: u128,
    /// Nominal fee retained by the pool.
    pub fee: u128,
}

impl Pool {
    /// Builds a funded pool from the creator's deposit.
    ///
    /// Tokens and amounts are reordered so that `token0 < token1`. The
    /// creator receives `floor(sqrt(a * b)) - MINIMUM_LIQUIDITY` LP units;
    /// the supply also counts the withheld minimum.
    ///
    /// # Errors
    ///
    /// - [`DexError::InvalidToken`] if both tokens are the same.
    /// - [`DexError::ZeroAmount`] if either amount is zero.
    /// - [`DexError::InvalidFee`] if `fee_bps >= 10_000`.
    /// - [`DexError::InsufficientInitialLiquidity`] if the issuance is zero
    ///   or below `min_lp_out`.
    pub fn open(
        token_a: TokenId,
        token_b: TokenId,
        amount_a: u128,
        amount_b: u128,
        fee_bps: u32,
        min_lp_out: u128,
    ) -> Result<Opening, DexError> {
        if token_a == token_b {
            return Err(DexError::InvalidToken(format!(
                "pair repeats token {token_a}"
            )));
        }
        if amount_a == 0 || amount_b == 0 {
            return Err(DexError::ZeroAmount);
        }
        let fee_bps = math::validate_fee(fee_bps)?;

        let lp_minted = math::initial_liquidity(amount_a, amount_b)?;
        if lp_minted == 0 || lp_minted < min_lp_out {
            return Err(DexError::InsufficientInitialLiquidity {
                minted: lp_minted,
                minimum: min_lp_out,
            });
        }

        let (token0, token1, amount0, amount1) = if token_a < token_b {
            (token_a, token_b, amount_a, amount_b)
        } else {
            (token_b, token_a, amount_b, amount_a)
        };
        let pool = Self {
            token0,
            token1,
            reserve0: amount0,
            reserve1: amount1,
            fee_bps,
            total_lp_supply: lp_minted + MINIMUM_LIQUIDITY,
        };
        Ok(Opening {
            pool,
            lp_minted,
            amount0,
            amount1,
        })
    }

    /// Registry key of this pool.
    #[must_use]
    pub fn key(&self) -> PoolId {
        PoolId::derive(self.token0, self.token1, self.fee_bps)
    }

    /// Returns `true` if `token` is one of the pool's two tokens.
    #[must_use]
    pub fn contains(&self, token: TokenId) -> bool {
        token == self.token0 || token == self.token1
    }

    /// Returns `true` if `{a, b}` is exactly the pool's token pair.
    #[must_use]
    pub fn connects(&self, a: TokenId, b: TokenId) -> bool {
        (a == self.token0 && b == self.token1) || (a == self.token1 && b == self.token0)
    }

    /// Returns `(token_out, reserve_in, reserve_out)` for selling `token_in`.
    fn direction(&self, token_in: TokenId) -> Result<(TokenId, u128, u128), DexError> {
        if token_in == self.token0 {
            Ok((self.token1, self.reserve0, self.reserve1))
        } else if token_in == self.token1 {
            Ok((self.token0, self.reserve1, self.reserve0))
        } else {
            Err(DexError::InvalidToken(format!(
                "{token_in} is not in pool {}",
                self.key()
            )))
        }
    }

    /// Prices an exact-in swap without changing the pool.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroInput`] if `amount_in == 0`.
    /// - [`DexError::InvalidToken`] if `token_in` is not a pool token.
    /// - [`DexError::InsufficientLiquidity`] if the output rounds to zero.
    pub fn quote(&self, token_in: TokenId, amount_in: u128) -> Result<SwapOutcome, DexError> {
        if amount_in == 0 {
            return Err(DexError::ZeroInput);
        }
        let (token_out, reserve_in, reserve_out) = self.direction(token_in)?;
        let amount_out = math::quote(reserve_in, reserve_out, amount_in, self.fee_bps)?;
        Ok(SwapOutcome {
            token_in,
            token_out,
            amount_in,
            amount_out,
            fee: math::fee_amount(amount_in, self.fee_bps)?,
        })
    }

    /// Executes an exact-in swap against the reserves.
    ///
    /// The input reserve grows by the full `amount_in` (fee included) and
    /// the output reserve shrinks by the quoted output. The constant
    /// product is checked before anything is written.
    ///
    /// # Errors
    ///
    /// Everything [`Pool::quote`] returns, plus [`DexError::Overflow`] if
    /// the input reserve would exceed `u128::MAX`.
    pub fn swap(&mut self, token_in: TokenId, amount_in: u128) -> Result<SwapOutcome, DexError> {
        let outcome = self.quote(token_in, amount_in)?;
        let (_, reserve_in, reserve_out) = self.direction(token_in)?;

        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(DexError::Overflow("input reserve"))?;
        let new_out = reserve_out
            .checked_sub(outcome.amount_out)
            .ok_or(DexError::InsufficientLiquidity)?;
        if new_out == 0 {
            return Err(DexError::InsufficientLiquidity);
        }
        if !math::k_non_decreasing(reserve_in, reserve_out, new_in, new_out) {
            return Err(DexError::Internal(
                "swap would decrease the constant product".to_string(),
            ));
        }

        if token_in == self.token0 {
            self.reserve0 = new_in;
            self.reserve1 = new_out;
        } else {
            self.reserve1 = new_in;
            self.reserve0 = new_out;
        }
        Ok(outcome)
    }

    /// Adds liquidity at the current reserve ratio.
    ///
    /// Only the ratio-matched part of the desired amounts is taken; the
    /// excess of either token stays with the provider.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroAmount`] if a desired amount is zero.
    /// - [`DexError::ZeroLiquidityMinted`] if the mint rounds to zero.
    /// - [`DexError::Overflow`] if a reserve or the supply would overflow.
    pub fn deposit(&mut self, desired0: u128, desired1: u128) -> Result<Deposit, DexError> {
        if desired0 == 0 || desired1 == 0 {
            return Err(DexError::ZeroAmount);
        }
        let (amount0, amount1) =
            math::optimal_deposit(desired0, desired1, self.reserve0, self.reserve1)?;
        let lp_minted = math::liquidity_for_deposit(
            amount0,
            amount1,
            self.reserve0,
            self.reserve1,
            self.total_lp_supply,
        )?;
        if lp_minted == 0 {
            return Err(DexError::ZeroLiquidityMinted);
        }

        let reserve0 = self
            .reserve0
            .checked_add(amount0)
            .ok_or(DexError::Overflow("reserve0"))?;
        let reserve1 = self
            .reserve1
            .checked_add(amount1)
            .ok_or(DexError::Overflow("reserve1"))?;
        let total_lp_supply = self
            .total_lp_supply
            .checked_add(lp_minted)
            .ok_or(DexError::Overflow("lp supply"))?;

        self.reserve0 = reserve0;
        self.reserve1 = reserve1;
        self.total_lp_supply = total_lp_supply;
        Ok(Deposit {
            amount0,
            amount1,
            lp_minted,
        })
    }

    /// Burns `lp_amount` and releases the proportional reserves.
    ///
    /// Returns `(amount0, amount1)`.
    ///
    /// # Errors
    ///
    /// - [`DexError::ZeroAmount`] if `lp_amount == 0`.
    /// - [`DexError::InsufficientLpBalance`] if `lp_amount` is not below the
    ///   total supply.
    /// - [`DexError::InsufficientLiquidity`] if either payout rounds to zero.
    pub fn withdraw(&mut self, lp_amount: u128) -> Result<(u128, u128), DexError> {
        if lp_amount == 0 {
            return Err(DexError::ZeroAmount);
        }
        // The locked minimum keeps the supply strictly above any burn.
        if lp_amount >= self.total_lp_supply {
            return Err(DexError::InsufficientLpBalance {
                requested: lp_amount,
                available: self.total_lp_supply.saturating_sub(MINIMUM_LIQUIDITY),
            });
        }
        let (amount0, amount1) = math::withdrawal_amounts(
            lp_amount,
            self.reserve0,
            self.reserve1,
            self.total_lp_supply,
        )?;
        if amount0 == 0 || amount1 == 0 {
            return Err(DexError::InsufficientLiquidity);
        }

        self.reserve0 -= amount0;
        self.reserve1 -= amount1;
        self.total_lp_supply -= lp_amount;
        Ok((amount0, amount1))
    }
}
