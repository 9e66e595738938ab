//! Integer arithmetic for the constant-product pool.
//!
//! Everything here is pure and deterministic: amounts are `u128`, products
//! are widened to 256/512 bits so they never overflow, and every division
//! rounds down, which always favours the pool over the trader or provider.

pub mod checked;
pub mod swap_math;

pub use checked::{isqrt, mul_div};
pub use swap_math::{
    BPS_DENOMINATOR, MAX_FEE_BPS, MINIMUM_LIQUIDITY, fee_amount, initial_liquidity,
    k_non_decreasing, liquidity_for_deposit, optimal_deposit, quote, validate_fee,
    withdrawal_amounts,
};
