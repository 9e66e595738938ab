//! Constant-product pricing and liquidity share formulas.

use ethereum_types::U256;

use super::checked::{isqrt, mul_div, narrow_u256, narrow_u512};
use crate::error::DexError;

/// Basis-point denominator: 10 000 bps = 100 %.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Highest accepted fee rate. A 100 % fee would make every swap output zero.
pub const MAX_FEE_BPS: u32 = BPS_DENOMINATOR - 1;

/// LP units withheld from the first depositor and locked in the sink.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

/// Checks that a fee rate is below 100 %.
///
/// # Errors
///
/// Returns [`DexError::InvalidFee`] if `fee_bps > MAX_FEE_BPS`.
pub const fn validate_fee(fee_bps: u32) -> Result<u32, DexError> {
    if fee_bps > MAX_FEE_BPS {
        return Err(DexError::InvalidFee(fee_bps));
    }
    Ok(fee_bps)
}

/// Output amount for an exact-in swap against reserves
/// `(reserve_in, reserve_out)`.
///
/// The fee-adjusted input is kept at basis-point scale so the only rounding
/// step is the final floor:
///
/// ```text
/// out = reserve_out * in * (10000 - fee) / (reserve_in * 10000 + in * (10000 - fee))
/// ```
///
/// The result is strictly below `reserve_out`, and
/// `(reserve_in + in) * (reserve_out - out) >= reserve_in * reserve_out`.
///
/// # Errors
///
/// - [`DexError::ZeroInput`] if `amount_in == 0`.
/// - [`DexError::InvalidFee`] if the fee is 100 % or more.
/// - [`DexError::InsufficientLiquidity`] if a reserve is empty or the output
///   rounds down to zero.
pub fn quote(
    reserve_in: u128,
    reserve_out: u128,
    amount_in: u128,
    fee_bps: u32,
) -> Result<u128, DexError> {
    if amount_in == 0 {
        return Err(DexError::ZeroInput);
    }
    let fee_bps = validate_fee(fee_bps)?;
    if reserve_in == 0 || reserve_out == 0 {
        return Err(DexError::InsufficientLiquidity);
    }

    let complement = U256::from(BPS_DENOMINATOR - fee_bps);
    let scaled_in = U256::from(amount_in) * complement;
    let denominator = U256::from(reserve_in) * U256::from(BPS_DENOMINATOR) + scaled_in;
    let numerator = U256::from(reserve_out).full_mul(scaled_in);

    let amount_out = narrow_u512(numerator / ethereum_types::U512::from(denominator))?;
    if amount_out == 0 {
        return Err(DexError::InsufficientLiquidity);
    }
    Ok(amount_out)
}

/// Nominal fee charged on `amount_in`, rounded down.
///
/// # Errors
///
/// Propagates [`DexError::Overflow`] from [`mul_div`]; cannot happen for a
/// valid fee.
pub fn fee_amount(amount_in: u128, fee_bps: u32) -> Result<u128, DexError> {
    mul_div(
        amount_in,
        u128::from(fee_bps),
        u128::from(BPS_DENOMINATOR),
    )
}

/// Returns `true` when `new0 * new1 >= old0 * old1`.
#[must_use]
pub fn k_non_decreasing(old0: u128, old1: u128, new0: u128, new1: u128) -> bool {
    U256::from(new0) * U256::from(new1) >= U256::from(old0) * U256::from(old1)
}

/// LP units issued to the creator of a pool: `floor(sqrt(a * b)) - MINIMUM_LIQUIDITY`.
///
/// Returns `0` when the square root does not exceed [`MINIMUM_LIQUIDITY`];
/// the caller treats that as a failed creation.
///
/// # Errors
///
/// Returns [`DexError::Overflow`] if the root does not fit in `u128`, which
/// cannot happen for `u128` operands.
pub fn initial_liquidity(amount_a: u128, amount_b: u128) -> Result<u128, DexError> {
    let root = narrow_u256(isqrt(U256::from(amount_a) * U256::from(amount_b)))?;
    Ok(root.saturating_sub(MINIMUM_LIQUIDITY))
}

/// Ratio-preserving deposit for the desired maxima.
///
/// Tries `(desired0, desired0 * reserve1 / reserve0)` first; if the second
/// leg exceeds `desired1`, uses `(desired1 * reserve0 / reserve1, desired1)`.
/// Neither returned amount exceeds its desired maximum.
///
/// # Errors
///
/// - [`DexError::InsufficientLiquidity`] if a reserve is empty.
/// - [`DexError::Overflow`] if the fallback leg does not fit in `u128`.
pub fn optimal_deposit(
    desired0: u128,
    desired1: u128,
    reserve0: u128,
    reserve1: u128,
) -> Result<(u128, u128), DexError> {
    if reserve0 == 0 || reserve1 == 0 {
        return Err(DexError::InsufficientLiquidity);
    }
    // An overflowing first leg is necessarily larger than desired1.
    if let Ok(amount1) = mul_div(desired0, reserve1, reserve0)
        && amount1 <= desired1
    {
        return Ok((desired0, amount1));
    }
    let amount0 = mul_div(desired1, reserve0, reserve1)?;
    Ok((amount0.min(desired0), desired1))
}

/// LP units minted for a deposit into a funded pool:
/// `min(total * d0 / r0, total * d1 / r1)`.
///
/// # Errors
///
/// - [`DexError::InsufficientLiquidity`] if a reserve is empty.
/// - [`DexError::Overflow`] if a share does not fit in `u128`.
pub fn liquidity_for_deposit(
    deposit0: u128,
    deposit1: u128,
    reserve0: u128,
    reserve1: u128,
    total_supply: u128,
) -> Result<u128, DexError> {
    if reserve0 == 0 || reserve1 == 0 {
        return Err(DexError::InsufficientLiquidity);
    }
    let by0 = mul_div(deposit0, total_supply, reserve0)?;
    let by1 = mul_div(deposit1, total_supply, reserve1)?;
    Ok(by0.min(by1))
}

/// Reserves paid out for burning `lp_amount` of `total_supply`.
///
/// # Errors
///
/// - [`DexError::InsufficientLpBalance`] if `lp_amount > total_supply`.
/// - [`DexError::Overflow`] if `total_supply` is zero.
pub fn withdrawal_amounts(
    lp_amount: u128,
    reserve0: u128,
    reserve1: u128,
    total_supply: u128,
) -> Result<(u128, u128), DexError> {
    if lp_amount > total_supply {
        return Err(DexError::InsufficientLpBalance {
            requested: lp_amount,
            available: total_supply,
        });
    }
    let amount0 = mul_div(reserve0, lp_amount, total_supply)?;
    let amount1 = mul_div(reserve1, lp_amount, total_supply)?;
    Ok((amount0, amount1))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn quote_reference_example() {
        let Ok(out) = quote(1_000, 2_000, 100, 30) else {
            panic!("quote failed");
        };
        assert_eq!(out, 181);
        assert!(k_non_decreasing(1_000, 2_000, 1_100, 2_000 - out));
    }

    #[test]
    fn quote_zero_fee_matches_plain_formula() {
        // 2000 * 100 / 1100 = 181.8
        assert_eq!(quote(1_000, 2_000, 100, 0).ok(), Some(181));
        assert_eq!(quote(1_000, 1_000, 1_000, 0).ok(), Some(500));
    }

    #[test]
    fn quote_rejects_degenerate_inputs() {
        assert!(matches!(quote(1_000, 2_000, 0, 30), Err(DexError::ZeroInput)));
        assert!(matches!(
            quote(1_000, 2_000, 10, 10_000),
            Err(DexError::InvalidFee(10_000))
        ));
        assert!(matches!(
            quote(0, 2_000, 10, 30),
            Err(DexError::InsufficientLiquidity)
        ));
        assert!(matches!(
            quote(1_000_000, 10, 1, 30),
            Err(DexError::InsufficientLiquidity)
        ));
    }

    #[test]
    fn quote_handles_wide_reserves() {
        let reserve = u128::MAX / 4;
        let Ok(out) = quote(reserve, reserve, reserve, 30) else {
            panic!("wide quote failed");
        };
        assert!(out < reserve / 2);
        assert!(out > reserve / 3);
    }

    #[test]
    fn validate_fee_bounds() {
        assert_eq!(validate_fee(0).ok(), Some(0));
        assert_eq!(validate_fee(MAX_FEE_BPS).ok(), Some(MAX_FEE_BPS));
        assert!(validate_fee(BPS_DENOMINATOR).is_err());
    }

    #[test]
    fn fee_amount_rounds_down() {
        assert_eq!(fee_amount(100, 30).ok(), Some(0));
        assert_eq!(fee_amount(10_000, 30).ok(), Some(30));
    }

    #[test]
    fn initial_liquidity_withholds_minimum() {
        assert_eq!(initial_liquidity(1_000_000, 4_000_000).ok(), Some(1_999_000));
        assert_eq!(initial_liquidity(1_000, 1_000).ok(), Some(0));
        assert_eq!(initial_liquidity(1_001, 1_001).ok(), Some(1));
        assert_eq!(
            initial_liquidity(u128::MAX, u128::MAX).ok(),
            Some(u128::MAX - MINIMUM_LIQUIDITY)
        );
    }

    #[test]
    fn optimal_deposit_uses_first_leg_when_it_fits() {
        assert_eq!(
            optimal_deposit(100, 500, 1_000, 2_000).ok(),
            Some((100, 200))
        );
    }

    #[test]
    fn optimal_deposit_falls_back_to_second_leg() {
        assert_eq!(
            optimal_deposit(100, 150, 1_000, 2_000).ok(),
            Some((75, 150))
        );
    }

    #[test]
    fn optimal_deposit_survives_first_leg_overflow() {
        let Ok((a0, a1)) = optimal_deposit(u128::MAX, 10, 1, u128::MAX) else {
            panic!("fallback leg should apply");
        };
        assert_eq!(a1, 10);
        assert_eq!(a0, 0);
    }

    #[test]
    fn liquidity_for_deposit_takes_minimum_share() {
        assert_eq!(
            liquidity_for_deposit(100, 250, 1_000, 2_000, 1_414).ok(),
            Some(141)
        );
    }

    #[test]
    fn withdrawal_is_proportional() {
        assert_eq!(
            withdrawal_amounts(500, 1_000, 2_000, 1_000).ok(),
            Some((500, 1_000))
        );
        assert!(matches!(
            withdrawal_amounts(1_001, 1_000, 2_000, 1_000),
            Err(DexError::InsufficientLpBalance { .. })
        ));
    }

    fn reserve_strategy() -> impl Strategy<Value = u128> {
        1_000u128..1_000_000_000_000_000_000_000_000
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_quote_never_decreases_k(
            reserve_in in reserve_strategy(),
            reserve_out in reserve_strategy(),
            amount_in in 1u128..1_000_000_000_000_000_000_000,
            fee_bps in 0u32..1_000,
        ) {
            let Ok(out) = quote(reserve_in, reserve_out, amount_in, fee_bps) else {
                return Ok(());
            };
            prop_assert!(out < reserve_out);
            prop_assert!(k_non_decreasing(
                reserve_in,
                reserve_out,
                reserve_in + amount_in,
                reserve_out - out,
            ));
        }

        #[test]
        fn prop_higher_fee_never_pays_more(
            reserve_in in reserve_strategy(),
            reserve_out in reserve_strategy(),
            amount_in in 1u128..1_000_000_000_000,
            low in 0u32..500,
            extra in 0u32..500,
        ) {
            let cheap = quote(reserve_in, reserve_out, amount_in, low).unwrap_or(0);
            let dear = quote(reserve_in, reserve_out, amount_in, low + extra).unwrap_or(0);
            prop_assert!(dear <= cheap);
        }

        #[test]
        fn prop_optimal_deposit_within_desired(
            desired0 in 1u128..1_000_000_000_000,
            desired1 in 1u128..1_000_000_000_000,
            reserve0 in reserve_strategy(),
            reserve1 in reserve_strategy(),
        ) {
            let Ok((d0, d1)) = optimal_deposit(desired0, desired1, reserve0, reserve1) else {
                return Err(TestCaseError::fail("optimal deposit failed"));
            };
            prop_assert!(d0 <= desired0);
            prop_assert!(d1 <= desired1);
        }

        #[test]
        fn prop_initial_liquidity_formula(
            a in 1u128..u128::from(u64::MAX),
            b in 1u128..u128::from(u64::MAX),
        ) {
            let Ok(minted) = initial_liquidity(a, b) else {
                return Err(TestCaseError::fail("initial liquidity failed"));
            };
            let root = minted + MINIMUM_LIQUIDITY;
            if minted > 0 {
                prop_assert!(root * root <= a * b);
                prop_assert!((root + 1) * (root + 1) > a * b);
            } else {
                let r = MINIMUM_LIQUIDITY + 1;
                prop_assert!(r * r > a * b);
            }
        }
    }
}
