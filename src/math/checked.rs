//! Widened multiply-divide and integer square root.

use ethereum_types::{U256, U512};

use crate::error::DexError;

/// Computes `floor(a * b / denominator)` without intermediate overflow.
///
/// # Errors
///
/// - [`DexError::Overflow`] if `denominator` is zero or the quotient does
///   not fit in `u128`.
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128, DexError> {
    if denominator == 0 {
        return Err(DexError::Overflow("division by zero"));
    }
    let product = U256::from(a) * U256::from(b);
    let quotient = product / U256::from(denominator);
    narrow_u256(quotient)
}

/// Narrows a 256-bit value to `u128`.
pub(crate) fn narrow_u256(value: U256) -> Result<u128, DexError> {
    if value > U256::from(u128::MAX) {
        return Err(DexError::Overflow("result exceeds u128"));
    }
    Ok(value.low_u128())
}

/// Narrows a 512-bit value to `u128`.
pub(crate) fn narrow_u512(value: U512) -> Result<u128, DexError> {
    if value > U512::from(u128::MAX) {
        return Err(DexError::Overflow("result exceeds u128"));
    }
    Ok(value.low_u128())
}

/// Integer square root, `floor(sqrt(n))`, via Newton's method.
///
/// Starts from `ceil(n / 2)` and iterates `x = (x + n / x) / 2` until the
/// sequence stops decreasing. No floating point is involved, so the result
/// is bit-exact on every platform.
#[must_use]
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return n;
    }
    let two = U256::from(2u8);
    let mut x = n;
    let mut y = (n >> 1) + (n & U256::one());
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}
