//! Property-based tests using `proptest` for the pool invariants.
//!
//! 1. **Key symmetry**: `derive_key(a, b, fee) == derive_key(b, a, fee)`.
//! 2. **Initial issuance**: creation mints `isqrt(a * b) - 1000` or fails.
//! 3. **Invariant preservation**: `reserve0 * reserve1` never decreases
//!    across any sequence of swaps.
//! 4. **LP round trip**: remove up to half a position, re-add the paid-out
//!    amounts, and the LP balance returns to within rounding of its start.
//! 5. **Supply accounting**: total LP supply equals the sum of positions.

use ethereum_types::U256;
use proptest::prelude::*;

use crate::domain::{AccountId, Pool, PoolEntry, PoolRegistry, TokenId};
use crate::error::DexError;
use crate::math::{MINIMUM_LIQUIDITY, isqrt};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn tok(b: u8) -> TokenId {
    TokenId::from_bytes([b; 32])
}

fn provider() -> AccountId {
    AccountId::from_bytes([0xa1; 32])
}

fn reserve_strategy() -> impl Strategy<Value = u128> {
    10_000u128..1_000_000_000_000_000_000_000
}

fn make_entry(r0: u128, r1: u128) -> PoolEntry {
    let Ok(opening) = Pool::open(tok(1), tok(2), r0, r1, 30, 0) else {
        panic!("valid pool");
    };
    PoolEntry::new(opening.pool.key(), opening.pool, provider(), opening.lp_minted)
}

fn k(pool: &Pool) -> U256 {
    U256::from(pool.reserve0) * U256::from(pool.reserve1)
}

fn position_sum(entry: &PoolEntry) -> u128 {
    entry.positions().map(|(_, balance)| *balance).sum()
}

// ---------------------------------------------------------------------------
// 1-2. Keys and creation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_derive_key_is_symmetric(
        a in any::<[u8; 32]>(),
        b in any::<[u8; 32]>(),
        fee in 0u32..10_000,
    ) {
        let (a, b) = (TokenId::from_bytes(a), TokenId::from_bytes(b));
        prop_assert_eq!(
            PoolRegistry::derive_key(a, b, fee),
            PoolRegistry::derive_key(b, a, fee)
        );
    }

    #[test]
    fn prop_create_issuance(
        amount_a in 1u128..u128::from(u64::MAX),
        amount_b in 1u128..u128::from(u64::MAX),
    ) {
        let root = isqrt(U256::from(amount_a) * U256::from(amount_b)).low_u128();
        match Pool::open(tok(1), tok(2), amount_a, amount_b, 30, 0) {
            Ok(opening) => {
                prop_assert!(root > MINIMUM_LIQUIDITY);
                prop_assert_eq!(opening.lp_minted, root - MINIMUM_LIQUIDITY);
                prop_assert_eq!(opening.pool.total_lp_supply, root);
            }
            Err(DexError::InsufficientInitialLiquidity { minted, .. }) => {
                prop_assert!(root <= MINIMUM_LIQUIDITY);
                prop_assert_eq!(minted, 0);
            }
            Err(other) => {
                return Err(TestCaseError::fail(format!("unexpected error {other}")));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// 3. Invariant preservation
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_swaps_never_decrease_k(
        r0 in reserve_strategy(),
        r1 in reserve_strategy(),
        swaps in prop::collection::vec((any::<bool>(), 1u128..1_000_000_000_000_000_000), 1..12),
    ) {
        let entry = make_entry(r0, r1);
        let mut pool = entry.pool;
        for (zero_for_one, amount) in swaps {
            let token_in = if zero_for_one { pool.token0 } else { pool.token1 };
            let before = k(&pool);
            let snapshot = pool;
            match pool.swap(token_in, amount) {
                Ok(_) => prop_assert!(k(&pool) >= before),
                Err(_) => prop_assert_eq!(pool, snapshot),
            }
            prop_assert!(pool.reserve0 > 0 && pool.reserve1 > 0);
        }
    }
}

// ---------------------------------------------------------------------------
// 4-5. Liquidity round trip and supply accounting
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_remove_then_add_restores_lp_balance(
        r0 in reserve_strategy(),
        r1 in reserve_strategy(),
        share_bps in 1u128..5_000,
    ) {
        let mut entry = make_entry(r0, r1);
        let start = entry.lp_balance(provider());
        let burn = (start * share_bps / 10_000).max(1);

        let Ok(_) = entry.debit(provider(), burn) else {
            return Err(TestCaseError::fail("debit failed"));
        };
        let (amount0, amount1) = match entry.pool.withdraw(burn) {
            Ok(amounts) => amounts,
            Err(DexError::InsufficientLiquidity) => return Ok(()),
            Err(other) => return Err(TestCaseError::fail(format!("withdraw: {other}"))),
        };
        prop_assert_eq!(position_sum(&entry), entry.pool.total_lp_supply);

        // LP value of one unit of each token; every floor on the way out and
        // back in costs at most a couple of those.
        let supply = entry.pool.total_lp_supply;
        let tolerance = 3 * (supply / entry.pool.reserve0 + 1)
            + 3 * (supply / entry.pool.reserve1 + 1)
            + 3;

        let deposit = match entry.pool.deposit(amount0, amount1) {
            Ok(deposit) => deposit,
            Err(DexError::ZeroLiquidityMinted) => return Ok(()),
            Err(other) => return Err(TestCaseError::fail(format!("deposit: {other}"))),
        };
        prop_assert!(deposit.amount0 <= amount0 && deposit.amount1 <= amount1);
        let Ok(end) = entry.credit(provider(), deposit.lp_minted) else {
            return Err(TestCaseError::fail("credit failed"));
        };

        // Rounding only ever costs the provider.
        prop_assert!(end <= start);
        prop_assert!(start - end <= tolerance, "lost {} lp units", start - end);
        prop_assert_eq!(position_sum(&entry), entry.pool.total_lp_supply);
    }
}
