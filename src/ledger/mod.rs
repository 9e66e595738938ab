//! Fungible-token ledger seam.
//!
//! The exchange never stores token balances itself. All reserves sit in a
//! single custody account on the ledger; the engine moves tokens in with
//! [`Ledger::pull`] and out with [`Ledger::push`]. Every public operation
//! hands its complete set of movements to [`Ledger::settle`] in one batch,
//! after pool state has been committed.

pub mod memory;

use std::fmt;

use crate::domain::{AccountId, TokenId};

pub use memory::InMemoryLedger;

/// Errors raised by a [`Ledger`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The debited account does not hold enough of the token.
    #[error("insufficient balance of {token} for {owner}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Token being debited.
        token: TokenId,
        /// Account being debited.
        owner: AccountId,
        /// Amount requested.
        needed: u128,
        /// Amount held.
        available: u128,
    },

    /// The caller is not allowed to perform the ledger operation.
    #[error("{0}")]
    Unauthorized(String),

    /// A credited balance would exceed `u128::MAX`.
    #[error("balance overflow for {0}")]
    Overflow(TokenId),
}

/// One token movement between an account and the exchange custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Inbound: `amount` of `token` from `from` into custody.
    Pull {
        /// Token moved.
        token: TokenId,
        /// Account debited.
        from: AccountId,
        /// Amount moved.
        amount: u128,
    },
    /// Outbound: `amount` of `token` from custody to `to`.
    Push {
        /// Token moved.
        token: TokenId,
        /// Account credited.
        to: AccountId,
        /// Amount moved.
        amount: u128,
    },
}

/// Balance query and transfer primitives consumed by the exchange.
///
/// Each primitive either fully succeeds or fails with no partial transfer.
pub trait Ledger: Send + Sync + fmt::Debug {
    /// Returns the balance of `owner` in `token`.
    fn balance_of(&self, token: TokenId, owner: AccountId) -> u128;

    /// Moves `amount` of `token` from `from` into custody.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the debit is not possible.
    fn pull(&self, token: TokenId, from: AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Moves `amount` of `token` from custody to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError`] if the credit is not possible.
    fn push(&self, token: TokenId, to: AccountId, amount: u128) -> Result<(), LedgerError>;

    /// Applies a batch of transfers as one unit.
    ///
    /// The default runs every pull before any push. If any step fails, the
    /// steps already applied are reversed newest first: pulls are pushed
    /// back to their payer and pushes are pulled back from their recipient.
    /// Implementations able to apply the batch under one lock should
    /// override this.
    ///
    /// # Errors
    ///
    /// Returns the first [`LedgerError`] encountered.
    fn settle(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let pulls = transfers
            .iter()
            .filter(|t| matches!(t, Transfer::Pull { .. }));
        let pushes = transfers
            .iter()
            .filter(|t| matches!(t, Transfer::Push { .. }));

        let mut applied: Vec<Transfer> = Vec::with_capacity(transfers.len());
        for transfer in pulls.chain(pushes) {
            if let Err(err) = apply_transfer(self, *transfer) {
                unwind(self, &applied);
                return Err(err);
            }
            applied.push(*transfer);
        }
        Ok(())
    }
}

fn apply_transfer<L: Ledger + ?Sized>(ledger: &L, transfer: Transfer) -> Result<(), LedgerError> {
    match transfer {
        Transfer::Pull {
            token,
            from,
            amount,
        } => ledger.pull(token, from, amount),
        Transfer::Push { token, to, amount } => ledger.push(token, to, amount),
    }
}

/// Reverses `applied` newest first; failures are logged and skipped.
fn unwind<L: Ledger + ?Sized>(ledger: &L, applied: &[Transfer]) {
    for transfer in applied.iter().rev() {
        let reversed = match *transfer {
            Transfer::Pull {
                token,
                from,
                amount,
            } => Transfer::Push {
                token,
                to: from,
                amount,
            },
            Transfer::Push { token, to, amount } => Transfer::Pull {
                token,
                from: to,
                amount,
            },
        };
        if let Err(err) = apply_transfer(ledger, reversed) {
            tracing::error!(?transfer, %err, "failed to reverse transfer");
        }
    }
}
