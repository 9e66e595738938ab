//! In-memory reference ledger.
//!
//! [`InMemoryLedger`] keeps balances in a `HashMap` behind a mutex and
//! settles transfer batches atomically. Tokens must be registered with a
//! minter before they can be minted; only that minter may mint.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Ledger, LedgerError, Transfer};
use crate::domain::{AccountId, TokenId};

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<(TokenId, AccountId), u128>,
    minters: HashMap<TokenId, AccountId>,
}

impl LedgerState {
    fn balance(&self, token: TokenId, owner: AccountId) -> u128 {
        self.balances.get(&(token, owner)).copied().unwrap_or(0)
    }
}

/// Multi-token ledger holding every balance in process memory.
#[derive(Debug)]
pub struct InMemoryLedger {
    custody: AccountId,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Creates an empty ledger whose pool reserves are held by `custody`.
    #[must_use]
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            state: Mutex::new(LedgerState::default()),
        }
    }

    /// Returns the custody account.
    #[must_use]
    pub const fn custody(&self) -> AccountId {
        self.custody
    }

    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `token` with `minter` as its only minting authority.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unauthorized`] if the token is already
    /// registered or the minter is the null identity.
    pub fn register_token(&self, token: TokenId, minter: AccountId) -> Result<(), LedgerError> {
        if minter.is_zero() {
            return Err(LedgerError::Unauthorized(
                "minter must not be the null identity".to_string(),
            ));
        }
        let mut state = self.lock();
        if state.minters.contains_key(&token) {
            return Err(LedgerError::Unauthorized(format!(
                "token {token} is already registered"
            )));
        }
        state.minters.insert(token, minter);
        tracing::info!(%token, %minter, "token registered");
        Ok(())
    }

    /// Mints `amount` of `token` to `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Unauthorized`] if `minter` is not the registered
    ///   minter of `token`.
    /// - [`LedgerError::Overflow`] if the credited balance overflows.
    pub fn mint(
        &self,
        token: TokenId,
        minter: AccountId,
        to: AccountId,
        amount: u128,
    ) -> Result<u128, LedgerError> {
        let mut state = self.lock();
        match state.minters.get(&token) {
            Some(registered) if *registered == minter => {}
            Some(_) => {
                return Err(LedgerError::Unauthorized(format!(
                    "{minter} may not mint {token}"
                )));
            }
            None => {
                return Err(LedgerError::Unauthorized(format!(
                    "token {token} is not registered"
                )));
            }
        }
        let balance = state
            .balance(token, to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(token))?;
        state.balances.insert((token, to), balance);
        tracing::debug!(%token, %to, amount, "minted");
        Ok(balance)
    }

    /// Computes the balances a batch would produce without touching state.
    fn plan(
        &self,
        state: &LedgerState,
        transfers: &[Transfer],
    ) -> Result<HashMap<(TokenId, AccountId), u128>, LedgerError> {
        let mut overlay: HashMap<(TokenId, AccountId), u128> = HashMap::new();
        let read = |overlay: &HashMap<(TokenId, AccountId), u128>, key: (TokenId, AccountId)| {
            overlay
                .get(&key)
                .copied()
                .unwrap_or_else(|| state.balance(key.0, key.1))
        };
        for transfer in transfers {
            let (token, debit, credit, amount) = match *transfer {
                Transfer::Pull {
                    token,
                    from,
                    amount,
                } => (token, from, self.custody, amount),
                Transfer::Push { token, to, amount } => (token, self.custody, to, amount),
            };
            if amount == 0 || debit == credit {
                continue;
            }
            let available = read(&overlay, (token, debit));
            let remaining =
                available
                    .checked_sub(amount)
                    .ok_or(LedgerError::InsufficientBalance {
                        token,
                        owner: debit,
                        needed: amount,
                        available,
                    })?;
            overlay.insert((token, debit), remaining);
            let credited = read(&overlay, (token, credit))
                .checked_add(amount)
                .ok_or(LedgerError::Overflow(token))?;
            overlay.insert((token, credit), credited);
        }
        Ok(overlay)
    }
}

impl Ledger for InMemoryLedger {
    fn balance_of(&self, token: TokenId, owner: AccountId) -> u128 {
        self.lock().balance(token, owner)
    }

    fn pull(&self, token: TokenId, from: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.settle(&[Transfer::Pull {
            token,
            from,
            amount,
        }])
    }

    fn push(&self, token: TokenId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.settle(&[Transfer::Push { token, to, amount }])
    }

    fn settle(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let overlay = self.plan(&state, transfers)?;
        state.balances.extend(overlay);
        Ok(())
    }
}
