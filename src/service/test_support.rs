//! Fixtures shared by the service tests.

#![allow(clippy::panic)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::domain::{AccountId, EventBus, PoolId, PoolRegistry, TokenId};
use crate::error::DexError;
use crate::ledger::{InMemoryLedger, Ledger, LedgerError, Transfer};

pub(crate) const CUSTODY: AccountId = AccountId::from_bytes([0xcc; 32]);
pub(crate) const MINTER: AccountId = AccountId::from_bytes([0xee; 32]);
pub(crate) const ALICE: AccountId = AccountId::from_bytes([0xa1; 32]);
pub(crate) const BOB: AccountId = AccountId::from_bytes([0xb0; 32]);

pub(crate) fn tok(b: u8) -> TokenId {
    TokenId::from_bytes([b; 32])
}

/// In-memory ledger with tokens 1..=4 registered and Alice and Bob funded.
pub(crate) fn funded_ledger() -> InMemoryLedger {
    let ledger = InMemoryLedger::new(CUSTODY);
    for b in 1..=4 {
        let Ok(()) = ledger.register_token(tok(b), MINTER) else {
            panic!("register token");
        };
        for owner in [ALICE, BOB] {
            let Ok(_) = ledger.mint(tok(b), MINTER, owner, 1_000_000_000_000) else {
                panic!("mint");
            };
        }
    }
    ledger
}

/// Ledger wrapper that can be told to fail every settlement.
#[derive(Debug)]
pub(crate) struct SwitchableLedger {
    pub(crate) inner: InMemoryLedger,
    pub(crate) fail: AtomicBool,
}

impl SwitchableLedger {
    pub(crate) fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            fail: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl Ledger for SwitchableLedger {
    fn balance_of(&self, token: TokenId, owner: AccountId) -> u128 {
        self.inner.balance_of(token, owner)
    }

    fn pull(&self, token: TokenId, from: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.inner.pull(token, from, amount)
    }

    fn push(&self, token: TokenId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.inner.push(token, to, amount)
    }

    fn settle(&self, transfers: &[Transfer]) -> Result<(), LedgerError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(LedgerError::Unauthorized("transfers frozen".to_string()));
        }
        self.inner.settle(transfers)
    }
}

/// Ledger that keeps the default batch settlement and refuses pushes to
/// one frozen account.
#[derive(Debug)]
pub(crate) struct FrozenRecipientLedger {
    pub(crate) inner: InMemoryLedger,
    frozen: Mutex<Option<AccountId>>,
}

impl FrozenRecipientLedger {
    pub(crate) fn new(inner: InMemoryLedger) -> Self {
        Self {
            inner,
            frozen: Mutex::new(None),
        }
    }

    pub(crate) fn freeze(&self, account: AccountId) {
        if let Ok(mut frozen) = self.frozen.lock() {
            *frozen = Some(account);
        }
    }
}

impl Ledger for FrozenRecipientLedger {
    fn balance_of(&self, token: TokenId, owner: AccountId) -> u128 {
        self.inner.balance_of(token, owner)
    }

    fn pull(&self, token: TokenId, from: AccountId, amount: u128) -> Result<(), LedgerError> {
        self.inner.pull(token, from, amount)
    }

    fn push(&self, token: TokenId, to: AccountId, amount: u128) -> Result<(), LedgerError> {
        let is_frozen = self
            .frozen
            .lock()
            .map(|frozen| *frozen == Some(to))
            .unwrap_or(false);
        if is_frozen {
            return Err(LedgerError::Unauthorized("recipient frozen".to_string()));
        }
        self.inner.push(token, to, amount)
    }
}

/// Ledger that tries to re-enter the registry while settling, the way a
/// hostile token would, and records what the registry answered.
#[derive(Debug, Default)]
pub(crate) struct ReentrantLedger {
    pub(crate) registry: OnceLock<Arc<PoolRegistry>>,
    pub(crate) target: OnceLock<PoolId>,
    pub(crate) observed: Mutex<Vec<Result<(), String>>>,
}

impl Ledger for ReentrantLedger {
    fn balance_of(&self, _token: TokenId, _owner: AccountId) -> u128 {
        u128::MAX
    }

    fn pull(&self, _token: TokenId, _from: AccountId, _amount: u128) -> Result<(), LedgerError> {
        Ok(())
    }

    fn push(&self, _token: TokenId, _to: AccountId, _amount: u128) -> Result<(), LedgerError> {
        if let (Some(registry), Some(target)) = (self.registry.get(), self.target.get()) {
            let outcome = match registry.enter(&[*target]) {
                Ok(_guard) => Ok(()),
                Err(DexError::Reentrant(id)) => Err(id.to_string()),
                Err(other) => Err(other.to_string()),
            };
            if let Ok(mut observed) = self.observed.lock() {
                observed.push(outcome);
            }
        }
        Ok(())
    }
}

pub(crate) fn shared_parts() -> (Arc<PoolRegistry>, EventBus) {
    (Arc::new(PoolRegistry::new()), EventBus::new(1_000))
}
