//! Lock-guarded ledger handle for concurrent callers.

use std::sync::Arc;

use fxwallet_common::{Currency, LedgerResult, Money};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::engine::{ExchangeReceipt, LedgerEngine};
use crate::state::LedgerState;

/// Cloneable handle to one [`LedgerEngine`].
///
/// Deposits and exchanges hold the write lock for the whole
/// read-modify-write; snapshots and quotes hold the read lock, so they can
/// run together but never see one leg of an exchange without the other.
/// The rate table sits behind the same lock as the balances.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<RwLock<LedgerEngine>>,
}

impl SharedLedger {
    /// Wrap an engine.
    pub fn new(engine: LedgerEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn deposit(&self, currency: Currency, amount: Decimal) -> LedgerResult<LedgerState> {
        self.inner.write().deposit(currency, amount)
    }

    pub fn exchange(
        &self,
        from: Currency,
        to: Currency,
        amount: Decimal,
    ) -> LedgerResult<ExchangeReceipt> {
        self.inner.write().exchange(from, to, amount)
    }

    pub fn snapshot(&self) -> LedgerState {
        self.inner.read().snapshot()
    }

    pub fn quote_rate(&self, from: Currency, to: Currency) -> LedgerResult<Decimal> {
        self.inner.read().quote_rate(from, to)
    }

    pub fn quote(&self, from: Currency, to: Currency, amount: Decimal) -> LedgerResult<Money> {
        self.inner.read().quote(from, to, amount)
    }
}

impl From<LedgerEngine> for SharedLedger {
    fn from(engine: LedgerEngine) -> Self {
        Self::new(engine)
    }
}
