//! Caller-side session: a ledger plus the store it is persisted to.

use std::sync::Arc;

use fxwallet_common::{Currency, LedgerResult, Money};
use fxwallet_fx::RateTable;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::engine::{ExchangeReceipt, LedgerEngine};
use crate::shared::SharedLedger;
use crate::state::LedgerState;
use crate::storage::{LedgerStore, StorageResult};

/// A committed mutation and the outcome of persisting it.
///
/// The ledger change stands even when `saved` is an error; the caller
/// decides whether to retry with [`WalletSession::save`].
#[derive(Debug)]
#[must_use]
pub struct Committed<T> {
    pub value: T,
    pub saved: StorageResult<()>,
}

impl<T> Committed<T> {
    pub fn is_saved(&self) -> bool {
        self.saved.is_ok()
    }
}

/// Loads the ledger at start, saves it after every successful mutation.
///
/// A mutation and its save run under one writer guard, so saves reach the
/// store in the order the ledger applied them.
pub struct WalletSession {
    ledger: SharedLedger,
    store: Arc<dyn LedgerStore>,
    writer: Mutex<()>,
}

impl WalletSession {
    /// Restore the saved ledger, or start from zero when nothing is saved.
    #[instrument(skip_all, fields(store = store.name()))]
    pub async fn open(store: Arc<dyn LedgerStore>, rates: Arc<RateTable>) -> StorageResult<Self> {
        let state = match store.load().await? {
            Some(state) => {
                info!("Restored saved balances");
                state
            }
            None => {
                info!("No saved balances, starting from zero");
                LedgerState::zero()
            }
        };

        Ok(Self::with_state(store, state, rates))
    }

    /// Start from a caller-supplied state without reading the store.
    pub fn with_state(store: Arc<dyn LedgerStore>, state: LedgerState, rates: Arc<RateTable>) -> Self {
        Self {
            ledger: SharedLedger::new(LedgerEngine::with_state(state, rates)),
            store,
            writer: Mutex::new(()),
        }
    }

    pub async fn deposit(
        &self,
        currency: Currency,
        amount: Decimal,
    ) -> LedgerResult<Committed<LedgerState>> {
        let _writer = self.writer.lock().await;
        let state = self.ledger.deposit(currency, amount)?;
        let saved = self.persist(&state).await;
        Ok(Committed {
            value: state,
            saved,
        })
    }

    pub async fn exchange(
        &self,
        from: Currency,
        to: Currency,
        amount: Decimal,
    ) -> LedgerResult<Committed<ExchangeReceipt>> {
        let _writer = self.writer.lock().await;
        let receipt = self.ledger.exchange(from, to, amount)?;
        let saved = self.persist(&receipt.state).await;
        Ok(Committed {
            value: receipt,
            saved,
        })
    }

    pub fn snapshot(&self) -> LedgerState {
        self.ledger.snapshot()
    }

    pub fn quote_rate(&self, from: Currency, to: Currency) -> LedgerResult<Decimal> {
        self.ledger.quote_rate(from, to)
    }

    pub fn quote(&self, from: Currency, to: Currency, amount: Decimal) -> LedgerResult<Money> {
        self.ledger.quote(from, to, amount)
    }

    /// Persist the current snapshot, e.g. to retry a failed save.
    pub async fn save(&self) -> StorageResult<()> {
        let _writer = self.writer.lock().await;
        let state = self.ledger.snapshot();
        self.persist(&state).await
    }

    /// End the session and wipe the saved balances.
    #[instrument(skip_all, fields(store = self.store.name()))]
    pub async fn close_and_clear(self) -> StorageResult<()> {
        let _writer = self.writer.lock().await;
        self.store.clear().await?;
        info!("Session closed, saved balances cleared");
        Ok(())
    }

    async fn persist(&self, state: &LedgerState) -> StorageResult<()> {
        self.store.save(state).await.map_err(|e| {
            warn!(error = %e, store = self.store.name(), "Failed to save balances");
            e
        })
    }
}
