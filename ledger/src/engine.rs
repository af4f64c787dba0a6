//! Core ledger engine implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use fxwallet_common::{amount, Currency, CurrencyPair, LedgerError, LedgerResult, Money};
use fxwallet_fx::{Conversion, RateTable};

use crate::state::LedgerState;

/// Outcome of a committed exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeReceipt {
    /// Receipt identifier for caller-side confirmations.
    pub id: Uuid,
    /// Balances after the exchange.
    pub state: LedgerState,
    /// Amount debited from the source currency.
    pub debited: Money,
    /// Amount credited to the target currency.
    pub converted: Money,
    /// Rate applied.
    pub rate: Decimal,
    /// When the exchange was applied.
    pub executed_at: DateTime<Utc>,
}

/// Owns the wallet balances and applies deposits and exchanges.
///
/// Every operation either moves the ledger from one valid state to another
/// in a single step or fails without touching it. Mutations take
/// `&mut self`; see [`crate::SharedLedger`] for a lock-guarded handle.
#[derive(Debug)]
pub struct LedgerEngine {
    state: LedgerState,
    rates: Arc<RateTable>,
}

impl LedgerEngine {
    /// Create an engine with all balances at zero.
    pub fn new(rates: Arc<RateTable>) -> Self {
        Self::with_state(LedgerState::zero(), rates)
    }

    /// Create an engine from a restored or fixture state.
    pub fn with_state(state: LedgerState, rates: Arc<RateTable>) -> Self {
        Self { state, rates }
    }

    /// Add funds to one currency.
    #[instrument(skip(self))]
    pub fn deposit(&mut self, currency: Currency, amount: Decimal) -> LedgerResult<LedgerState> {
        let amount = amount::validate(amount, currency).map_err(|e| {
            warn!(error = %e, code = e.error_code(), "Deposit rejected");
            e
        })?;

        let balance = self.state.balance(currency);
        let updated = balance.checked_add(amount).ok_or_else(|| {
            LedgerError::invalid_amount(format!("{} {} overflows the balance", amount, currency))
        })?;

        self.state = self.state.with_balance(currency, updated);

        info!(balance = %updated, "Deposit applied");
        Ok(self.snapshot())
    }

    /// Sell `amount` of `from` for `to` at the configured rate.
    #[instrument(skip(self))]
    pub fn exchange(
        &mut self,
        from: Currency,
        to: Currency,
        amount: Decimal,
    ) -> LedgerResult<ExchangeReceipt> {
        let (conversion, from_after, to_after) =
            self.plan_exchange(from, to, amount).map_err(|e| {
                warn!(error = %e, code = e.error_code(), "Exchange rejected");
                e
            })?;

        self.state = self
            .state
            .with_balance(from, from_after)
            .with_balance(to, to_after);

        let receipt = ExchangeReceipt {
            id: Uuid::now_v7(),
            state: self.snapshot(),
            debited: conversion.input,
            converted: conversion.output,
            rate: conversion.rate,
            executed_at: Utc::now(),
        };

        info!(
            receipt_id = %receipt.id,
            converted = %receipt.converted,
            rate = %receipt.rate,
            "Exchange applied"
        );

        Ok(receipt)
    }

    /// Immutable copy of the current balances.
    pub fn snapshot(&self) -> LedgerState {
        self.state.clone()
    }

    /// Rate [`LedgerEngine::exchange`] would apply to the pair.
    pub fn quote_rate(&self, from: Currency, to: Currency) -> LedgerResult<Decimal> {
        if from == to {
            return Err(LedgerError::SameCurrency(from));
        }

        let pair = CurrencyPair::new(from, to);
        let rate = self
            .rates
            .rate(&pair)
            .ok_or(LedgerError::MissingRate(pair))?;

        debug!(pair = %pair, rate = %rate, "Quoted rate");
        Ok(rate)
    }

    /// Preview the amount an exchange would credit, ignoring balances.
    pub fn quote(&self, from: Currency, to: Currency, amount: Decimal) -> LedgerResult<Money> {
        let rate = self.quote_rate(from, to)?;
        let amount = amount::validate(amount, from)?;
        Ok(Conversion::compute(Money::new(amount, from), to, rate)?.output)
    }

    /// Validate an exchange and compute the resulting balances without
    /// applying them.
    fn plan_exchange(
        &self,
        from: Currency,
        to: Currency,
        amount: Decimal,
    ) -> LedgerResult<(Conversion, Decimal, Decimal)> {
        if from == to {
            return Err(LedgerError::SameCurrency(from));
        }

        let amount = amount::validate(amount, from)?;

        let available = self.state.balance(from);
        if amount > available {
            return Err(LedgerError::InsufficientBalance {
                currency: from,
                requested: amount,
                available,
            });
        }

        let rate = self.quote_rate(from, to)?;
        let conversion = Conversion::compute(Money::new(amount, from), to, rate)?;

        let from_after = available - amount;
        let to_after = self
            .state
            .balance(to)
            .checked_add(conversion.output.value)
            .ok_or_else(|| {
                LedgerError::invalid_amount(format!(
                    "{} overflows the {} balance",
                    conversion.output, to
                ))
            })?;

        Ok((conversion, from_after, to_after))
    }
}
