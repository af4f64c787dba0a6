//! Validation of caller-supplied amounts.
//!
//! Amounts reach the ledger as text typed into a form or as `f64` from a
//! widget. Both are converted to [`Decimal`] here and checked against the
//! target currency before any balance is touched.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{LedgerError, LedgerResult};
use crate::monetary::Currency;

/// Check that `amount` is strictly positive and fits the currency's minor units.
pub fn validate(amount: Decimal, currency: Currency) -> LedgerResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(format!(
            "{} must be greater than zero",
            amount
        )));
    }

    let places = currency.decimal_places();
    if amount.normalize().scale() > places {
        return Err(LedgerError::invalid_amount(format!(
            "{} has more than {} decimal places for {}",
            amount, places, currency
        )));
    }

    Ok(amount)
}

/// Parse and validate a textual amount such as `"250.75"`.
pub fn parse(input: &str, currency: Currency) -> LedgerResult<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid_amount("amount is empty"));
    }

    let amount = Decimal::from_str(trimmed)
        .map_err(|_| LedgerError::invalid_amount(format!("'{}' is not a number", trimmed)))?;

    validate(amount, currency)
}

/// Convert and validate a floating point amount.
///
/// NaN and infinities are rejected. The value is taken at the precision
/// `f64` displays it with, so `0.1` becomes exactly `0.1`.
pub fn from_f64(value: f64, currency: Currency) -> LedgerResult<Decimal> {
    if !value.is_finite() {
        return Err(LedgerError::invalid_amount(format!("{} is not finite", value)));
    }

    let amount = Decimal::from_f64(value)
        .ok_or_else(|| LedgerError::invalid_amount(format!("{} is out of range", value)))?;

    validate(amount, currency)
}
