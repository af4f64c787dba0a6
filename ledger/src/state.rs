//! Ledger balances.

use std::collections::BTreeMap;

use fxwallet_common::{Currency, LedgerError, LedgerResult, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Balance of every supported currency at a point in time.
///
/// Every currency always has an entry and every balance is non-negative
/// and held at minor-unit precision. The type is an immutable value for
/// callers: only [`crate::LedgerEngine`] produces modified states.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Decimal>",
    into = "BTreeMap<Currency, Decimal>"
)]
pub struct LedgerState {
    balances: BTreeMap<Currency, Decimal>,
}

impl LedgerState {
    /// All balances at zero.
    pub fn zero() -> Self {
        Self {
            balances: Currency::ALL
                .into_iter()
                .map(|c| (c, Self::normalize(Decimal::ZERO, c)))
                .collect(),
        }
    }

    /// Build a state from known balances, defaulting the rest to zero.
    ///
    /// Negative balances are rejected. Values carrying more precision than
    /// the currency's minor unit (legacy floating point data) are rounded
    /// once here.
    pub fn from_balances(
        balances: impl IntoIterator<Item = (Currency, Decimal)>,
    ) -> LedgerResult<Self> {
        let mut state = Self::zero();

        for (currency, value) in balances {
            if value < Decimal::ZERO {
                return Err(LedgerError::invalid_amount(format!(
                    "{} balance {} is negative",
                    currency, value
                )));
            }
            state
                .balances
                .insert(currency, Self::normalize(value, currency));
        }

        Ok(state)
    }

    /// Balance of one currency.
    pub fn balance(&self, currency: Currency) -> Decimal {
        self.balances
            .get(&currency)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Balance of one currency as [`Money`].
    pub fn money(&self, currency: Currency) -> Money {
        Money::new(self.balance(currency), currency)
    }

    /// Iterate over balances in currency order.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.balances.iter().map(|(c, v)| (*c, *v))
    }

    /// Whether every balance is zero.
    pub fn is_empty(&self) -> bool {
        self.balances.values().all(|v| v.is_zero())
    }

    /// Copy of this state with one balance replaced.
    ///
    /// Callers are expected to have validated `value`.
    pub(crate) fn with_balance(&self, currency: Currency, value: Decimal) -> Self {
        let mut next = self.clone();
        next.balances
            .insert(currency, Self::normalize(value, currency));
        next
    }

    fn normalize(value: Decimal, currency: Currency) -> Decimal {
        let places = currency.decimal_places();
        let mut value = value.round_dp(places);
        value.rescale(places);
        value
    }
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<BTreeMap<String, Decimal>> for LedgerState {
    type Error = LedgerError;

    /// Codes are matched case-insensitively; two keys naming the same
    /// currency are rejected rather than one silently winning.
    fn try_from(raw: BTreeMap<String, Decimal>) -> Result<Self, Self::Error> {
        let mut balances = BTreeMap::new();

        for (code, value) in raw {
            let currency = code.parse::<Currency>()?;
            if balances.insert(currency, value).is_some() {
                return Err(LedgerError::invalid_amount(format!(
                    "{} balance appears more than once",
                    currency
                )));
            }
        }

        Self::from_balances(balances)
    }
}

impl From<LedgerState> for BTreeMap<Currency, Decimal> {
    fn from(state: LedgerState) -> Self {
        state.balances
    }
}
