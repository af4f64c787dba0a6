//! Static exchange-rate table.

use std::collections::BTreeMap;

use fxwallet_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// The rates shipped with the wallet.
///
/// Each direction is an independent quote, so `rate(a, b) * rate(b, a)`
/// is not 1 (USD/EUR round-trips at 0.85 * 1.18 = 1.003).
pub fn standard_rates() -> [(CurrencyPair, Decimal); 6] {
    [
        (CurrencyPair::new(Currency::Usd, Currency::Eur), Decimal::new(85, 2)),
        (CurrencyPair::new(Currency::Usd, Currency::Try), Decimal::new(275, 1)),
        (CurrencyPair::new(Currency::Eur, Currency::Usd), Decimal::new(118, 2)),
        (CurrencyPair::new(Currency::Eur, Currency::Try), Decimal::new(325, 1)),
        (CurrencyPair::new(Currency::Try, Currency::Usd), Decimal::new(36, 3)),
        (CurrencyPair::new(Currency::Try, Currency::Eur), Decimal::new(31, 3)),
    ]
}

/// Ordered currency pair to conversion multiplier.
///
/// Rates are fixed once the table is built. Self pairs and non-positive
/// rates are rejected at construction, and lookups never derive an inverse:
/// a direction that was not configured (or derived by
/// [`RateTable::with_derived_inverses`]) is simply absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateTable {
    rates: BTreeMap<CurrencyPair, Decimal>,
}

impl RateTable {
    /// Build a table from explicit directional rates.
    ///
    /// The table may be partial; use [`RateTable::ensure_complete`] to
    /// require every ordered pair.
    pub fn new(entries: impl IntoIterator<Item = (CurrencyPair, Decimal)>) -> FxResult<Self> {
        let mut rates = BTreeMap::new();

        for (pair, rate) in entries {
            Self::check_entry(&pair, rate)?;
            if rates.insert(pair, rate).is_some() {
                return Err(FxError::DuplicatePair(pair));
            }
        }

        debug!(pairs = rates.len(), "Built rate table");
        Ok(Self { rates })
    }

    /// Build a table from one rate per pair, storing `1 / rate` for the
    /// opposite direction.
    pub fn with_derived_inverses(
        canonical: impl IntoIterator<Item = (CurrencyPair, Decimal)>,
    ) -> FxResult<Self> {
        let mut rates = BTreeMap::new();

        for (pair, rate) in canonical {
            Self::check_entry(&pair, rate)?;
            let inverse = Decimal::ONE
                .checked_div(rate)
                .ok_or(FxError::NonPositiveRate { pair, rate })?;

            for (p, r) in [(pair, rate), (pair.inverse(), inverse)] {
                if rates.insert(p, r).is_some() {
                    return Err(FxError::DuplicatePair(p));
                }
            }
        }

        debug!(pairs = rates.len(), "Built rate table with derived inverses");
        Ok(Self { rates })
    }

    /// The standard wallet table.
    pub fn standard() -> Self {
        Self {
            rates: standard_rates().into_iter().collect(),
        }
    }

    /// Look up the rate for an ordered pair.
    pub fn rate(&self, pair: &CurrencyPair) -> Option<Decimal> {
        self.rates.get(pair).copied()
    }

    /// Iterate over configured pairs in a stable order.
    pub fn pairs(&self) -> impl Iterator<Item = (CurrencyPair, Decimal)> + '_ {
        self.rates.iter().map(|(pair, rate)| (*pair, *rate))
    }

    /// Number of configured directions.
    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Ordered pairs of supported currencies without a rate.
    pub fn missing_pairs(&self) -> Vec<CurrencyPair> {
        CurrencyPair::all()
            .filter(|pair| !self.rates.contains_key(pair))
            .collect()
    }

    /// Whether every ordered pair has a rate.
    pub fn is_complete(&self) -> bool {
        self.missing_pairs().is_empty()
    }

    /// Fail with [`FxError::IncompleteTable`] unless every pair has a rate.
    pub fn ensure_complete(self) -> FxResult<Self> {
        let missing = self.missing_pairs();
        if !missing.is_empty() {
            return Err(FxError::IncompleteTable { missing });
        }
        Ok(self)
    }

    /// `rate(a, b) * rate(b, a)`: exactly 1 only for algebraic inverses.
    pub fn round_trip_factor(&self, a: Currency, b: Currency) -> Option<Decimal> {
        let pair = CurrencyPair::new(a, b);
        let there = self.rate(&pair)?;
        let back = self.rate(&pair.inverse())?;
        there.checked_mul(back)
    }

    fn check_entry(pair: &CurrencyPair, rate: Decimal) -> FxResult<()> {
        if pair.is_self_pair() {
            return Err(FxError::SelfPair(*pair));
        }
        if rate <= Decimal::ZERO {
            return Err(FxError::NonPositiveRate { pair: *pair, rate });
        }
        Ok(())
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self::standard()
    }
}
