//! Currency conversion arithmetic.

use fxwallet_common::{Currency, CurrencyPair, LedgerError, LedgerResult, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of converting an amount at a fixed rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversion {
    /// Amount sold.
    pub input: Money,
    /// Amount bought, rounded to the target currency's minor units.
    pub output: Money,
    /// Rate applied.
    pub rate: Decimal,
}

impl Conversion {
    /// Convert `input` into `target` at `rate`.
    ///
    /// The product is rounded once, to the target's minor units, with
    /// banker's rounding. A product below half a minor unit credits 0.00.
    pub fn compute(input: Money, target: Currency, rate: Decimal) -> LedgerResult<Self> {
        let raw = input.value.checked_mul(rate).ok_or_else(|| {
            LedgerError::invalid_amount(format!("{} at rate {} overflows", input, rate))
        })?;

        let output = Money::new(raw, target).round();

        Ok(Self {
            input,
            output,
            rate,
        })
    }

    /// Get the currency pair.
    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.input.currency, self.output.currency)
    }

    /// Rate actually realised after rounding.
    pub fn effective_rate(&self) -> Decimal {
        if self.input.value.is_zero() {
            return Decimal::ZERO;
        }
        self.output.value / self.input.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compute_exact() {
        let conversion =
            Conversion::compute(Money::new(dec!(1000), Currency::Usd), Currency::Eur, dec!(0.85))
                .unwrap();

        assert_eq!(conversion.output, Money::new(dec!(850), Currency::Eur));
        assert_eq!(conversion.pair(), CurrencyPair::new(Currency::Usd, Currency::Eur));
        assert_eq!(conversion.effective_rate(), dec!(0.85));
    }

    #[test]
    fn test_compute_rounds_once() {
        // 33.33 * 0.036 = 1.19988
        let conversion =
            Conversion::compute(Money::new(dec!(33.33), Currency::Try), Currency::Usd, dec!(0.036))
                .unwrap();
        assert_eq!(conversion.output.value, dec!(1.20));

        // midpoint rounds to even: 0.125 -> 0.12
        let conversion =
            Conversion::compute(Money::new(dec!(0.25), Currency::Usd), Currency::Eur, dec!(0.5))
                .unwrap();
        assert_eq!(conversion.output.value, dec!(0.12));
    }

    #[test]
    fn test_compute_sub_minor_unit_credits_zero() {
        // 0.10 * 0.031 = 0.0031
        let conversion =
            Conversion::compute(Money::new(dec!(0.10), Currency::Try), Currency::Eur, dec!(0.031))
                .unwrap();

        assert_eq!(conversion.output, Money::zero(Currency::Eur));
        assert_eq!(conversion.effective_rate(), dec!(0));
    }

    proptest! {
        #[test]
        fn prop_output_has_minor_unit_precision(cents in 1i64..1_000_000_000, rate_milli in 1i64..100_000) {
            let input = Money::new(Decimal::new(cents, 2), Currency::Eur);
            let rate = Decimal::new(rate_milli, 3);

            let conversion = Conversion::compute(input, Currency::Try, rate).unwrap();
            prop_assert!(conversion.output.value.normalize().scale() <= 2);
            prop_assert_eq!(conversion.output.value, (input.value * rate).round_dp(2));
        }
    }
}
