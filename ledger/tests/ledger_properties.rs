//! Property-based tests for the ledger engine
//!
//! Properties checked:
//! 1. Deposits change exactly one balance by exactly the deposited amount
//! 2. Invalid deposits leave the state unchanged
//! 3. Exchanges debit the amount and credit the rounded conversion
//! 4. Same-currency and overdrawn exchanges always fail without effect
//! 5. Balances never go negative under any operation sequence

use std::sync::Arc;

use fxwallet_common::{Currency, LedgerError};
use fxwallet_fx::RateTable;
use fxwallet_ledger::{LedgerEngine, LedgerState};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn currency() -> impl Strategy<Value = Currency> {
    prop::sample::select(Currency::ALL.to_vec())
}

fn distinct_pair() -> impl Strategy<Value = (Currency, Currency)> {
    (currency(), currency()).prop_filter("distinct currencies", |(a, b)| a != b)
}

/// Amount in minor units, 0.01 to 1,000,000.00
fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn state() -> impl Strategy<Value = LedgerState> {
    (0i64..100_000_000, 0i64..100_000_000, 0i64..100_000_000).prop_map(|(usd, eur, tr)| {
        LedgerState::from_balances([
            (Currency::Usd, Decimal::new(usd, 2)),
            (Currency::Eur, Decimal::new(eur, 2)),
            (Currency::Try, Decimal::new(tr, 2)),
        ])
        .unwrap()
    })
}

fn engine(state: LedgerState) -> LedgerEngine {
    LedgerEngine::with_state(state, Arc::new(RateTable::standard()))
}

#[derive(Debug, Clone)]
enum Op {
    Deposit(Currency, Decimal),
    Exchange(Currency, Currency, Decimal),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (currency(), amount()).prop_map(|(c, a)| Op::Deposit(c, a)),
        (currency(), currency(), amount()).prop_map(|(f, t, a)| Op::Exchange(f, t, a)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_deposit_changes_one_balance(start in state(), c in currency(), a in amount()) {
        let mut engine = engine(start.clone());

        let after = engine.deposit(c, a).unwrap();

        for other in Currency::ALL {
            let expected = if other == c { start.balance(other) + a } else { start.balance(other) };
            prop_assert_eq!(after.balance(other), expected);
        }
    }

    #[test]
    fn prop_non_positive_deposit_rejected(start in state(), c in currency(), cents in -100_000_000i64..=0) {
        let mut engine = engine(start.clone());

        let result = engine.deposit(c, Decimal::new(cents, 2));

        prop_assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })), "unexpected result: {:?}", result);
        prop_assert_eq!(engine.snapshot(), start);
    }

    #[test]
    fn prop_non_finite_input_rejected(c in currency(), bad in prop::sample::select(vec![f64::NAN, f64::INFINITY, f64::NEG_INFINITY])) {
        let result = fxwallet_common::amount::from_f64(bad, c);
        prop_assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })), "unexpected result: {:?}", result);
    }

    #[test]
    fn prop_exchange_moves_both_legs((from, to) in distinct_pair(), start in state(), a in amount()) {
        prop_assume!(a <= start.balance(from));
        let mut engine = engine(start.clone());
        let rate = engine.quote_rate(from, to).unwrap();

        let receipt = engine.exchange(from, to, a).unwrap();

        let credited = (a * rate).round_dp(2);
        prop_assert_eq!(receipt.rate, rate);
        prop_assert_eq!(receipt.converted.value, credited);
        prop_assert_eq!(receipt.state.balance(from), start.balance(from) - a);
        prop_assert_eq!(receipt.state.balance(to), start.balance(to) + credited);
        for other in Currency::ALL.into_iter().filter(|c| *c != from && *c != to) {
            prop_assert_eq!(receipt.state.balance(other), start.balance(other));
        }
        prop_assert_eq!(engine.snapshot(), receipt.state);
    }

    #[test]
    fn prop_same_currency_always_rejected(start in state(), c in currency(), cents in -1_000_000i64..1_000_000) {
        let mut engine = engine(start.clone());

        let result = engine.exchange(c, c, Decimal::new(cents, 2));

        prop_assert_eq!(result.unwrap_err(), LedgerError::SameCurrency(c));
        prop_assert_eq!(engine.snapshot(), start);
    }

    #[test]
    fn prop_overdraft_always_rejected((from, to) in distinct_pair(), start in state(), extra in amount()) {
        let mut engine = engine(start.clone());
        let requested = start.balance(from) + extra;

        let result = engine.exchange(from, to, requested);

        prop_assert!(matches!(result, Err(LedgerError::InsufficientBalance { .. })), "unexpected result: {:?}", result);
        prop_assert_eq!(engine.snapshot(), start);
    }

    #[test]
    fn prop_balances_never_negative(start in state(), ops in prop::collection::vec(op(), 1..50)) {
        let mut engine = engine(start);

        for op in ops {
            let _ = match op {
                Op::Deposit(c, a) => engine.deposit(c, a).map(|_| ()),
                Op::Exchange(f, t, a) => engine.exchange(f, t, a).map(|_| ()),
            };
            let snapshot = engine.snapshot();
            for c in Currency::ALL {
                prop_assert!(snapshot.balance(c) >= Decimal::ZERO);
            }
        }
    }
}

#[test]
fn round_trip_with_standard_rates_drifts() {
    let start = LedgerState::from_balances([(Currency::Eur, Decimal::new(10_000, 2))]).unwrap();
    let mut engine = engine(start);

    let there = engine
        .exchange(Currency::Eur, Currency::Try, Decimal::new(10_000, 2))
        .unwrap();
    let back = engine
        .exchange(Currency::Try, Currency::Eur, there.converted.value)
        .unwrap();

    // 100 * 32.5 = 3250, 3250 * 0.031 = 100.75
    assert_eq!(there.converted.value, Decimal::new(3250, 0));
    assert_eq!(back.converted.value, Decimal::new(10_075, 2));
    assert_eq!(engine.snapshot().balance(Currency::Eur), Decimal::new(10_075, 2));
}
