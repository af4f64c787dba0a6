//! Simulation scenarios.

use std::path::Path;

use anyhow::Context;
use fxwallet_common::{Currency, LedgerResult};
use fxwallet_ledger::LedgerState;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scripted wallet session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Fixture balances. When absent the session restores from the store.
    #[serde(default)]
    pub initial_balances: Option<LedgerState>,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
///
/// Currencies and amounts are kept as text, the way a form submits them,
/// so that malformed input exercises the ledger's validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Add funds.
    Deposit { currency: String, amount: String },
    /// Convert between currencies.
    Exchange {
        from: String,
        to: String,
        amount: String,
    },
    /// Preview a rate, and the converted amount when one is given.
    Quote {
        from: String,
        to: String,
        #[serde(default)]
        amount: Option<String>,
    },
    /// Log current balances.
    Snapshot,
    /// Close the session, wipe saved balances and start over.
    Logout,
    /// Assert a condition.
    Assert { condition: AssertCondition },
}

/// Conditions that can be asserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AssertCondition {
    /// Balance of a currency equals an amount.
    BalanceEquals { currency: String, amount: String },
    /// The previous step failed with this code, or succeeded when `None`.
    LastErrorCode { code: Option<String> },
}

impl Scenario {
    /// Load a built-in scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "basic-flow" => Self::basic_flow(),
            "round-trip" => Ok(Self::round_trip()),
            "rejections" => Self::rejections(),
            _ => Err(anyhow::anyhow!("Unknown scenario: {}", name)),
        }
    }

    /// Load a scenario from a JSON file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing scenario {}", path.display()))
    }

    /// Deposit, exchange and overdraft against seeded balances.
    fn basic_flow() -> anyhow::Result<Self> {
        Ok(Self {
            name: "basic-flow".to_string(),
            description: "Exchange, deposit and rejected overdraft".to_string(),
            initial_balances: Some(fixture(&[
                (Currency::Usd, 1000),
                (Currency::Eur, 850),
                (Currency::Try, 27800),
            ])?),
            steps: vec![
                quote("USD", "EUR", Some("1000")),
                exchange("USD", "EUR", "1000"),
                balance_equals("USD", "0"),
                balance_equals("EUR", "1700"),
                balance_equals("TRY", "27800"),
                ScenarioStep::Logout,
                deposit("USD", "500"),
                balance_equals("USD", "500"),
                deposit("USD", "-5"),
                last_error(Some("INVALID_AMOUNT")),
                balance_equals("USD", "500"),
                deposit("EUR", "100"),
                exchange("EUR", "TRY", "150"),
                last_error(Some("INSUFFICIENT_BALANCE")),
                balance_equals("EUR", "100"),
                ScenarioStep::Snapshot,
            ],
        })
    }

    /// USD to EUR and back, showing the drift of the standard table.
    fn round_trip() -> Self {
        Self {
            name: "round-trip".to_string(),
            description: "Round trip through EUR with independently quoted rates".to_string(),
            initial_balances: Some(LedgerState::zero()),
            steps: vec![
                deposit("USD", "1000"),
                exchange("USD", "EUR", "1000"),
                balance_equals("EUR", "850"),
                exchange("EUR", "USD", "850"),
                last_error(None),
                balance_equals("USD", "1003"),
                balance_equals("EUR", "0"),
                ScenarioStep::Snapshot,
            ],
        }
    }

    /// Every kind of rejected input.
    fn rejections() -> anyhow::Result<Self> {
        Ok(Self {
            name: "rejections".to_string(),
            description: "Malformed and invalid operations leave balances untouched".to_string(),
            initial_balances: Some(fixture(&[(Currency::Usd, 100)])?),
            steps: vec![
                deposit("GBP", "10"),
                last_error(Some("UNKNOWN_CURRENCY")),
                deposit("USD", "abc"),
                last_error(Some("INVALID_AMOUNT")),
                deposit("USD", "0"),
                last_error(Some("INVALID_AMOUNT")),
                deposit("USD", "0.001"),
                last_error(Some("INVALID_AMOUNT")),
                exchange("USD", "USD", "10"),
                last_error(Some("SAME_CURRENCY")),
                exchange("USD", "EUR", "100.01"),
                last_error(Some("INSUFFICIENT_BALANCE")),
                exchange("USD", "EUR", "-1"),
                last_error(Some("INVALID_AMOUNT")),
                quote("TRY", "TRY", None),
                last_error(Some("SAME_CURRENCY")),
                balance_equals("USD", "100"),
                balance_equals("EUR", "0"),
            ],
        })
    }
}

/// Fixture balances in whole units.
fn fixture(balances: &[(Currency, i64)]) -> LedgerResult<LedgerState> {
    LedgerState::from_balances(balances.iter().map(|(c, v)| (*c, Decimal::from(*v))))
}

fn deposit(currency: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Deposit {
        currency: currency.to_string(),
        amount: amount.to_string(),
    }
}

fn exchange(from: &str, to: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Exchange {
        from: from.to_string(),
        to: to.to_string(),
        amount: amount.to_string(),
    }
}

fn quote(from: &str, to: &str, amount: Option<&str>) -> ScenarioStep {
    ScenarioStep::Quote {
        from: from.to_string(),
        to: to.to_string(),
        amount: amount.map(str::to_string),
    }
}

fn balance_equals(currency: &str, amount: &str) -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::BalanceEquals {
            currency: currency.to_string(),
            amount: amount.to_string(),
        },
    }
}

fn last_error(code: Option<&str>) -> ScenarioStep {
    ScenarioStep::Assert {
        condition: AssertCondition::LastErrorCode {
            code: code.map(str::to_string),
        },
    }
}
