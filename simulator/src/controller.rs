//! Simulation controller.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use fxwallet_common::{amount, Currency, LedgerResult};
use fxwallet_fx::RateTable;
use fxwallet_ledger::{LedgerState, LedgerStore, WalletSession};

use crate::metrics::SimulationMetrics;
use crate::scenario::{AssertCondition, Scenario, ScenarioStep};

/// Deposit amounts offered as one-tap choices.
const QUICK_AMOUNTS: [i64; 4] = [100, 500, 1000, 5000];

/// Drives a wallet session through scripted or random operations.
pub struct SimulationController {
    store: Arc<dyn LedgerStore>,
    rates: Arc<RateTable>,
    /// `None` only while a logout is in progress.
    session: Option<WalletSession>,
    rng: StdRng,
    metrics: SimulationMetrics,
    /// Code of the last rejected step, cleared by each successful one.
    last_error: Option<&'static str>,
}

impl SimulationController {
    /// Create a controller. No session is open until [`Self::initialize`].
    pub fn new(store: Arc<dyn LedgerStore>, rates: Arc<RateTable>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            store,
            rates,
            session: None,
            rng,
            metrics: SimulationMetrics::new(),
            last_error: None,
        }
    }

    /// Open the session, from fixture balances when given, else from the store.
    pub async fn initialize(&mut self, initial: Option<LedgerState>) -> anyhow::Result<()> {
        let session = match initial {
            Some(state) => {
                info!("Starting from fixture balances");
                WalletSession::with_state(self.store.clone(), state, self.rates.clone())
            }
            None => WalletSession::open(self.store.clone(), self.rates.clone())
                .await
                .with_context(|| format!("opening {} store", self.store.name()))?,
        };

        log_balances(&session.snapshot());
        self.session = Some(session);
        Ok(())
    }

    /// Run a scenario. Fails on the first assertion that does not hold.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!("Running scenario: {} - {}", scenario.name, scenario.description);

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .await
                .with_context(|| format!("step {} of scenario {}", index + 1, scenario.name))?;
        }

        Ok(())
    }

    /// Run `operations` random deposits and exchanges.
    pub async fn run_random(&mut self, operations: usize) -> anyhow::Result<()> {
        info!("Running {} random operations", operations);

        for _ in 0..operations {
            let step = self.random_step()?;
            debug!(?step, "Generated step");
            self.execute_step(&step).await?;
        }

        Ok(())
    }

    /// Current balances.
    pub fn snapshot(&self) -> anyhow::Result<LedgerState> {
        Ok(self.session()?.snapshot())
    }

    /// Retry persisting the current balances.
    pub async fn save(&self) -> anyhow::Result<()> {
        self.session()?
            .save()
            .await
            .context("saving balances")
    }

    /// Get simulation metrics.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    async fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Deposit { currency, amount } => {
                let result = self.deposit(currency, amount).await?;
                self.record_mutation(result);
            }
            ScenarioStep::Exchange { from, to, amount } => {
                let result = self.exchange(from, to, amount).await?;
                self.record_mutation(result);
            }
            ScenarioStep::Quote { from, to, amount } => {
                let result = quote(self.session()?, from, to, amount.as_deref());
                self.metrics.record_quote();
                self.last_error = result.err().map(|e| e.error_code());
            }
            ScenarioStep::Snapshot => {
                log_balances(&self.session()?.snapshot());
            }
            ScenarioStep::Logout => {
                self.logout().await?;
                self.last_error = None;
            }
            ScenarioStep::Assert { condition } => {
                self.check(condition)?;
            }
        }

        Ok(())
    }

    /// Outer error: the simulation cannot continue. Inner: the ledger rejected the input.
    async fn deposit(
        &self,
        currency: &str,
        amount: &str,
    ) -> anyhow::Result<LedgerResult<bool>> {
        let session = self.session()?;
        let parsed = Currency::from_str(currency)
            .and_then(|c| amount::parse(amount, c).map(|a| (c, a)));

        let (currency, amount) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => return Ok(Err(e)),
        };

        Ok(session.deposit(currency, amount).await.map(|committed| {
            info!(
                "Deposited {} {}, balance now {}",
                amount,
                currency,
                committed.value.money(currency).formatted()
            );
            committed.is_saved()
        }))
    }

    async fn exchange(
        &self,
        from: &str,
        to: &str,
        amount: &str,
    ) -> anyhow::Result<LedgerResult<bool>> {
        let session = self.session()?;
        let parsed = Currency::from_str(from).and_then(|f| {
            let t = Currency::from_str(to)?;
            Ok((f, t, amount::parse(amount, f)?))
        });

        let (from, to, amount) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => return Ok(Err(e)),
        };

        Ok(session.exchange(from, to, amount).await.map(|committed| {
            let receipt = &committed.value;
            info!(
                receipt = %receipt.id,
                "Exchanged {} for {} at {}",
                receipt.debited.formatted(),
                receipt.converted.formatted(),
                receipt.rate
            );
            committed.is_saved()
        }))
    }

    async fn logout(&mut self) -> anyhow::Result<()> {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close_and_clear().await {
                // the store still holds the old balances, reopening restores them
                warn!(error = %e, code = e.error_code(), "Failed to clear saved balances");
            }
        }

        info!("Logged out");
        self.initialize(None).await
    }

    fn record_mutation(&mut self, result: LedgerResult<bool>) {
        match result {
            Ok(saved) => {
                self.metrics.record_committed(saved);
                self.last_error = None;
            }
            Err(e) => {
                warn!(code = e.error_code(), "Rejected: {}", e);
                self.metrics.record_rejected(e.error_code());
                self.last_error = Some(e.error_code());
            }
        }
    }

    fn check(&self, condition: &AssertCondition) -> anyhow::Result<()> {
        match condition {
            AssertCondition::BalanceEquals { currency, amount } => {
                let currency = Currency::from_str(currency)?;
                let expected = Decimal::from_str(amount.trim())
                    .with_context(|| format!("invalid expected amount {:?}", amount))?;
                let actual = self.session()?.snapshot().balance(currency);

                if actual != expected {
                    bail!(
                        "expected {} balance {}, found {}",
                        currency,
                        expected,
                        actual
                    );
                }
            }
            AssertCondition::LastErrorCode { code } => {
                if code.as_deref() != self.last_error {
                    bail!(
                        "expected last error {:?}, found {:?}",
                        code,
                        self.last_error
                    );
                }
            }
        }

        debug!(?condition, "Assertion held");
        Ok(())
    }

    /// Deposit a quick amount, or exchange a share of a balance that now and
    /// then overshoots it.
    fn random_step(&mut self) -> anyhow::Result<ScenarioStep> {
        let from = Currency::ALL[self.rng.gen_range(0..Currency::ALL.len())];

        if self.rng.gen_bool(0.4) {
            let amount = QUICK_AMOUNTS[self.rng.gen_range(0..QUICK_AMOUNTS.len())];
            return Ok(ScenarioStep::Deposit {
                currency: from.code().to_string(),
                amount: amount.to_string(),
            });
        }

        let to = Currency::ALL[self.rng.gen_range(0..Currency::ALL.len())];
        let balance = self.session()?.snapshot().balance(from);
        let percent = Decimal::from(self.rng.gen_range(1i64..=110));
        let amount = (balance * percent / Decimal::ONE_HUNDRED).round_dp(from.decimal_places());

        Ok(ScenarioStep::Exchange {
            from: from.code().to_string(),
            to: to.code().to_string(),
            amount: amount.to_string(),
        })
    }

    fn session(&self) -> anyhow::Result<&WalletSession> {
        self.session
            .as_ref()
            .context("no open wallet session")
    }
}

fn quote(session: &WalletSession, from: &str, to: &str, amount: Option<&str>) -> LedgerResult<()> {
    let from = Currency::from_str(from)?;
    let to = Currency::from_str(to)?;

    let rate = session.quote_rate(from, to)?;
    info!("1 {} = {} {}", from, rate, to);

    if let Some(amount) = amount {
        let amount = amount::parse(amount, from)?;
        let converted = session.quote(from, to, amount)?;
        info!("{} {} would convert to {}", amount, from, converted.formatted());
    }

    Ok(())
}

fn log_balances(state: &LedgerState) {
    for (currency, _) in state.iter() {
        info!("{}: {}", currency, state.money(currency).formatted());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxwallet_ledger::{FailingStore, JsonFileStore, MemoryStore};
    use rust_decimal_macros::dec;

    fn controller(store: Arc<dyn LedgerStore>) -> SimulationController {
        SimulationController::new(store, Arc::new(RateTable::standard()), Some(7))
    }

    #[tokio::test]
    async fn test_builtin_scenarios_pass() {
        for name in ["basic-flow", "round-trip", "rejections"] {
            let scenario = Scenario::load(name).unwrap();
            let mut controller = controller(Arc::new(MemoryStore::new()));
            controller
                .initialize(scenario.initial_balances.clone())
                .await
                .unwrap();

            controller.run_scenario(&scenario).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_rejections_are_counted_by_code() {
        let scenario = Scenario::load("rejections").unwrap();
        let mut controller = controller(Arc::new(MemoryStore::new()));
        controller
            .initialize(scenario.initial_balances.clone())
            .await
            .unwrap();

        controller.run_scenario(&scenario).await.unwrap();

        let metrics = controller.metrics();
        assert_eq!(metrics.committed_operations, 0);
        assert_eq!(metrics.rejected_by_code["INVALID_AMOUNT"], 4);
        assert_eq!(metrics.rejected_by_code["UNKNOWN_CURRENCY"], 1);
        assert_eq!(metrics.rejected_by_code["SAME_CURRENCY"], 1);
        assert_eq!(metrics.rejected_by_code["INSUFFICIENT_BALANCE"], 1);
    }

    #[tokio::test]
    async fn test_failed_assertion_stops_run() {
        let scenario: Scenario = serde_json::from_str(
            r#"{
                "name": "wrong",
                "steps": [
                    { "Deposit": { "currency": "USD", "amount": "10" } },
                    { "Assert": { "condition": { "BalanceEquals": { "currency": "USD", "amount": "11" } } } }
                ]
            }"#,
        )
        .unwrap();
        let mut controller = controller(Arc::new(MemoryStore::new()));
        controller.initialize(None).await.unwrap();

        let err = controller.run_scenario(&scenario).await.unwrap_err();

        assert!(format!("{:#}", err).contains("expected USD balance 11, found 10.00"));
    }

    #[tokio::test]
    async fn test_logout_wipes_store() {
        let store = Arc::new(MemoryStore::new());
        let mut controller = controller(store.clone());
        controller.initialize(None).await.unwrap();

        controller
            .execute_step(&ScenarioStep::Deposit {
                currency: "eur".to_string(),
                amount: "250.50".to_string(),
            })
            .await
            .unwrap();
        assert!(store.load().await.unwrap().is_some());

        controller.execute_step(&ScenarioStep::Logout).await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(controller.snapshot().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_is_counted_and_retried() {
        let store = Arc::new(FailingStore::failing());
        let mut controller = controller(store.clone());
        controller.initialize(None).await.unwrap();

        controller
            .execute_step(&ScenarioStep::Deposit {
                currency: "TRY".to_string(),
                amount: "100".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(controller.metrics().committed_operations, 1);
        assert_eq!(controller.metrics().failed_saves, 1);
        assert_eq!(controller.snapshot().unwrap().balance(Currency::Try), dec!(100));

        store.set_failing(false);
        controller.save().await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(controller.snapshot().unwrap()));
    }

    #[tokio::test]
    async fn test_balances_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("balances.json");

        let mut first = controller(Arc::new(JsonFileStore::new(&path)));
        first.initialize(None).await.unwrap();
        first
            .execute_step(&ScenarioStep::Deposit {
                currency: "USD".to_string(),
                amount: "1000".to_string(),
            })
            .await
            .unwrap();
        first
            .execute_step(&ScenarioStep::Exchange {
                from: "USD".to_string(),
                to: "TRY".to_string(),
                amount: "200".to_string(),
            })
            .await
            .unwrap();
        drop(first);

        let mut second = controller(Arc::new(JsonFileStore::new(&path)));
        second.initialize(None).await.unwrap();

        let state = second.snapshot().unwrap();
        assert_eq!(state.balance(Currency::Usd), dec!(800));
        assert_eq!(state.balance(Currency::Try), dec!(5500));
    }

    #[tokio::test]
    async fn test_random_run_keeps_balances_non_negative() {
        let mut controller = controller(Arc::new(MemoryStore::new()));
        controller.initialize(None).await.unwrap();

        controller.run_random(200).await.unwrap();

        let metrics = controller.metrics();
        assert_eq!(metrics.total_operations, 200);
        for (_, balance) in controller.snapshot().unwrap().iter() {
            assert!(balance >= Decimal::ZERO);
        }
    }
}
