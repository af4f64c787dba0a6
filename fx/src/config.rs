//! Rate table configuration.

use std::path::Path;

use fxwallet_common::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{FxError, FxResult};
use crate::rates::{standard_rates, RateTable};

/// One configured direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    pub from: Currency,
    pub to: Currency,
    pub rate: Decimal,
}

impl RateEntry {
    fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(self.from, self.to)
    }
}

/// Serializable description of a [`RateTable`].
///
/// ```json
/// { "derive_inverses": false,
///   "rates": [ { "from": "USD", "to": "EUR", "rate": "0.85" }, ... ] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTableConfig {
    /// Configured rates.
    pub rates: Vec<RateEntry>,
    /// Store `1 / rate` for the opposite direction of every entry.
    pub derive_inverses: bool,
}

impl Default for RateTableConfig {
    fn default() -> Self {
        Self {
            rates: standard_rates()
                .into_iter()
                .map(|(pair, rate)| RateEntry {
                    from: pair.base,
                    to: pair.quote,
                    rate,
                })
                .collect(),
            derive_inverses: false,
        }
    }
}

impl RateTableConfig {
    /// Parse configuration from JSON text.
    pub fn from_json_str(json: &str) -> FxResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> FxResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| FxError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), entries = config.rates.len(), "Loaded rate configuration");
        Ok(config)
    }

    /// Build the table, requiring a rate for every ordered pair.
    pub fn build(&self) -> FxResult<RateTable> {
        let entries = self.rates.iter().map(|e| (e.pair(), e.rate));
        let table = if self.derive_inverses {
            RateTable::with_derived_inverses(entries)?
        } else {
            RateTable::new(entries)?
        };
        table.ensure_complete()
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        self.build().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_default_config_builds_standard_table() {
        let config = RateTableConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.build().unwrap(), RateTable::standard());
    }

    #[test]
    fn test_from_json_with_derived_inverses() {
        let config = RateTableConfig::from_json_str(
            r#"{
                "derive_inverses": true,
                "rates": [
                    { "from": "USD", "to": "EUR", "rate": "0.8" },
                    { "from": "USD", "to": "TRY", "rate": 25 },
                    { "from": "EUR", "to": "TRY", "rate": "32" }
                ]
            }"#,
        )
        .unwrap();

        let table = config.build().unwrap();
        let pair = CurrencyPair::new(Currency::Eur, Currency::Usd);
        assert_eq!(table.rate(&pair), Some(dec!(1.25)));
    }

    #[test]
    fn test_incomplete_config_rejected() {
        let config = RateTableConfig::from_json_str(
            r#"{ "rates": [ { "from": "USD", "to": "EUR", "rate": "0.85" } ] }"#,
        )
        .unwrap();

        assert!(!config.derive_inverses);
        assert!(matches!(config.build(), Err(FxError::IncompleteTable { .. })));
    }

    #[test]
    fn test_unknown_currency_in_config() {
        let result = RateTableConfig::from_json_str(
            r#"{ "rates": [ { "from": "USD", "to": "GBP", "rate": "0.79" } ] }"#,
        );
        assert!(matches!(result, Err(FxError::Parse(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&RateTableConfig::default()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = RateTableConfig::from_file(file.path()).unwrap();
        assert_eq!(config, RateTableConfig::default());

        let missing = RateTableConfig::from_file("/nonexistent/rates.json");
        assert!(matches!(missing, Err(FxError::Io { .. })));
    }
}
