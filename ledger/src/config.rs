//! Wallet configuration.

use std::path::PathBuf;
use std::sync::Arc;

use fxwallet_fx::{FxResult, RateTable, RateTableConfig};

/// Main wallet configuration.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Where the balance snapshot is stored.
    pub store_path: PathBuf,
    /// Optional JSON rate table; the standard table is used when unset.
    pub rates_path: Option<PathBuf>,
    /// Log level.
    pub log_level: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("fxwallet-balances.json"),
            rates_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl WalletConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("FXWALLET_STORE_PATH") {
            config.store_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("FXWALLET_RATES_PATH") {
            if !path.is_empty() {
                config.rates_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.store_path.as_os_str().is_empty() {
            return Err("Store path cannot be empty".to_string());
        }

        if self.store_path.file_name().is_none() {
            return Err(format!(
                "Store path {} does not name a file",
                self.store_path.display()
            ));
        }

        if self.log_level.is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }

    /// Build the rate table this configuration points at.
    pub fn rate_table(&self) -> FxResult<Arc<RateTable>> {
        let config = match &self.rates_path {
            Some(path) => RateTableConfig::from_file(path)?,
            None => RateTableConfig::default(),
        };
        Ok(Arc::new(config.build()?))
    }
}
