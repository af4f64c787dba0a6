//! Rate table error types.

use std::path::PathBuf;

use fxwallet_common::CurrencyPair;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while building or loading a rate table.
#[derive(Debug, Error)]
pub enum FxError {
    /// A currency was paired with itself.
    #[error("Rate table cannot map {0} onto itself")]
    SelfPair(CurrencyPair),

    /// Rate is zero, negative, or cannot be inverted.
    #[error("Rate {rate} for {pair} must be positive")]
    NonPositiveRate { pair: CurrencyPair, rate: Decimal },

    /// The same pair was configured twice.
    #[error("Duplicate rate for {0}")]
    DuplicatePair(CurrencyPair),

    /// Some ordered pairs have no rate.
    #[error("Rate table is missing {}", format_pairs(.missing))]
    IncompleteTable { missing: Vec<CurrencyPair> },

    /// Rate configuration could not be parsed.
    #[error("Invalid rate configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate configuration file could not be read.
    #[error("Failed to read rate configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_pairs(pairs: &[CurrencyPair]) -> String {
    pairs
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for rate table operations.
pub type FxResult<T> = Result<T, FxError>;
