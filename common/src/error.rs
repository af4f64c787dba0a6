//! Error types for ledger operations.

use crate::{Currency, CurrencyPair};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by ledger validation and mutation.
///
/// Every variant is a caller-visible, recoverable condition. A ledger
/// operation that returns one of these has left the balances untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Amount is non-positive, not a number, not finite, or not
    /// representable in the currency's minor units.
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Currency code outside the supported set.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// Source and target currency of an exchange are the same.
    #[error("Cannot exchange {0} into itself")]
    SameCurrency(Currency),

    /// Requested amount exceeds the available balance.
    #[error("Insufficient {currency} balance: requested {requested}, available {available}")]
    InsufficientBalance {
        currency: Currency,
        requested: Decimal,
        available: Decimal,
    },

    /// No rate configured for the currency pair.
    #[error("No exchange rate configured for {0}")]
    MissingRate(CurrencyPair),
}

impl LedgerError {
    /// Shorthand for an [`LedgerError::InvalidAmount`] with the given reason.
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        LedgerError::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Get error code for caller-facing messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            LedgerError::UnknownCurrency(_) => "UNKNOWN_CURRENCY",
            LedgerError::SameCurrency(_) => "SAME_CURRENCY",
            LedgerError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            LedgerError::MissingRate(_) => "MISSING_RATE",
        }
    }

    /// Ledger errors are deterministic; retrying the same call cannot succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
