//! FX Wallet Rate Table
//!
//! Static exchange rates and the conversion rule used by the ledger.
//!
//! # Features
//!
//! - Directional rate table covering every ordered currency pair
//! - Optional inverse derivation at construction time (never at lookup)
//! - JSON configuration with a built-in default table
//! - Single-rounding conversion to the target currency's minor units
//!
//! # Example
//!
//! ```rust,ignore
//! use fxwallet_fx::{Conversion, RateTable};
//! use fxwallet_common::{Currency, CurrencyPair, Money};
//!
//! let table = RateTable::standard();
//! let rate = table.rate(&CurrencyPair::new(Currency::Usd, Currency::Eur)).unwrap();
//! let eur = Conversion::compute(Money::new(dec!(1000), Currency::Usd), Currency::Eur, rate)?;
//! ```

pub mod config;
pub mod conversion;
pub mod error;
pub mod rates;

pub use config::{RateEntry, RateTableConfig};
pub use conversion::Conversion;
pub use error::{FxError, FxResult};
pub use rates::{standard_rates, RateTable};
