//! FX Wallet Common Types
//!
//! This crate contains the types shared by the rate table and the ledger:
//! the closed currency set, monetary amounts, amount validation and the
//! ledger error taxonomy.

pub mod amount;
pub mod error;
pub mod monetary;

pub use error::*;
pub use monetary::*;
