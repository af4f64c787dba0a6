//! FX Wallet Ledger Engine
//!
//! Multi-currency balance ledger with deposit and exchange operations.
//! Each operation is validated up front and applied in one step, so a
//! rejected operation never leaves a partial change behind.

pub mod config;
pub mod engine;
pub mod session;
pub mod shared;
pub mod state;
pub mod storage;

pub use config::WalletConfig;
pub use engine::{ExchangeReceipt, LedgerEngine};
pub use session::{Committed, WalletSession};
pub use shared::SharedLedger;
pub use state::LedgerState;
pub use storage::{JsonFileStore, LedgerStore, MemoryStore, StorageError, StorageResult};

#[cfg(any(test, feature = "test-utils"))]
pub use storage::FailingStore;
