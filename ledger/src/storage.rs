//! Durable storage for ledger snapshots.
//!
//! The ledger never persists on its own. Callers save a snapshot after each
//! successful mutation and load it back when a session starts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::state::LedgerState;

/// Failures of the storage collaborator.
///
/// Kept apart from [`fxwallet_common::LedgerError`]: a storage failure
/// says nothing about whether a ledger operation was valid.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored data exists but is not a valid ledger snapshot.
    #[error("Stored ledger at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The store refused the request.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Get error code for caller-facing messages.
    pub fn error_code(&self) -> &'static str {
        "STORAGE_UNAVAILABLE"
    }

    /// Whether repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Io { .. } | StorageError::Unavailable(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for ledger snapshots.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get the store name.
    fn name(&self) -> &str;

    /// Load the saved snapshot, or `None` if nothing was saved.
    async fn load(&self) -> StorageResult<Option<LedgerState>>;

    /// Replace the saved snapshot.
    async fn save(&self, state: &LedgerState) -> StorageResult<()>;

    /// Forget the saved snapshot.
    async fn clear(&self) -> StorageResult<()>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<LedgerState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot.
    pub fn with_state(state: LedgerState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn load(&self) -> StorageResult<Option<LedgerState>> {
        Ok(self.state.lock().clone())
    }

    async fn save(&self, state: &LedgerState) -> StorageResult<()> {
        *self.state.lock() = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        *self.state.lock() = None;
        Ok(())
    }
}

/// Snapshot stored as a JSON object keyed by currency code.
///
/// Saves go to a sibling temporary file that is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot in place.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl LedgerStore for JsonFileStore {
    fn name(&self) -> &str {
        "json-file"
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> StorageResult<Option<LedgerState>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No saved ledger");
                return Ok(None);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let state = serde_json::from_str(&json).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        debug!("Loaded saved ledger");
        Ok(Some(state))
    }

    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    async fn save(&self, state: &LedgerState) -> StorageResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_vec_pretty(state).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let temp = self.temp_path();
        tokio::fs::write(&temp, json)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!("Saved ledger");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn clear(&self) -> StorageResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cleared saved ledger");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Store whose saves can be switched to fail, for testing.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_saves: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl FailingStore {
    /// Create a store that fails every save until [`FailingStore::set_failing`]
    /// is called with `false`.
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn is_failing(&self) -> bool {
        self.fail_saves.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl LedgerStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn load(&self) -> StorageResult<Option<LedgerState>> {
        self.inner.load().await
    }

    async fn save(&self, state: &LedgerState) -> StorageResult<()> {
        if self.is_failing() {
            return Err(StorageError::Unavailable("save disabled".to_string()));
        }
        self.inner.save(state).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.inner.clear().await
    }
}
