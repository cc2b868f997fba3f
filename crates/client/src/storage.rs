//! Local key-value persistence for store slices.
//!
//! Each store persists its full state slice as JSON under its own named key;
//! there is no shared schema. The [`Storage`] trait keeps the medium
//! swappable: the app uses one file per key under the platform data
//! directory, tests use an in-memory map.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Errors that can occur when persisting local state.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// No platform data directory is available.
    #[error("no data directory available on this platform")]
    NoDataDir,
}

/// Storage keys for persisted store slices.
pub mod keys {
    /// Key for the per-device session token.
    pub const SESSION_TOKEN: &str = "session_token";

    /// Key for the signed-in user record.
    pub const USER: &str = "user";

    /// Key for the cart slice.
    pub const CART: &str = "cart";

    /// Key for the address book slice.
    pub const ADDRESSES: &str = "addresses";

    /// Key for the order history slice.
    pub const ORDERS: &str = "orders";

    /// Key for language and currency selection.
    pub const LOCALE: &str = "locale";
}

/// String key-value persistence.
///
/// Writes are fallible; readers treat missing data as absent rather than an
/// error. Callers that can degrade (the session provider, store persistence)
/// swallow write failures with a warning and carry on in memory.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be written durably.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`, if any.
    fn remove(&self, key: &str);
}

/// File-backed storage: one `<key>.json` file per key under a base directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use an explicit base directory.
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Use the platform data directory (`<data_dir>/dukkan`).
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NoDataDir`] if the platform exposes no data
    /// directory.
    pub fn at_default_dir() -> Result<Self, StorageError> {
        let dir = dirs::data_dir().ok_or(StorageError::NoDataDir)?;
        Ok(Self::new(dir.join("dukkan")))
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) {
        // Missing file and failed delete both mean "nothing stored" to callers.
        let _ = fs::remove_file(self.path(key));
    }
}

/// In-memory storage for tests.
#[derive(Default)]
pub struct MemoryStorage {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}
