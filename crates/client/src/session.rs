//! Per-device session identity.
//!
//! The backend authenticates every request with an opaque session identifier
//! sent as a cookie. The identifier is minted once per installation, persisted
//! locally, and reused forever: logging in changes what the server associates
//! with the session, not the token itself. The one exception is the auth
//! store's login path, which proactively discards a stale token before
//! re-establishing a session - it is the sole writer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use tracing::warn;

use crate::storage::{Storage, keys};

/// Provider of the per-device session token.
pub struct SessionProvider {
    storage: Arc<dyn Storage>,
    token: Mutex<Option<String>>,
}

impl SessionProvider {
    /// Create a provider backed by the given storage.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            token: Mutex::new(None),
        }
    }

    /// Return the session token, minting and persisting one if none exists.
    ///
    /// Persisted storage is always consulted before a new value is generated.
    /// A failed persist is swallowed with a warning: the in-memory value
    /// serves the rest of the process and a fresh token is minted next launch.
    pub fn get_or_create_token(&self) -> String {
        let mut slot = self.token.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(token) = slot.as_ref() {
            return token.clone();
        }

        if let Some(token) = self.storage.get(keys::SESSION_TOKEN) {
            *slot = Some(token.clone());
            return token;
        }

        let token = generate_token();
        if let Err(err) = self.storage.set(keys::SESSION_TOKEN, &token) {
            warn!(error = %err, "failed to persist session token; using it in memory only");
        }
        *slot = Some(token.clone());
        token
    }

    /// Discard the current token, in memory and on disk.
    ///
    /// The next [`get_or_create_token`](Self::get_or_create_token) call mints
    /// a fresh identity.
    pub fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.storage.remove(keys::SESSION_TOKEN);
    }
}

/// Generate a random session token.
///
/// Primary source is OS entropy; if that is unavailable the token degrades to
/// a time-seeded PRNG rather than failing (a weaker token still identifies
/// the device).
fn generate_token() -> String {
    let mut bytes = [0u8; 16];

    if OsRng.try_fill_bytes(&mut bytes).is_err() {
        warn!("OS entropy source unavailable; falling back to time-seeded PRNG");
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs().wrapping_mul(1_000_000_000).wrapping_add(u64::from(d.subsec_nanos())));
        StdRng::seed_from_u64(seed).fill_bytes(&mut bytes);
    }

    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageError};
    use uuid::Uuid;

    #[test]
    fn test_fresh_environment_creation_is_idempotent() {
        let provider = SessionProvider::new(Arc::new(MemoryStorage::new()));

        let first = provider.get_or_create_token();
        let second = provider.get_or_create_token();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_survives_new_provider_instance() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());

        let first = SessionProvider::new(Arc::clone(&storage)).get_or_create_token();
        let second = SessionProvider::new(storage).get_or_create_token();

        assert_eq!(first, second);
    }

    #[test]
    fn test_clear_mints_a_new_token() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = SessionProvider::new(storage);

        let first = provider.get_or_create_token();
        provider.clear();
        let second = provider.get_or_create_token();

        assert_ne!(first, second);
    }

    #[test]
    fn test_token_is_uuid_shaped() {
        let provider = SessionProvider::new(Arc::new(MemoryStorage::new()));
        let token = provider.get_or_create_token();
        assert!(Uuid::parse_str(&token).is_ok());
    }

    /// Storage that refuses every write.
    struct BrokenStorage;

    impl Storage for BrokenStorage {
        fn get(&self, _key: &str) -> Option<String> {
            None
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::NoDataDir)
        }

        fn remove(&self, _key: &str) {}
    }

    #[test]
    fn test_persist_failure_degrades_to_memory() {
        let provider = SessionProvider::new(Arc::new(BrokenStorage));

        let first = provider.get_or_create_token();
        let second = provider.get_or_create_token();

        // Token is stable for the life of the process despite the failed write.
        assert_eq!(first, second);
    }
}
