//! Domain stores.
//!
//! Each store exclusively owns one slice of remote-mirrored state, persisted
//! locally under its own storage key, and exposes commands that call the
//! gateway and reconcile results into local state. Cross-store access is
//! read-only (the auth watch handle); the server is the tie-breaker for any
//! concurrent mutations since every mutating command re-fetches the
//! authoritative snapshot.
//!
//! Propagation policy: a failing command records a user-facing message in the
//! store's `error` field, resets its loading flag, and still returns the
//! error so the UI layer can react. Nothing fails silently.

pub mod address;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod locale;
pub mod orders;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage::Storage;

/// Persist a store slice, swallowing failures with a warning.
///
/// Local persistence is a convenience cache of server state; losing a write
/// degrades to an extra fetch on next launch, never to an error.
pub(crate) fn persist_slice<T: Serialize>(storage: &dyn Storage, key: &str, slice: &T) {
    match serde_json::to_string(slice) {
        Ok(json) => {
            if let Err(err) = storage.set(key, &json) {
                warn!(key, error = %err, "failed to persist store slice");
            }
        }
        Err(err) => warn!(key, error = %err, "failed to serialize store slice"),
    }
}

/// Load a persisted store slice, treating corrupt data as absent.
pub(crate) fn load_slice<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let json = storage.get(key)?;
    match serde_json::from_str(&json) {
        Ok(slice) => Some(slice),
        Err(err) => {
            warn!(key, error = %err, "discarding corrupt persisted slice");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_slice_roundtrip() {
        let storage = MemoryStorage::new();
        persist_slice(&storage, "k", &vec![1u32, 2, 3]);
        assert_eq!(load_slice::<Vec<u32>>(&storage, "k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_corrupt_slice_is_absent() {
        let storage = MemoryStorage::new();
        storage.set("k", "not json").unwrap();
        assert_eq!(load_slice::<Vec<u32>>(&storage, "k"), None);
    }
}
