//! Persistence
//!
//! A string key-value store plus a typed adapter that reads and writes JSON
//! snapshots under the fixed storefront keys.

use mockall::automock;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing file could not be read or written.
    #[error("failed to access store file: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for the given key.
    #[error("failed to serialize value for {key}")]
    Serialize {
        /// Storage key being written
        key: &'static str,

        /// Underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// The store refused the write (for example, a full quota).
    #[error("store rejected write for {0}")]
    Rejected(String),
}

/// Fixed keys under which storefront snapshots are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    /// Cart ledger snapshot
    Cart,

    /// Weekly budget amount
    WeeklyBudget,

    /// Instant of the last budget reset
    LastReset,

    /// Environmental impact totals
    ImpactTotals,

    /// Favorites snapshot
    Favorites,
}

impl StorageKey {
    /// All keys, in a stable order.
    pub const ALL: [StorageKey; 5] = [
        StorageKey::Cart,
        StorageKey::WeeklyBudget,
        StorageKey::LastReset,
        StorageKey::ImpactTotals,
        StorageKey::Favorites,
    ];

    /// The raw key string used in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StorageKey::Cart => "greenerCart",
            StorageKey::WeeklyBudget => "weeklyBudget",
            StorageKey::LastReset => "lastReset",
            StorageKey::ImpactTotals => "impactTotals",
            StorageKey::Favorites => "favoriteItems",
        }
    }
}

/// A string key-value store.
#[automock]
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove the value stored under `key`. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be written.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Typed JSON adapter over a [`KeyValueStore`].
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wrap a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load and decode the snapshot stored under `key`.
    ///
    /// A missing, unreadable or malformed snapshot is reported as `None` so
    /// callers fall back to their defaults.
    pub fn load<T: DeserializeOwned>(&self, key: StorageKey) -> Option<T> {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(source) => {
                warn!(key = key.as_str(), "failed to read snapshot: {source}");

                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                warn!(key = key.as_str(), "ignoring malformed snapshot: {source}");

                None
            }
        }
    }

    /// Encode and write `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if encoding or the write fails.
    pub fn save<T: Serialize + ?Sized>(
        &mut self,
        key: StorageKey,
        value: &T,
    ) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.as_str(),
            source,
        })?;

        self.store.set(key.as_str(), raw)?;

        debug!(key = key.as_str(), "snapshot written");

        Ok(())
    }

    /// Remove the snapshot stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the removal fails.
    pub fn clear(&mut self, key: StorageKey) -> Result<(), StoreError> {
        self.store.remove(key.as_str())?;

        debug!(key = key.as_str(), "snapshot removed");

        Ok(())
    }

    /// Borrow the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Unwrap the underlying store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn keys_are_distinct() {
        let mut keys: Vec<&str> = StorageKey::ALL.iter().map(|key| key.as_str()).collect();

        keys.sort_unstable();
        keys.dedup();

        assert_eq!(keys.len(), StorageKey::ALL.len());
    }

    #[test]
    fn save_then_load_returns_value() -> TestResult {
        let mut persistence = Persistence::new(MemoryStore::default());

        persistence.save(StorageKey::Favorites, &vec!["a", "b"])?;

        let loaded: Option<Vec<String>> = persistence.load(StorageKey::Favorites);

        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));

        Ok(())
    }

    #[test]
    fn load_missing_key_is_none() {
        let persistence = Persistence::new(MemoryStore::default());

        let loaded: Option<Vec<String>> = persistence.load(StorageKey::Cart);

        assert!(loaded.is_none());
    }

    #[test]
    fn load_malformed_snapshot_is_none() -> TestResult {
        let mut store = MemoryStore::default();
        store.set(StorageKey::Cart.as_str(), "{not json".to_string())?;

        let persistence = Persistence::new(store);
        let loaded: Option<Vec<String>> = persistence.load(StorageKey::Cart);

        assert!(loaded.is_none());

        Ok(())
    }

    #[test]
    fn load_read_failure_is_none() {
        let mut store = MockKeyValueStore::new();

        store
            .expect_get()
            .times(1)
            .returning(|_| Err(StoreError::Rejected("unavailable".to_string())));

        let persistence = Persistence::new(store);
        let loaded: Option<u32> = persistence.load(StorageKey::ImpactTotals);

        assert!(loaded.is_none());
    }

    #[test]
    fn save_propagates_write_failure() {
        let mut store = MockKeyValueStore::new();

        store
            .expect_set()
            .returning(|key, _| Err(StoreError::Rejected(key.to_string())));

        let mut persistence = Persistence::new(store);
        let result = persistence.save(StorageKey::WeeklyBudget, &100);

        assert!(
            matches!(result, Err(StoreError::Rejected(ref key)) if key == "weeklyBudget"),
            "expected Rejected, got {result:?}"
        );
    }

    #[test]
    fn clear_removes_value() -> TestResult {
        let mut persistence = Persistence::new(MemoryStore::default());

        persistence.save(StorageKey::ImpactTotals, &1)?;
        persistence.clear(StorageKey::ImpactTotals)?;

        assert!(persistence.store().get("impactTotals")?.is_none());

        Ok(())
    }
}
