use dura_types::StorageKey;

use crate::error::StoreResult;

/// Flat byte store addressed by hierarchical keys.
///
/// This is the whole contract dura needs from a backend:
/// - `put` overwrites whatever was stored under the key.
/// - `get` returns `Ok(None)` for an absent key, never an error.
/// - Keys are validated when the [`StorageKey`] is built, so backends may
///   map them onto paths without further checks.
/// - The store performs no locking across keys. Content-addressed keys are
///   idempotent to rewrite; record keys must have a single writer at a time.
/// - All I/O errors are propagated, never silently ignored.
pub trait KeyValueStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &StorageKey, value: &[u8]) -> StoreResult<()>;

    /// Read the value stored under `key`.
    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>>;

    /// All keys strictly below `prefix`, sorted.
    fn list(&self, prefix: &StorageKey) -> StoreResult<Vec<StorageKey>>;

    /// Every key in the store, sorted.
    fn list_all(&self) -> StoreResult<Vec<StorageKey>>;

    /// Whether a value is stored under `key`.
    ///
    /// Default implementation reads the value. Backends may override with a
    /// cheaper existence check.
    fn exists(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn put(&self, key: &StorageKey, value: &[u8]) -> StoreResult<()> {
        (**self).put(key, value)
    }

    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn list(&self, prefix: &StorageKey) -> StoreResult<Vec<StorageKey>> {
        (**self).list(prefix)
    }

    fn list_all(&self) -> StoreResult<Vec<StorageKey>> {
        (**self).list_all()
    }

    fn exists(&self, key: &StorageKey) -> StoreResult<bool> {
        (**self).exists(key)
    }
}
