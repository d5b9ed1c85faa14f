use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};

use dura_types::StorageKey;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

type Entries = RwLock<BTreeMap<StorageKey, Vec<u8>>>;

static NEXT_ANONYMOUS: AtomicU64 = AtomicU64::new(0);

/// Live stores by name. Entries drop out once every handle is gone.
fn live_stores() -> &'static Mutex<HashMap<String, Weak<Entries>>> {
    static LIVE: OnceLock<Mutex<HashMap<String, Weak<Entries>>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// In-memory, `BTreeMap`-based key-value store.
///
/// Intended for tests and embedding. Values live behind a `RwLock` for safe
/// concurrent access and are cloned on read/write. Listing is naturally
/// ordered because keys compare segment by segment.
///
/// Every store has a name. Opening a name that is still live in this
/// process returns a handle onto the same entries, which is how a described
/// store is found again after reconstruction.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    name: String,
    entries: Arc<Entries>,
}

impl InMemoryKeyValueStore {
    /// Create a new empty store with a generated name.
    pub fn new() -> Self {
        let n = NEXT_ANONYMOUS.fetch_add(1, Ordering::Relaxed);
        Self::named(format!("memory-{}-{n}", std::process::id()))
    }

    /// Open the live store called `name`, or create it empty.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut live = live_stores()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = live.get(&name).and_then(Weak::upgrade) {
            return Self { name, entries };
        }
        live.retain(|_, entries| entries.strong_count() > 0);
        let entries = Arc::new(RwLock::new(BTreeMap::new()));
        live.insert(name.clone(), Arc::downgrade(&entries));
        Self { name, entries }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored values.
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|v| v.len() as u64)
            .sum()
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn put(&self, key: &StorageKey, value: &[u8]) -> StoreResult<()> {
        let mut map = self
            .entries
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        map.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(map.get(key).cloned())
    }

    fn list(&self, prefix: &StorageKey) -> StoreResult<Vec<StorageKey>> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(map
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, _)| k.len() > prefix.len())
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn list_all(&self) -> StoreResult<Vec<StorageKey>> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(map.keys().cloned().collect())
    }

    fn exists(&self, key: &StorageKey) -> StoreResult<bool> {
        let map = self
            .entries
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryKeyValueStore")
            .field("name", &self.name)
            .field("entry_count", &self.len())
            .finish()
    }
}
