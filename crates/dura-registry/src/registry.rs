use std::thread;

use dura_metadata::{Durability, Durable, Metadata, MetadataError};
use dura_store::KeyValueStore;
use dura_types::{ContentHash, StorageKey};
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, RegistryResult};
use crate::settings::{describe_settings, RegistrySettings};

/// Outcome of persisting one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReport {
    /// Store key the record bytes were written to.
    pub record_key: StorageKey,
    /// Blobs written to the content namespace by this commit.
    pub uploaded: Vec<ContentHash>,
    /// Referenced blobs that were already present.
    pub skipped: Vec<ContentHash>,
}

/// Persists durables into a [`KeyValueStore`].
///
/// Records live under `<record_namespace>/<id...>`, blobs under
/// `<content_namespace>/<hex hash>`. A record is written only after every
/// blob it references is in the store, and blobs already present are never
/// written again.
pub struct DurableRegistry<S: KeyValueStore> {
    store: S,
    durability: Durability,
    config: RegistryConfig,
    records: StorageKey,
    content: StorageKey,
}

impl<S: KeyValueStore> DurableRegistry<S> {
    /// Registry with default settings.
    pub fn new(store: S, durability: Durability) -> RegistryResult<Self> {
        Self::with_config(store, durability, RegistryConfig::default())
    }

    pub fn with_config(
        store: S,
        durability: Durability,
        config: RegistryConfig,
    ) -> RegistryResult<Self> {
        config.validate()?;
        let records = config.record_root()?;
        let content = config.content_root()?;
        Ok(Self {
            store,
            durability,
            config,
            records,
            content,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn durability(&self) -> &Durability {
        &self.durability
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Make records of `T` retrievable.
    pub fn register<T: Durable>(&self) -> bool {
        self.durability.register::<T>()
    }

    /// Store key of the record with identifier `id`.
    pub fn record_key(&self, id: &StorageKey) -> StorageKey {
        self.records.join(id)
    }

    /// Store key of the blob with address `hash`.
    pub fn content_key(&self, hash: &ContentHash) -> RegistryResult<StorageKey> {
        Ok(self.content.child(hash.to_hex())?)
    }

    /// Describe `value` and commit it under `id`.
    pub fn put<T: Durable>(&self, id: &StorageKey, value: &T) -> RegistryResult<CommitReport> {
        let metadata = self.durability.describe(value)?;
        self.commit(id, &metadata)
    }

    /// Commit an already described record under `id`.
    ///
    /// Fails without writing the record if any referenced blob cannot be
    /// written; every failed blob is reported in
    /// [`RegistryError::BlobUpload`].
    pub fn commit(&self, id: &StorageKey, metadata: &Metadata) -> RegistryResult<CommitReport> {
        let hashes: Vec<ContentHash> = metadata.hashes().into_iter().collect();
        let (uploaded, skipped) = self.upload_blobs(&hashes)?;

        let record_key = self.record_key(id);
        self.store.put(&record_key, &metadata.to_bytes())?;
        info!(
            key = %record_key,
            builder_id = metadata.builder_id(),
            uploaded = uploaded.len(),
            skipped = skipped.len(),
            "committed record"
        );
        Ok(CommitReport {
            record_key,
            uploaded,
            skipped,
        })
    }

    /// Read and decode the record under `id`. Binary content is not fetched.
    pub fn get_metadata(&self, id: &StorageKey) -> RegistryResult<Option<Metadata>> {
        match self.store.get(&self.record_key(id))? {
            Some(bytes) => Ok(Some(self.durability.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Reconstruct the durable stored under `id`.
    ///
    /// Referenced blobs are pulled from the content namespace into the
    /// staging area first. A blob missing from both surfaces as
    /// [`MetadataError::MissingContent`].
    pub fn get<T: Durable>(&self, id: &StorageKey) -> RegistryResult<Option<T>> {
        let Some(metadata) = self.get_metadata(id)? else {
            return Ok(None);
        };
        self.fetch_blobs(&metadata)?;
        Ok(Some(metadata.durable::<T>()?))
    }

    /// Whether a record is stored under `id`.
    pub fn contains(&self, id: &StorageKey) -> RegistryResult<bool> {
        Ok(self.store.exists(&self.record_key(id))?)
    }

    /// Identifiers of all stored records, sorted.
    pub fn list(&self) -> RegistryResult<Vec<StorageKey>> {
        Ok(self
            .store
            .list(&self.records)?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&self.records))
            .collect())
    }

    fn upload_blobs(
        &self,
        hashes: &[ContentHash],
    ) -> RegistryResult<(Vec<ContentHash>, Vec<ContentHash>)> {
        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        let mut failures = Vec::new();

        for batch in hashes.chunks(self.config.upload_parallelism) {
            let outcomes: Vec<(ContentHash, Result<bool, String>)> = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|hash| (*hash, scope.spawn(move || self.upload_blob(hash))))
                    .collect();
                handles
                    .into_iter()
                    .map(|(hash, handle)| {
                        let outcome = match handle.join() {
                            Ok(result) => result.map_err(|e| e.to_string()),
                            Err(_) => Err("upload thread panicked".to_string()),
                        };
                        (hash, outcome)
                    })
                    .collect()
            });

            for (hash, outcome) in outcomes {
                match outcome {
                    Ok(true) => uploaded.push(hash),
                    Ok(false) => skipped.push(hash),
                    Err(reason) => {
                        warn!(hash = %hash, error = %reason, "blob upload failed");
                        failures.push((hash, reason));
                    }
                }
            }
        }

        if !failures.is_empty() {
            return Err(RegistryError::BlobUpload { failures });
        }
        Ok((uploaded, skipped))
    }

    /// Returns `false` if the blob was already in the store.
    fn upload_blob(&self, hash: &ContentHash) -> RegistryResult<bool> {
        let key = self.content_key(hash)?;
        if self.store.exists(&key)? {
            debug!(hash = %hash, "blob already stored");
            return Ok(false);
        }
        let bytes = self
            .durability
            .staging()
            .read(hash)
            .map_err(MetadataError::from)?
            .ok_or(MetadataError::MissingContent(*hash))?;
        self.store.put(&key, &bytes)?;
        debug!(hash = %hash, bytes = bytes.len(), "uploaded blob");
        Ok(true)
    }

    fn fetch_blobs(&self, metadata: &Metadata) -> RegistryResult<()> {
        let staging = self.durability.staging();
        for hash in metadata.hashes() {
            if staging.contains(&hash) {
                continue;
            }
            match self.store.get(&self.content_key(&hash)?)? {
                Some(bytes) => {
                    staging
                        .materialize(&hash, &bytes)
                        .map_err(MetadataError::from)?;
                    debug!(hash = %hash, bytes = bytes.len(), "fetched blob");
                }
                None => warn!(hash = %hash, "referenced blob missing from content store"),
            }
        }
        Ok(())
    }
}

impl<S: KeyValueStore + Durable> DurableRegistry<S> {
    /// Describe this registry's store and settings as a record.
    pub fn describe(&self) -> RegistryResult<Metadata> {
        let metadata = self.durability.metadata_for::<RegistrySettings<S>>();
        Ok(describe_settings(&self.store, &self.config, metadata)?)
    }

    /// Open the registry a [`describe`](Self::describe) record points at.
    ///
    /// Registers the builders of `S` and [`RegistrySettings<S>`] with
    /// `durability` first.
    pub fn restore(bytes: &[u8], durability: Durability) -> RegistryResult<Self> {
        durability.register::<S>();
        durability.register::<RegistrySettings<S>>();
        let settings: RegistrySettings<S> = durability.reconstruct(bytes)?;
        info!(
            record_namespace = %settings.config.record_namespace,
            content_namespace = %settings.config.content_namespace,
            "restored registry"
        );
        Self::with_config(settings.store, durability, settings.config)
    }
}

impl<S: KeyValueStore + std::fmt::Debug> std::fmt::Debug for DurableRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableRegistry")
            .field("store", &self.store)
            .field("config", &self.config)
            .finish()
    }
}
