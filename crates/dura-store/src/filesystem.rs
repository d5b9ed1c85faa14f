use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use dura_types::StorageKey;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

const DATA_DIR: &str = "data";
const TMP_DIR: &str = "tmp";

/// Key-value store backed by a directory tree.
///
/// Layout under `root`:
/// ```text
/// data/<segment>/<segment>/...   one file per key
/// tmp/                           scratch files for in-flight writes
/// ```
///
/// Writes go to a scratch file in `tmp/` and are renamed into place, so a
/// reader never observes a half-written value. A key cannot be both a value
/// and a prefix of another key on this backend; such a write fails with an
/// I/O error.
#[derive(Debug, Clone)]
pub struct FileSystemKeyValueStore {
    root: PathBuf,
}

impl FileSystemKeyValueStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(DATA_DIR))?;
        fs::create_dir_all(root.join(TMP_DIR))?;
        Ok(Self { root })
    }

    /// The directory this store lives in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn data_root(&self) -> PathBuf {
        self.root.join(DATA_DIR)
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        let mut path = self.data_root();
        for segment in key.segments() {
            path.push(segment);
        }
        path
    }

    fn walk(&self, dir: &Path, context: &str) -> StoreResult<Vec<StorageKey>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io {
                key: context.to_string(),
                source: e.into(),
            })?;
            if entry.file_type().is_file() {
                keys.push(self.key_for(entry.path())?);
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn key_for(&self, path: &Path) -> StoreResult<StorageKey> {
        let data_root = self.data_root();
        let relative = path
            .strip_prefix(&data_root)
            .map_err(|e| StoreError::InvalidStoredKey {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let segments = relative
            .components()
            .map(|c| {
                c.as_os_str()
                    .to_str()
                    .map(str::to_string)
                    .ok_or_else(|| StoreError::InvalidStoredKey {
                        path: path.to_path_buf(),
                        reason: "path is not valid UTF-8".into(),
                    })
            })
            .collect::<StoreResult<Vec<String>>>()?;
        StorageKey::new(segments).map_err(|e| StoreError::InvalidStoredKey {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl KeyValueStore for FileSystemKeyValueStore {
    fn put(&self, key: &StorageKey, value: &[u8]) -> StoreResult<()> {
        let target = self.path_for(key);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(key, e))?;
        }

        let mut scratch =
            tempfile::NamedTempFile::new_in(self.root.join(TMP_DIR)).map_err(|e| StoreError::io(key, e))?;
        scratch.write_all(value).map_err(|e| StoreError::io(key, e))?;
        scratch.flush().map_err(|e| StoreError::io(key, e))?;
        // The value must be on disk before the rename makes it visible.
        scratch.as_file().sync_all().map_err(|e| StoreError::io(key, e))?;
        scratch
            .persist(&target)
            .map_err(|e| StoreError::io(key, e.error))?;

        debug!(key = %key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn get(&self, key: &StorageKey) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(key, e)),
        }
        fs::read(&path).map(Some).map_err(|e| StoreError::io(key, e))
    }

    fn list(&self, prefix: &StorageKey) -> StoreResult<Vec<StorageKey>> {
        self.walk(&self.path_for(prefix), &prefix.to_string())
    }

    fn list_all(&self) -> StoreResult<Vec<StorageKey>> {
        self.walk(&self.data_root(), "")
    }

    fn exists(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.path_for(key).is_file())
    }
}
