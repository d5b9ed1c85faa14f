use std::io;
use std::path::PathBuf;

use dura_types::{ContentHash, StorageKey};

/// Errors from key-value store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error from the underlying storage backend.
    #[error("I/O error at {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A path found on disk does not map back to a valid key.
    #[error("invalid key on disk at {path:?}: {reason}")]
    InvalidStoredKey { path: PathBuf, reason: String },

    /// A lock guarding in-memory state was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl StoreError {
    pub(crate) fn io(key: &StorageKey, source: io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from staging content-addressed blobs.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// Reading the input stream or writing the staged file failed.
    #[error("staging I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// Bytes offered for a hash do not hash to it.
    #[error("digest mismatch: expected {expected}, computed {computed}")]
    DigestMismatch {
        expected: ContentHash,
        computed: ContentHash,
    },

    /// The staging configuration cannot be used.
    #[error("invalid staging configuration: {0}")]
    InvalidConfig(String),
}

impl StagingError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result alias for staging operations.
pub type StagingResult<T> = Result<T, StagingError>;
