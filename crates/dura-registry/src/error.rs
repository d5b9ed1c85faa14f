use dura_metadata::MetadataError;
use dura_store::StoreError;
use dura_types::{ContentHash, TypeError};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("invalid key: {0}")]
    Key(#[from] TypeError),

    #[error("invalid registry config: {0}")]
    Config(String),

    /// One or more referenced blobs could not be written. The record was not
    /// written either.
    #[error("{} blob upload(s) failed, first: {}", .failures.len(), first_failure(.failures))]
    BlobUpload { failures: Vec<(ContentHash, String)> },
}

fn first_failure(failures: &[(ContentHash, String)]) -> String {
    failures
        .first()
        .map(|(hash, reason)| format!("{}: {reason}", hash.short_hex()))
        .unwrap_or_default()
}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
