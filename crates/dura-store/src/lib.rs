//! Key-value storage and content-addressed staging for dura.
//!
//! Two storage concerns live here:
//!
//! - The [`KeyValueStore`] contract: a flat byte store keyed by validated,
//!   hierarchical [`StorageKey`](dura_types::StorageKey)s. Registries keep
//!   metadata records and content blobs in separate namespaces of one store.
//! - The [`StagingArea`]: a local directory of blobs addressed by the
//!   SHA-256 of their bytes, written via scratch-file-then-rename.
//!
//! # Storage Backends
//!
//! - [`InMemoryKeyValueStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`FileSystemKeyValueStore`] -- one file per key under a root directory
//!
//! # Design Rules
//!
//! 1. Keys are validated before any I/O happens.
//! 2. Content-addressed writes are idempotent; rewriting a hash is a no-op.
//! 3. Readers never observe a partially written value or blob.
//! 4. The store never interprets values -- it is a pure key-value store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod filesystem;
pub mod memory;
pub mod staging;
pub mod traits;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StagingConfig;
pub use error::{StagingError, StagingResult, StoreError, StoreResult};
pub use filesystem::FileSystemKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use staging::{BlobReader, StagedBlob, StagingArea};
pub use traits::KeyValueStore;
