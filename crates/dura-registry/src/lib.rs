//! Registry persistence for dura.
//!
//! [`DurableRegistry`] stores durables in any
//! [`KeyValueStore`](dura_store::KeyValueStore) using two namespaces:
//!
//! ```text
//! records/<id...>      UTF-8 JSON record bytes
//! content/<sha256>     raw blob bytes, one key per distinct content
//! ```
//!
//! # Commit protocol
//!
//! 1. Describe the durable as a [`Metadata`](dura_metadata::Metadata) record;
//!    binary values are staged locally while this happens.
//! 2. Collect every content hash the record references.
//! 3. Upload each blob not already in the content namespace, in parallel.
//!    If any upload fails the commit fails and the record is not written.
//! 4. Write the record bytes.
//!
//! Retrieval reads and decodes the record, pulls any referenced blobs the
//! local staging area lacks, then reconstructs the object.
//!
//! A registry over a durable store can describe itself as a
//! [`RegistrySettings`] record and be restored from it later.

pub mod config;
pub mod error;
pub mod registry;
pub mod settings;

pub use config::RegistryConfig;
pub use error::{RegistryError, RegistryResult};
pub use registry::{CommitReport, DurableRegistry};
pub use settings::{RegistrySettings, RegistrySettingsBuilder};
