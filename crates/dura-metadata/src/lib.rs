//! Durable object metadata for dura.
//!
//! Turns domain objects into self-describing, content-deduplicated records
//! and back, without per-type serialization code.
//!
//! # Contracts
//!
//! - [`Durable`] -- an object that describes itself as a [`Metadata`] record
//! - [`ComponentBuilder`] -- a single-use accumulator with named [`Setters`]
//!   that reconstructs the object from the record's parameters
//!
//! # Records
//!
//! A record pairs a builder identifier with named, tagged [`Entry`] values
//! and encodes as UTF-8 JSON:
//!
//! ```text
//! {"builderId": "...", "parameters": {"<name>": {"type": "<TAG>", "value": ...}}}
//! ```
//!
//! Binary values are never embedded. They are staged in a
//! [`StagingArea`](dura_store::StagingArea) under the SHA-256 of their bytes,
//! and the record holds only that hash, so identical payloads are stored
//! once no matter how many records reference them.
//!
//! The bundled key-value stores are durables too (see [`stores`]), so the
//! location of a registry's data can itself be recorded and rebuilt.
//!
//! # Design Rules
//!
//! 1. Decoding never requires the builder; only reconstruction does.
//! 2. Builders are found through an explicit registration table, never by
//!    guessing from the identifier.
//! 3. A failed decode leaves no partially populated record behind.
//! 4. Handles on binary content are released as soon as their setter returns.

pub mod builder;
pub mod context;
pub mod entry;
pub mod error;
pub mod metadata;
pub mod stores;
pub mod value;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export primary types at crate root for ergonomic imports.
pub use builder::{
    BuilderFactory, BuilderRegistry, ComponentBuilder, Durable, DurableFactory, DynBuilder,
    Setter, Setters,
};
pub use context::Durability;
pub use entry::{Entry, EntryTag, WireEntry};
pub use error::{MetadataError, MetadataResult, ParameterError};
pub use metadata::{Metadata, WireRecord, MAX_NESTING_DEPTH};
pub use stores::{FileSystemStoreBuilder, InMemoryStoreBuilder};
pub use value::{Real, Value};
