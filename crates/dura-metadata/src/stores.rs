//! The bundled key-value stores as durables.
//!
//! A store describes where its data lives, not the data itself, so a record
//! of a store can be committed alongside whatever uses it and rebuilt later.

use std::path::PathBuf;

use dura_store::{FileSystemKeyValueStore, InMemoryKeyValueStore};

use crate::builder::{ComponentBuilder, Durable, Setters};
use crate::error::{MetadataError, MetadataResult, ParameterError};
use crate::metadata::Metadata;

// ---------------------------------------------------------------------------
// File system
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FileSystemStoreBuilder {
    root: Option<PathBuf>,
}

impl ComponentBuilder for FileSystemStoreBuilder {
    type Output = FileSystemKeyValueStore;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new().with("root", |b, v| {
            b.root = Some(PathBuf::from(v.into_string()?));
            Ok(())
        })
    }

    fn build(self) -> Result<FileSystemKeyValueStore, ParameterError> {
        let root = self.root.ok_or(ParameterError::Missing("root"))?;
        Ok(FileSystemKeyValueStore::open(root)?)
    }
}

impl Durable for FileSystemKeyValueStore {
    const BUILDER_ID: &'static str = "dura.store.FileSystemKeyValueStore";
    type Builder = FileSystemStoreBuilder;

    /// Records `root` as an absolute path, so the record does not depend on
    /// the working directory it is read from.
    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        let conversion = || MetadataError::Conversion {
            value: self.root().display().to_string(),
            target: "absolute UTF-8 path",
        };
        let root = std::path::absolute(self.root()).map_err(|_| conversion())?;
        let root = root.to_str().ok_or_else(conversion)?;
        metadata.with_parameter("root", root)
    }
}

// ---------------------------------------------------------------------------
// Memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct InMemoryStoreBuilder {
    name: Option<String>,
}

impl ComponentBuilder for InMemoryStoreBuilder {
    type Output = InMemoryKeyValueStore;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new().with("name", |b, v| {
            b.name = Some(v.into_string()?);
            Ok(())
        })
    }

    /// Without a name the store is fresh and empty.
    fn build(self) -> Result<InMemoryKeyValueStore, ParameterError> {
        Ok(match self.name {
            Some(name) => InMemoryKeyValueStore::named(name),
            None => InMemoryKeyValueStore::new(),
        })
    }
}

impl Durable for InMemoryKeyValueStore {
    const BUILDER_ID: &'static str = "dura.store.InMemoryKeyValueStore";
    type Builder = InMemoryStoreBuilder;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        metadata.with_parameter("name", self.name())
    }
}
