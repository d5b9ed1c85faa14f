use std::fmt;
use std::sync::Arc;

use dura_store::{StagingArea, StagingConfig};

use crate::builder::{BuilderRegistry, Durable};
use crate::error::MetadataResult;
use crate::metadata::Metadata;

/// Shared state every record is built and decoded against: the builder
/// registration table and the staging area holding binary content.
///
/// Cheap to clone; clones share both.
#[derive(Clone)]
pub struct Durability {
    builders: Arc<BuilderRegistry>,
    staging: Arc<StagingArea>,
}

impl Durability {
    pub fn new(builders: Arc<BuilderRegistry>, staging: Arc<StagingArea>) -> Self {
        Self { builders, staging }
    }

    /// Context over `staging` with no builders registered yet.
    pub fn with_staging(staging: StagingArea) -> Self {
        Self::new(Arc::new(BuilderRegistry::new()), Arc::new(staging))
    }

    /// Open the staging area described by `config`.
    pub fn open(config: &StagingConfig) -> MetadataResult<Self> {
        Ok(Self::with_staging(StagingArea::open(config)?))
    }

    pub fn builders(&self) -> &Arc<BuilderRegistry> {
        &self.builders
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    /// Make records of `T` reconstructable. See [`BuilderRegistry::register`].
    pub fn register<T: Durable>(&self) -> bool {
        self.builders.register::<T>()
    }

    /// Empty record for `T`.
    pub fn metadata_for<T: Durable>(&self) -> Metadata {
        Metadata::for_durable::<T>(self)
    }

    /// Describe `value` as a record.
    pub fn describe<T: Durable>(&self, value: &T) -> MetadataResult<Metadata> {
        value.describe(self.metadata_for::<T>())
    }

    /// Decode record bytes.
    pub fn decode(&self, bytes: &[u8]) -> MetadataResult<Metadata> {
        Metadata::from_bytes(bytes, self)
    }

    /// Decode record bytes and reconstruct the object as a `T`.
    pub fn reconstruct<T: Durable>(&self, bytes: &[u8]) -> MetadataResult<T> {
        self.decode(bytes)?.durable::<T>()
    }
}

impl fmt::Debug for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Durability")
            .field("builders", &self.builders)
            .field("staging", &self.staging.root())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::SimpleClass;

    #[test]
    fn open_creates_staging_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("staging");
        let ctx = Durability::open(&StagingConfig::in_dir(&root)).unwrap();
        assert_eq!(ctx.staging().root(), root.as_path());
        assert!(root.join("sha256").is_dir());
    }

    #[test]
    fn invalid_config_is_staging_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = StagingConfig {
            root: dir.path().to_path_buf(),
            chunk_size: 0,
        };
        let err = Durability::open(&config).unwrap_err();
        assert!(matches!(err, crate::MetadataError::Staging(_)));
    }

    #[test]
    fn clones_share_registrations() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Durability::with_staging(StagingArea::in_dir(dir.path()).unwrap());
        let clone = ctx.clone();
        ctx.register::<SimpleClass>();
        assert!(clone.builders().contains(SimpleClass::BUILDER_ID));
    }
}
