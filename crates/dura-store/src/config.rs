use std::path::PathBuf;

use dura_crypto::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};

use crate::error::{StagingError, StagingResult};

/// Configuration for the content-addressed staging area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory holding staged blobs and scratch files.
    pub root: PathBuf,
    /// Bytes read from an input stream per hashing/writing step.
    pub chunk_size: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("dura-staging"),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl StagingConfig {
    /// Default settings rooted at `root`.
    pub fn in_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Reject settings the staging area cannot run with.
    pub fn validate(&self) -> StagingResult<()> {
        if self.chunk_size == 0 {
            return Err(StagingError::InvalidConfig(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.root.as_os_str().is_empty() {
            return Err(StagingError::InvalidConfig("root must not be empty".into()));
        }
        Ok(())
    }
}
