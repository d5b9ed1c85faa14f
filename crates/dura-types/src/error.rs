use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid content hash {value:?}: {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("invalid storage key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },
}
