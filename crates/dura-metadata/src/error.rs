use dura_store::StagingError;
use dura_types::ContentHash;

use crate::entry::EntryTag;

/// Errors from describing, encoding, decoding, or reconstructing durables.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// A runtime value has no entry variant.
    #[error("unsupported value type: {type_name}")]
    UnsupportedValueType { type_name: String },

    /// A parameter was given no value.
    #[error("parameter {name:?} cannot be null")]
    NullValue { name: String },

    /// A wire payload does not have the shape its tag requires.
    #[error("value {value} is of unexpected type for stored type {tag}")]
    UnexpectedType { tag: EntryTag, value: String },

    /// The record bytes are not a structurally valid record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// The builder identifier did not resolve when reconstruction was attempted.
    #[error("no builder available for {builder_id}")]
    NoBuilder { builder_id: String },

    /// A parameter name has no setter on the builder.
    #[error("could not find setter {parameter:?} in builder {builder_id}")]
    NoSuchSetter {
        builder_id: String,
        parameter: String,
    },

    /// Applying a value or building the instance failed.
    #[error("reconstruction with builder {builder_id} failed at {stage}: {source}")]
    Reconstruction {
        builder_id: String,
        stage: String,
        #[source]
        source: ParameterError,
    },

    /// A binary entry references a blob that is not in the content store.
    #[error("cannot find content with hash {0}")]
    MissingContent(ContentHash),

    /// Hashing or staging a binary value failed.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// A typed value cannot be converted to or from its stored form.
    #[error("cannot convert {value:?} to {target}")]
    Conversion { value: String, target: &'static str },
}

/// Result alias for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised by builder setters and `build`.
#[derive(Debug, thiserror::Error)]
pub enum ParameterError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("required parameter {0:?} was never set")]
    Missing(&'static str),

    #[error("integer {value} out of range for {target}")]
    OutOfRange { value: i64, target: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid value: {0}")]
    Invalid(String),
}
