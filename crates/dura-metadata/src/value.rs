//! Live values going into and coming out of a [`Metadata`] record.
//!
//! [`Value`] is what a durable hands to
//! [`Metadata::with_parameter`](crate::Metadata::with_parameter); [`Real`] is
//! what a builder setter receives back during reconstruction.

use std::any::{type_name, Any};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use dura_store::BlobReader;

use crate::error::{MetadataError, MetadataResult, ParameterError};
use crate::metadata::Metadata;

/// A value offered for storage.
///
/// Binary variants (`Bytes`, `Reader`, `File`) are hashed and staged when
/// they are turned into an entry; only the content hash ends up in the
/// record.
pub enum Value {
    Integer(i64),
    Float(f32),
    Double(f64),
    String(String),
    Instant(DateTime<Utc>),
    /// A nested durable, already described.
    Metadata(Metadata),
    Bytes(Vec<u8>),
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Array(Vec<Value>),
}

impl Value {
    /// Wrap a byte stream.
    pub fn reader(reader: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(reader))
    }

    /// Build an ordered collection.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Instant(_) => "instant",
            Self::Metadata(_) => "metadata",
            Self::Bytes(_) => "bytes",
            Self::Reader(_) => "reader",
            Self::File(_) => "file",
            Self::Array(_) => "array",
        }
    }

    /// Select a variant by the runtime type of `value`.
    ///
    /// Recognizes the integer, float, string, timestamp, metadata, byte
    /// buffer, byte stream, path, and collection types that have a `From`
    /// conversion, plus `Vec<Box<dyn Any + Send>>` as a collection of
    /// dynamically typed items. Anything else is
    /// [`MetadataError::UnsupportedValueType`].
    pub fn from_any(value: Box<dyn Any + Send>) -> MetadataResult<Self> {
        macro_rules! downcast_into {
            ($value:ident, $($ty:ty),+ $(,)?) => {
                $(
                    let $value = match $value.downcast::<$ty>() {
                        Ok(v) => return Ok(Value::from(*v)),
                        Err(other) => other,
                    };
                )+
            };
        }

        downcast_into!(
            value,
            Value,
            i64,
            i32,
            i16,
            u32,
            u16,
            f32,
            f64,
            String,
            &'static str,
            DateTime<Utc>,
            SystemTime,
            Metadata,
            Vec<u8>,
            PathBuf,
            Box<dyn Read + Send>,
            Vec<Value>,
        );

        match value.downcast::<Vec<Box<dyn Any + Send>>>() {
            Ok(items) => items
                .into_iter()
                .map(Value::from_any)
                .collect::<MetadataResult<Vec<_>>>()
                .map(Value::Array),
            Err(other) => Err(MetadataError::UnsupportedValueType {
                type_name: format!("{:?}", (*other).type_id()),
            }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Instant(v) => f.debug_tuple("Instant").field(v).finish(),
            Self::Metadata(v) => f.debug_tuple("Metadata").field(v).finish(),
            Self::Bytes(v) => write!(f, "Bytes({} bytes)", v.len()),
            Self::Reader(_) => f.write_str("Reader(..)"),
            Self::File(v) => f.debug_tuple("File").field(v).finish(),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Instant(v)
    }
}

impl From<SystemTime> for Value {
    fn from(v: SystemTime) -> Self {
        Self::Instant(v.into())
    }
}

impl From<Metadata> for Value {
    fn from(v: Metadata) -> Self {
        Self::Metadata(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<Box<dyn Read + Send>> for Value {
    fn from(v: Box<dyn Read + Send>) -> Self {
        Self::Reader(v)
    }
}

impl From<PathBuf> for Value {
    fn from(v: PathBuf) -> Self {
        Self::File(v)
    }
}

impl From<&Path> for Value {
    fn from(v: &Path) -> Self {
        Self::File(v.to_path_buf())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

/// A reconstructed value handed to a builder setter.
///
/// `Binary` holds an open handle on the staged blob; it is released when the
/// value is dropped, which happens when the setter returns at the latest.
pub enum Real {
    Integer(i64),
    Float(f32),
    Double(f64),
    String(String),
    Instant(DateTime<Utc>),
    /// A reconstructed nested durable; see [`Real::into_durable`].
    Durable(Box<dyn Any + Send>),
    Binary(BlobReader),
    Array(Vec<Real>),
}

impl Real {
    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Instant(_) => "instant",
            Self::Durable(_) => "durable",
            Self::Binary(_) => "binary",
            Self::Array(_) => "array",
        }
    }

    fn mismatch(self, expected: &'static str) -> ParameterError {
        ParameterError::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    pub fn into_i64(self) -> Result<i64, ParameterError> {
        match self {
            Self::Integer(v) => Ok(v),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn into_i32(self) -> Result<i32, ParameterError> {
        let value = self.into_i64()?;
        i32::try_from(value).map_err(|_| ParameterError::OutOfRange {
            value,
            target: "i32",
        })
    }

    /// Only a stored float; a double is never narrowed.
    pub fn into_f32(self) -> Result<f32, ParameterError> {
        match self {
            Self::Float(v) => Ok(v),
            other => Err(other.mismatch("float")),
        }
    }

    /// A stored double, or a stored float widened losslessly.
    pub fn into_f64(self) -> Result<f64, ParameterError> {
        match self {
            Self::Double(v) => Ok(v),
            Self::Float(v) => Ok(f64::from(v)),
            other => Err(other.mismatch("double")),
        }
    }

    pub fn into_string(self) -> Result<String, ParameterError> {
        match self {
            Self::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn into_instant(self) -> Result<DateTime<Utc>, ParameterError> {
        match self {
            Self::Instant(v) => Ok(v),
            other => Err(other.mismatch("instant")),
        }
    }

    /// Take the nested durable as a `T`.
    pub fn into_durable<T: 'static>(self) -> Result<T, ParameterError> {
        match self {
            Self::Durable(v) => v
                .downcast::<T>()
                .map(|b| *b)
                .map_err(|_| ParameterError::TypeMismatch {
                    expected: type_name::<T>(),
                    found: "durable of another type",
                }),
            other => Err(other.mismatch("durable")),
        }
    }

    /// Take the binary value as an open reader.
    pub fn into_reader(self) -> Result<BlobReader, ParameterError> {
        match self {
            Self::Binary(v) => Ok(v),
            other => Err(other.mismatch("binary")),
        }
    }

    /// Read the binary value fully.
    pub fn into_bytes(self) -> Result<Vec<u8>, ParameterError> {
        Ok(self.into_reader()?.into_bytes()?)
    }

    pub fn into_array(self) -> Result<Vec<Real>, ParameterError> {
        match self {
            Self::Array(v) => Ok(v),
            other => Err(other.mismatch("array")),
        }
    }

    /// Convert every element of an array with `convert`.
    pub fn into_vec<T, F>(self, convert: F) -> Result<Vec<T>, ParameterError>
    where
        F: FnMut(Real) -> Result<T, ParameterError>,
    {
        self.into_array()?.into_iter().map(convert).collect()
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => f.debug_tuple("Integer").field(v).finish(),
            Self::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
            Self::String(v) => f.debug_tuple("String").field(v).finish(),
            Self::Instant(v) => f.debug_tuple("Instant").field(v).finish(),
            Self::Durable(_) => f.write_str("Durable(..)"),
            Self::Binary(v) => f.debug_tuple("Binary").field(v.hash()).finish(),
            Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
        }
    }
}
