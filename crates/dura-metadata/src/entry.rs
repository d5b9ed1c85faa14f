//! Tagged parameter values and their wire form.
//!
//! Every entry encodes to a `{"type": TAG, "value": payload}` pair. Nested
//! records are embedded inline, binary values are referenced by the hex
//! SHA-256 of their bytes, arrays hold independently tagged elements.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use dura_store::StagingArea;
use dura_types::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::context::Durability;
use crate::error::{MetadataError, MetadataResult};
use crate::metadata::{too_deep, Metadata, WireRecord, MAX_NESTING_DEPTH};
use crate::value::{Real, Value};

const PREVIEW_LEN: usize = 64;

/// Years an `INSTANT` can hold. RFC 3339 has no room for wider ones.
const INSTANT_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// The stored type of an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryTag {
    Integer,
    Float,
    Double,
    String,
    Instant,
    Metadata,
    Binary,
    Array,
}

impl EntryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::String => "STRING",
            Self::Instant => "INSTANT",
            Self::Metadata => "METADATA",
            Self::Binary => "BINARY",
            Self::Array => "ARRAY",
        }
    }
}

impl fmt::Display for EntryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    #[serde(rename = "type")]
    pub tag: EntryTag,
    pub value: Json,
}

impl WireEntry {
    pub fn into_json(self) -> Json {
        let mut object = serde_json::Map::with_capacity(2);
        object.insert("type".into(), Json::from(self.tag.as_str()));
        object.insert("value".into(), self.value);
        Json::Object(object)
    }
}

/// One stored parameter value.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Integer(i64),
    Float(f32),
    Double(f64),
    String(String),
    Instant(DateTime<Utc>),
    Nested(Box<Metadata>),
    /// Reference to a staged blob.
    Binary(ContentHash),
    Array(Vec<Entry>),
}

impl Entry {
    /// Wrap a live value, staging binary content on the way.
    pub fn from_real(value: Value, staging: &StagingArea) -> MetadataResult<Self> {
        Ok(match value {
            Value::Integer(v) => Self::Integer(v),
            Value::Float(v) => {
                if !v.is_finite() {
                    return Err(MetadataError::Conversion {
                        value: v.to_string(),
                        target: "FLOAT",
                    });
                }
                Self::Float(v)
            }
            Value::Double(v) => {
                if !v.is_finite() {
                    return Err(MetadataError::Conversion {
                        value: v.to_string(),
                        target: "DOUBLE",
                    });
                }
                Self::Double(v)
            }
            Value::String(v) => Self::String(v),
            Value::Instant(v) => {
                if !INSTANT_YEARS.contains(&v.year()) {
                    return Err(MetadataError::Conversion {
                        value: v.to_string(),
                        target: "INSTANT",
                    });
                }
                Self::Instant(v)
            }
            Value::Metadata(v) => Self::Nested(Box::new(v)),
            Value::Bytes(v) => Self::Binary(staging.stage_bytes(&v)?.hash),
            Value::Reader(v) => Self::Binary(staging.stage(v)?.hash),
            Value::File(v) => Self::Binary(staging.stage_file(&v)?.hash),
            Value::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|item| Self::from_real(item, staging))
                    .collect::<MetadataResult<_>>()?,
            ),
        })
    }

    pub fn tag(&self) -> EntryTag {
        match self {
            Self::Integer(_) => EntryTag::Integer,
            Self::Float(_) => EntryTag::Float,
            Self::Double(_) => EntryTag::Double,
            Self::String(_) => EntryTag::String,
            Self::Instant(_) => EntryTag::Instant,
            Self::Nested(_) => EntryTag::Metadata,
            Self::Binary(_) => EntryTag::Binary,
            Self::Array(_) => EntryTag::Array,
        }
    }

    pub fn to_wire(&self) -> WireEntry {
        let value = match self {
            Self::Integer(v) => Json::from(*v),
            Self::Float(v) => Json::from(*v),
            Self::Double(v) => Json::from(*v),
            Self::String(v) => Json::from(v.as_str()),
            Self::Instant(v) => Json::from(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Nested(v) => v.to_wire().into_json(),
            Self::Binary(v) => Json::from(v.to_hex()),
            Self::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|item| item.to_wire().into_json())
                    .collect(),
            ),
        };
        WireEntry {
            tag: self.tag(),
            value,
        }
    }

    /// Decode a wire entry. Builders for nested records are looked up in
    /// `context`, but an unresolved one is not an error here.
    pub fn from_wire(wire: WireEntry, context: &Durability) -> MetadataResult<Self> {
        Self::decode(wire.tag, wire.value, context, 0)
    }

    pub(crate) fn decode(
        tag: EntryTag,
        value: Json,
        context: &Durability,
        depth: usize,
    ) -> MetadataResult<Self> {
        let entry = match tag {
            EntryTag::Integer => value.as_i64().map(Self::Integer),
            EntryTag::Float => value
                .as_f64()
                .filter(|v| v.is_finite() && v.abs() <= f64::from(f32::MAX))
                .map(|v| Self::Float(v as f32)),
            EntryTag::Double => value.as_f64().map(Self::Double),
            EntryTag::String => value.as_str().map(|v| Self::String(v.to_string())),
            EntryTag::Instant => match value.as_str() {
                Some(text) => {
                    let parsed = DateTime::parse_from_rfc3339(text).map_err(|_| {
                        MetadataError::Conversion {
                            value: text.to_string(),
                            target: "instant",
                        }
                    })?;
                    Some(Self::Instant(parsed.with_timezone(&Utc)))
                }
                None => None,
            },
            EntryTag::Binary => value
                .as_str()
                .and_then(|v| ContentHash::from_hex(v).ok())
                .map(Self::Binary),
            EntryTag::Metadata => {
                check_depth(depth)?;
                if !value.is_object() {
                    return Err(unexpected(tag, &value));
                }
                let record = serde_json::from_value::<WireRecord>(value).map_err(malformed)?;
                let nested = Metadata::decode(record, context, depth + 1)?;
                return Ok(Self::Nested(Box::new(nested)));
            }
            EntryTag::Array => {
                check_depth(depth)?;
                let items = match value {
                    Json::Array(items) => items,
                    other => return Err(unexpected(tag, &other)),
                };
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    if !item.is_object() {
                        return Err(unexpected(tag, &item));
                    }
                    let wire = serde_json::from_value::<WireEntry>(item).map_err(malformed)?;
                    entries.push(Self::decode(wire.tag, wire.value, context, depth + 1)?);
                }
                return Ok(Self::Array(entries));
            }
        };
        entry.ok_or_else(|| unexpected(tag, &value))
    }

    /// The live value. Nested entries are reconstructed, binary entries are
    /// opened from `staging`.
    pub fn value(&self, staging: &StagingArea) -> MetadataResult<Real> {
        Ok(match self {
            Self::Integer(v) => Real::Integer(*v),
            Self::Float(v) => Real::Float(*v),
            Self::Double(v) => Real::Double(*v),
            Self::String(v) => Real::String(v.clone()),
            Self::Instant(v) => Real::Instant(*v),
            Self::Nested(v) => Real::Durable(v.get_durable()?),
            Self::Binary(hash) => match staging.open_blob(hash)? {
                Some(reader) => Real::Binary(reader),
                None => return Err(MetadataError::MissingContent(*hash)),
            },
            Self::Array(items) => Real::Array(
                items
                    .iter()
                    .map(|item| item.value(staging))
                    .collect::<MetadataResult<_>>()?,
            ),
        })
    }

    /// Levels of records and arrays below this entry. Scalars are 0.
    pub fn nesting(&self) -> usize {
        match self {
            Self::Nested(metadata) => 1 + metadata.nesting(),
            Self::Array(items) => 1 + items.iter().map(Entry::nesting).max().unwrap_or(0),
            Self::Integer(_)
            | Self::Float(_)
            | Self::Double(_)
            | Self::String(_)
            | Self::Instant(_)
            | Self::Binary(_) => 0,
        }
    }

    /// Add every content hash this entry depends on to `hashes`.
    pub fn collect_hashes(&self, hashes: &mut BTreeSet<ContentHash>) {
        match self {
            Self::Binary(hash) => {
                hashes.insert(*hash);
            }
            Self::Nested(metadata) => metadata.collect_hashes(hashes),
            Self::Array(items) => {
                for item in items {
                    item.collect_hashes(hashes);
                }
            }
            Self::Integer(_)
            | Self::Float(_)
            | Self::Double(_)
            | Self::String(_)
            | Self::Instant(_) => {}
        }
    }
}

fn check_depth(depth: usize) -> MetadataResult<()> {
    if depth >= MAX_NESTING_DEPTH {
        return Err(too_deep());
    }
    Ok(())
}

fn malformed(e: serde_json::Error) -> MetadataError {
    MetadataError::MalformedRecord(e.to_string())
}

fn unexpected(tag: EntryTag, value: &Json) -> MetadataError {
    let text = value.to_string();
    let value = if text.chars().count() > PREVIEW_LEN {
        let mut preview: String = text.chars().take(PREVIEW_LEN).collect();
        preview.push_str("...");
        preview
    } else {
        text
    };
    MetadataError::UnexpectedType { tag, value }
}
