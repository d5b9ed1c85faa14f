//! Hierarchical storage keys.
//!
//! A key is a non-empty, ordered list of segments joined with `/`.
//! Validation rules, applied to every segment:
//! - Must be non-empty
//! - Must not contain the separator `/`
//! - Must not contain `..`
//!
//! Keys are validated on construction, so a key that exists is always safe
//! to map onto a filesystem path.

use std::fmt;

use crate::error::TypeError;

/// A validated hierarchical key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    segments: Vec<String>,
}

impl StorageKey {
    /// Separator used to join segments.
    pub const SEPARATOR: char = '/';

    /// Build a key from its segments.
    ///
    /// # Examples
    ///
    /// ```
    /// use dura_types::StorageKey;
    ///
    /// assert!(StorageKey::new(["records", "model", "v1"]).is_ok());
    /// assert!(StorageKey::new(["a/b"]).is_err());
    /// assert!(StorageKey::new(["a..b"]).is_err());
    /// assert!(StorageKey::new(Vec::<String>::new()).is_err());
    /// ```
    pub fn new<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TypeError::InvalidKey {
                key: String::new(),
                reason: "at least one key segment is required".into(),
            });
        }
        for segment in &segments {
            validate_segment(segment).map_err(|reason| TypeError::InvalidKey {
                key: segments.join("/"),
                reason,
            })?;
        }
        Ok(Self { segments })
    }

    /// Parse a `/`-joined key string.
    pub fn parse(key: &str) -> Result<Self, TypeError> {
        Self::new(key.split(Self::SEPARATOR))
    }

    /// The key's segments, in order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`: a key has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment.
    pub fn last(&self) -> &str {
        // Construction guarantees at least one segment.
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// A new key with `segment` appended.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, TypeError> {
        let segment = segment.into();
        validate_segment(&segment).map_err(|reason| TypeError::InvalidKey {
            key: format!("{self}/{segment}"),
            reason,
        })?;
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    /// A new key with all of `other`'s segments appended.
    pub fn join(&self, other: &StorageKey) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Whether `prefix`'s segments are a leading run of this key's segments.
    pub fn starts_with(&self, prefix: &StorageKey) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// The remainder of this key after `prefix`, if it is a strict prefix.
    pub fn strip_prefix(&self, prefix: &StorageKey) -> Option<StorageKey> {
        if self.segments.len() > prefix.segments.len() && self.starts_with(prefix) {
            Some(Self {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("key segments must not be empty".into());
    }
    if segment.contains(StorageKey::SEPARATOR) {
        return Err(format!(
            "segment {segment:?} contains separator '{}'",
            StorageKey::SEPARATOR
        ));
    }
    if segment.contains("..") {
        return Err(format!("segment {segment:?} contains '..'"));
    }
    Ok(())
}
