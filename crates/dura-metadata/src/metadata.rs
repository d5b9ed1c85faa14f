//! The record envelope: builder identifier plus named entries.

use std::any::{type_name, Any};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use dura_types::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::builder::{BuilderFactory, Durable, DurableFactory};
use crate::context::Durability;
use crate::entry::{Entry, WireEntry};
use crate::error::{MetadataError, MetadataResult, ParameterError};
use crate::value::Value;

/// Deepest chain of nested records and arrays a record may hold.
///
/// Enforced when parameters are added and again when decoding, and kept low
/// enough that the encoded JSON stays within `serde_json`'s recursion limit.
pub const MAX_NESTING_DEPTH: usize = 32;

/// A record as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    #[serde(rename = "builderId")]
    pub builder_id: String,
    pub parameters: BTreeMap<String, WireEntry>,
}

impl WireRecord {
    pub fn into_json(self) -> Json {
        let parameters = self
            .parameters
            .into_iter()
            .map(|(name, entry)| (name, entry.into_json()))
            .collect::<serde_json::Map<_, _>>();
        let mut object = serde_json::Map::with_capacity(2);
        object.insert("builderId".into(), Json::from(self.builder_id));
        object.insert("parameters".into(), Json::Object(parameters));
        Json::Object(object)
    }
}

/// Serializable description of one durable.
///
/// Built either from a live durable (see [`Durability::describe`]) or from
/// record bytes (see [`Metadata::from_bytes`]). Parameters are kept sorted by
/// name, so the encoded form of a given record is stable.
#[derive(Clone)]
pub struct Metadata {
    builder_id: String,
    parameters: BTreeMap<String, Entry>,
    nesting: usize,
    builder: Option<Arc<dyn BuilderFactory>>,
    context: Durability,
}

impl Metadata {
    /// Empty record for `T`, carrying `T`'s own builder.
    pub fn for_durable<T: Durable>(context: &Durability) -> Self {
        Self {
            builder_id: T::BUILDER_ID.to_string(),
            parameters: BTreeMap::new(),
            nesting: 0,
            builder: Some(Arc::new(DurableFactory::<T>::new())),
            context: context.clone(),
        }
    }

    /// Empty record for a builder known only by identifier.
    ///
    /// An identifier nobody registered is accepted: the record can still be
    /// decoded and re-encoded, it just cannot be reconstructed.
    pub fn from_builder_id(builder_id: impl Into<String>, context: &Durability) -> Self {
        let builder_id = builder_id.into();
        let builder = context.builders().try_resolve(&builder_id);
        if builder.is_none() {
            warn!(builder_id = %builder_id, "no builder registered for record");
        }
        Self {
            builder_id,
            parameters: BTreeMap::new(),
            nesting: 0,
            builder,
            context: context.clone(),
        }
    }

    pub fn builder_id(&self) -> &str {
        &self.builder_id
    }

    /// Whether a builder is available for [`get_durable`](Self::get_durable).
    pub fn is_reconstructable(&self) -> bool {
        self.factory().is_some()
    }

    pub fn context(&self) -> &Durability {
        &self.context
    }

    /// Store `value` under `name`, replacing any previous entry of that name.
    ///
    /// Binary values are staged before this returns. Fails with
    /// [`MetadataError::MalformedRecord`] if the value would take the record
    /// past [`MAX_NESTING_DEPTH`].
    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> MetadataResult<Self> {
        let entry = Entry::from_real(value.into(), self.context.staging())?;
        let nesting = entry.nesting();
        if nesting > MAX_NESTING_DEPTH {
            return Err(too_deep());
        }
        if self.parameters.insert(name.into(), entry).is_some() {
            self.nesting = max_nesting(&self.parameters);
        } else {
            self.nesting = self.nesting.max(nesting);
        }
        Ok(self)
    }

    /// Like [`with_parameter`](Self::with_parameter), failing with
    /// [`MetadataError::NullValue`] when `value` is `None`.
    pub fn with_optional_parameter<V: Into<Value>>(
        self,
        name: impl Into<String>,
        value: Option<V>,
    ) -> MetadataResult<Self> {
        let name = name.into();
        match value {
            Some(value) => self.with_parameter(name, value),
            None => Err(MetadataError::NullValue { name }),
        }
    }

    /// Describe `value` and store it as a nested record.
    pub fn with_durable<U: Durable>(self, name: impl Into<String>, value: &U) -> MetadataResult<Self> {
        let nested = value.describe(Metadata::for_durable::<U>(&self.context))?;
        self.with_parameter(name, nested)
    }

    /// Describe every item of `values` and store them as an array of nested
    /// records.
    pub fn with_durables<'a, U, I>(self, name: impl Into<String>, values: I) -> MetadataResult<Self>
    where
        U: Durable + 'a,
        I: IntoIterator<Item = &'a U>,
    {
        let nested = values
            .into_iter()
            .map(|value| {
                value
                    .describe(Metadata::for_durable::<U>(&self.context))
                    .map(Value::Metadata)
            })
            .collect::<MetadataResult<Vec<_>>>()?;
        self.with_parameter(name, Value::Array(nested))
    }

    pub fn parameter(&self, name: &str) -> Option<&Entry> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &BTreeMap<String, Entry> {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Levels of nested records and arrays below this record.
    pub fn nesting(&self) -> usize {
        self.nesting
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn to_wire(&self) -> WireRecord {
        WireRecord {
            builder_id: self.builder_id.clone(),
            parameters: self
                .parameters
                .iter()
                .map(|(name, entry)| (name.clone(), entry.to_wire()))
                .collect(),
        }
    }

    pub fn to_json(&self) -> Json {
        self.to_wire().into_json()
    }

    /// UTF-8 JSON encoding of the record.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }

    /// Decode record bytes.
    ///
    /// Succeeds whether or not the builder identifiers in the record can be
    /// resolved, and does not touch binary content.
    pub fn from_bytes(bytes: &[u8], context: &Durability) -> MetadataResult<Self> {
        let record: WireRecord = serde_json::from_slice(bytes)
            .map_err(|e| MetadataError::MalformedRecord(e.to_string()))?;
        let metadata = Self::from_wire(record, context)?;
        debug!(
            builder_id = %metadata.builder_id,
            parameters = metadata.len(),
            "decoded record"
        );
        Ok(metadata)
    }

    pub fn from_wire(record: WireRecord, context: &Durability) -> MetadataResult<Self> {
        Self::decode(record, context, 0)
    }

    pub(crate) fn decode(
        record: WireRecord,
        context: &Durability,
        depth: usize,
    ) -> MetadataResult<Self> {
        let parameters = record
            .parameters
            .into_iter()
            .map(|(name, wire)| {
                Entry::decode(wire.tag, wire.value, context, depth).map(|entry| (name, entry))
            })
            .collect::<MetadataResult<BTreeMap<_, _>>>()?;
        let mut metadata = Self::from_builder_id(record.builder_id, context);
        metadata.nesting = max_nesting(&parameters);
        metadata.parameters = parameters;
        Ok(metadata)
    }

    /// Every content hash this record depends on, nested records included.
    pub fn hashes(&self) -> BTreeSet<ContentHash> {
        let mut hashes = BTreeSet::new();
        self.collect_hashes(&mut hashes);
        hashes
    }

    pub fn collect_hashes(&self, hashes: &mut BTreeSet<ContentHash>) {
        for entry in self.parameters.values() {
            entry.collect_hashes(hashes);
        }
    }

    /// Reconstruct the described object.
    ///
    /// Each parameter is applied through the builder setter of the same
    /// name, in name order, then the builder is consumed. Binary values are
    /// opened from the staging area and closed once their setter returns.
    pub fn get_durable(&self) -> MetadataResult<Box<dyn Any + Send>> {
        let factory = self.factory().ok_or_else(|| MetadataError::NoBuilder {
            builder_id: self.builder_id.clone(),
        })?;
        let mut builder = factory.create();

        for (name, entry) in &self.parameters {
            if !builder.has_setter(name) {
                return Err(MetadataError::NoSuchSetter {
                    builder_id: self.builder_id.clone(),
                    parameter: name.clone(),
                });
            }
            let value = entry.value(self.context.staging())?;
            builder
                .apply(name, value)
                .map_err(|source| MetadataError::Reconstruction {
                    builder_id: self.builder_id.clone(),
                    stage: format!("parameter {name:?}"),
                    source,
                })?;
        }

        let built = builder
            .build()
            .map_err(|source| MetadataError::Reconstruction {
                builder_id: self.builder_id.clone(),
                stage: "build".into(),
                source,
            })?;
        debug!(builder_id = %self.builder_id, parameters = self.len(), "reconstructed durable");
        Ok(built)
    }

    /// Reconstruct the described object as a `T`.
    pub fn durable<T: 'static>(&self) -> MetadataResult<T> {
        self.get_durable()?
            .downcast::<T>()
            .map(|built| *built)
            .map_err(|_| MetadataError::Reconstruction {
                builder_id: self.builder_id.clone(),
                stage: "downcast".into(),
                source: ParameterError::Invalid(format!(
                    "builder does not produce {}",
                    type_name::<T>()
                )),
            })
    }

    // A builder registered after this record was decoded is picked up here.
    fn factory(&self) -> Option<Arc<dyn BuilderFactory>> {
        self.builder
            .clone()
            .or_else(|| self.context.builders().try_resolve(&self.builder_id))
    }
}

fn max_nesting(parameters: &BTreeMap<String, Entry>) -> usize {
    parameters.values().map(Entry::nesting).max().unwrap_or(0)
}

pub(crate) fn too_deep() -> MetadataError {
    MetadataError::MalformedRecord(format!("nesting deeper than {MAX_NESTING_DEPTH} levels"))
}

impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        self.builder_id == other.builder_id && self.parameters == other.parameters
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("builder_id", &self.builder_id)
            .field("parameters", &self.parameters)
            .field("reconstructable", &self.builder.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use chrono::{DateTime, Utc};
    use dura_store::StagingArea;
    use rand::{Rng, SeedableRng};
    use serde_json::json;

    fn context() -> (tempfile::TempDir, Durability) {
        let dir = tempfile::tempdir().unwrap();
        let context = Durability::with_staging(StagingArea::in_dir(dir.path()).unwrap());
        register_fixtures(&context);
        (dir, context)
    }

    fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.gen()).collect()
    }

    fn roundtrip<T: Durable>(context: &Durability, value: &T) -> T {
        let bytes = context.describe(value).unwrap().to_bytes();
        Metadata::from_bytes(&bytes, context)
            .unwrap()
            .durable::<T>()
            .unwrap()
    }

    fn at(text: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(text).unwrap().with_timezone(&Utc)
    }

    // -----------------------------------------------------------------------
    // Round trips
    // -----------------------------------------------------------------------

    #[test]
    fn scalar_durable_roundtrips() {
        let (_dir, ctx) = context();
        let original = SimpleClass::new("resnet", 42, at("2023-05-17T08:00:00.5Z"));
        let restored = roundtrip(&ctx, &original);
        assert_eq!(restored, original);
        assert!(!std::ptr::eq(&restored, &original));
    }

    #[test]
    fn nested_durable_roundtrips() {
        let (_dir, ctx) = context();
        let original = ContainerClass {
            label: "outer".into(),
            inner: SimpleClass::new("inner", -7, at("1999-12-31T23:59:59Z")),
        };
        let restored = roundtrip(&ctx, &original);
        assert_eq!(restored.inner, original.inner);
        assert_eq!(restored, original);
    }

    #[test]
    fn binary_durable_roundtrips_byte_exact() {
        let (_dir, ctx) = context();
        let original = BinaryHolder {
            name: "weights".into(),
            payload: random_bytes(10_000, 42),
        };
        let metadata = ctx.describe(&original).unwrap();
        let hex = metadata.to_json()["parameters"]["payload"]["value"]
            .as_str()
            .unwrap()
            .to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let restored: BinaryHolder = ctx.reconstruct(&metadata.to_bytes()).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn collections_roundtrip_including_empty() {
        let (_dir, ctx) = context();
        let original = CollectionHolder {
            tags: vec!["a".into(), "b".into(), "c".into()],
            empty: Vec::new(),
            samples: vec![0.25, -1.5],
            children: vec![
                SimpleClass::new("one", 1, at("2020-01-01T00:00:00Z")),
                SimpleClass::new("two", 2, at("2020-01-02T00:00:00Z")),
            ],
        };
        let restored = roundtrip(&ctx, &original);
        assert_eq!(restored.empty, Vec::<i64>::new());
        assert_eq!(restored, original);
    }

    #[test]
    fn described_record_reconstructs_without_registration() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Durability::with_staging(StagingArea::in_dir(dir.path()).unwrap());
        let original = SimpleClass::new("x", 1, at("2021-06-01T00:00:00Z"));
        let restored: SimpleClass = ctx.describe(&original).unwrap().durable().unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn encoding_is_stable() {
        let (_dir, ctx) = context();
        let value = SimpleClass::new("same", 3, at("2022-02-02T02:02:02Z"));
        let first = ctx.describe(&value).unwrap().to_bytes();
        let second = ctx.describe(&value).unwrap().to_bytes();
        assert_eq!(first, second);

        let decoded = Metadata::from_bytes(&first, &ctx).unwrap();
        assert_eq!(decoded.to_bytes(), first);
    }

    // -----------------------------------------------------------------------
    // Wire format
    // -----------------------------------------------------------------------

    #[test]
    fn wire_shape_matches_record_layout() {
        let (_dir, ctx) = context();
        let metadata = Metadata::from_builder_id("demo.Builder", &ctx)
            .with_parameter("n", 5)
            .unwrap()
            .with_parameter("at", at("2024-01-01T00:00:00Z"))
            .unwrap();
        assert_eq!(
            metadata.to_json(),
            json!({
                "builderId": "demo.Builder",
                "parameters": {
                    "at": {"type": "INSTANT", "value": "2024-01-01T00:00:00Z"},
                    "n": {"type": "INTEGER", "value": 5}
                }
            })
        );
    }

    #[test]
    fn nested_record_is_embedded_inline() {
        let (_dir, ctx) = context();
        let container = ContainerClass {
            label: "l".into(),
            inner: SimpleClass::new("i", 0, at("2024-01-01T00:00:00Z")),
        };
        let json = ctx.describe(&container).unwrap().to_json();
        let inner = &json["parameters"]["inner"];
        assert_eq!(inner["type"], "METADATA");
        assert_eq!(inner["value"]["builderId"], SimpleClass::BUILDER_ID);
        assert_eq!(inner["value"]["parameters"]["name"]["value"], "i");
    }

    #[test]
    fn float_is_widened_for_double_setter() {
        let (_dir, ctx) = context();
        let bytes = Metadata::from_builder_id(SimpleClass::BUILDER_ID, &ctx)
            .with_parameter("name", "f")
            .unwrap()
            .with_parameter("count", 1)
            .unwrap()
            .with_parameter("created", at("2024-01-01T00:00:00Z"))
            .unwrap()
            .with_parameter("score", 0.5f32)
            .unwrap()
            .to_bytes();
        let restored: SimpleClass = ctx.reconstruct(&bytes).unwrap();
        assert_eq!(restored.score, 0.5);
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[test]
    fn malformed_bytes_are_rejected() {
        let (_dir, ctx) = context();
        for bytes in [
            &b"not json"[..],
            &b"{\"builderId\": 3, \"parameters\": {}}"[..],
            &b"{\"parameters\": {}}"[..],
            &b"{\"builderId\": \"x\", \"parameters\": {\"a\": {\"type\": \"BOOLEAN\", \"value\": true}}}"[..],
            &[0xff, 0xfe][..],
        ] {
            let err = Metadata::from_bytes(bytes, &ctx).unwrap_err();
            assert!(matches!(err, MetadataError::MalformedRecord(_)), "{err:?}");
        }
    }

    #[test]
    fn unresolvable_builder_decodes_but_does_not_reconstruct() {
        let (_dir, ctx) = context();
        let bytes = json!({
            "builderId": "retired.ModelBuilder",
            "parameters": {"epochs": {"type": "INTEGER", "value": 10}}
        })
        .to_string();

        let metadata = Metadata::from_bytes(bytes.as_bytes(), &ctx).unwrap();
        assert!(!metadata.is_reconstructable());
        assert_eq!(metadata.parameter("epochs"), Some(&Entry::Integer(10)));

        let err = metadata.get_durable().unwrap_err();
        assert!(
            matches!(err, MetadataError::NoBuilder { ref builder_id } if builder_id == "retired.ModelBuilder")
        );
    }

    #[test]
    fn late_registration_is_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Durability::with_staging(StagingArea::in_dir(dir.path()).unwrap());
        let bytes = ctx
            .describe(&SimpleClass::new("late", 9, at("2024-01-01T00:00:00Z")))
            .unwrap()
            .to_bytes();
        let metadata = Metadata::from_bytes(&bytes, &ctx).unwrap();
        assert!(!metadata.is_reconstructable());

        ctx.register::<SimpleClass>();
        assert_eq!(metadata.durable::<SimpleClass>().unwrap().name, "late");
    }

    #[test]
    fn missing_blob_fails_reconstruction_not_decoding() {
        let (_dir, ctx) = context();
        let bytes = ctx
            .describe(&BinaryHolder {
                name: "w".into(),
                payload: b"kept elsewhere".to_vec(),
            })
            .unwrap()
            .to_bytes();

        let other_dir = tempfile::tempdir().unwrap();
        let other = Durability::new(
            Arc::clone(ctx.builders()),
            Arc::new(StagingArea::in_dir(other_dir.path()).unwrap()),
        );
        let metadata = Metadata::from_bytes(&bytes, &other).unwrap();
        let err = metadata.get_durable().unwrap_err();
        assert!(matches!(err, MetadataError::MissingContent(_)));
    }

    #[test]
    fn unknown_parameter_is_no_such_setter() {
        let (_dir, ctx) = context();
        let metadata = Metadata::from_builder_id(SimpleClass::BUILDER_ID, &ctx)
            .with_parameter("colour", "red")
            .unwrap();
        let err = metadata.get_durable().unwrap_err();
        assert!(
            matches!(err, MetadataError::NoSuchSetter { ref parameter, .. } if parameter == "colour")
        );
    }

    #[test]
    fn setter_failure_is_reconstruction_error() {
        let (_dir, ctx) = context();
        let metadata = Metadata::from_builder_id(SimpleClass::BUILDER_ID, &ctx)
            .with_parameter("count", "not a number")
            .unwrap();
        let err = metadata.get_durable().unwrap_err();
        match err {
            MetadataError::Reconstruction { stage, source, .. } => {
                assert_eq!(stage, "parameter \"count\"");
                assert!(matches!(source, ParameterError::TypeMismatch { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_required_parameter_fails_build() {
        let (_dir, ctx) = context();
        let metadata = Metadata::from_builder_id(SimpleClass::BUILDER_ID, &ctx)
            .with_parameter("name", "only a name")
            .unwrap();
        let err = metadata.get_durable().unwrap_err();
        assert!(matches!(
            err,
            MetadataError::Reconstruction { ref stage, source: ParameterError::Missing(_), .. } if stage == "build"
        ));
    }

    #[test]
    fn wrong_target_type_is_reconstruction_error() {
        let (_dir, ctx) = context();
        let metadata = ctx
            .describe(&SimpleClass::new("s", 1, at("2024-01-01T00:00:00Z")))
            .unwrap();
        let err = metadata.durable::<ContainerClass>().unwrap_err();
        assert!(matches!(err, MetadataError::Reconstruction { ref stage, .. } if stage == "downcast"));
    }

    #[test]
    fn absent_optional_value_is_null_error() {
        let (_dir, ctx) = context();
        let err = Metadata::from_builder_id("demo", &ctx)
            .with_optional_parameter::<i64>("maybe", None)
            .unwrap_err();
        assert!(matches!(err, MetadataError::NullValue { ref name } if name == "maybe"));

        let metadata = Metadata::from_builder_id("demo", &ctx)
            .with_optional_parameter("maybe", Some(1i64))
            .unwrap();
        assert_eq!(metadata.len(), 1);
    }

    fn chain(ctx: &Durability, levels: usize) -> MetadataResult<Metadata> {
        let mut metadata = Metadata::from_builder_id("leaf", ctx);
        for _ in 0..levels {
            metadata = Metadata::from_builder_id("node", ctx).with_parameter("child", metadata)?;
        }
        Ok(metadata)
    }

    #[test]
    fn nesting_at_limit_roundtrips_through_bytes() {
        let (_dir, ctx) = context();
        let metadata = chain(&ctx, MAX_NESTING_DEPTH).unwrap();
        assert_eq!(metadata.nesting(), MAX_NESTING_DEPTH);

        let decoded = Metadata::from_bytes(&metadata.to_bytes(), &ctx).unwrap();
        assert_eq!(decoded.nesting(), MAX_NESTING_DEPTH);
        assert_eq!(decoded, metadata);
    }

    #[test]
    fn nesting_past_limit_is_rejected_when_added() {
        let (_dir, ctx) = context();
        let at_limit = chain(&ctx, MAX_NESTING_DEPTH).unwrap();
        let err = Metadata::from_builder_id("node", &ctx)
            .with_parameter("child", at_limit.clone())
            .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedRecord(_)));

        let err = Metadata::from_builder_id("node", &ctx)
            .with_parameter("children", Value::Array(vec![Value::Metadata(at_limit)]))
            .unwrap_err();
        assert!(matches!(err, MetadataError::MalformedRecord(_)));
    }

    #[test]
    fn nesting_past_limit_is_malformed_from_bytes() {
        let (_dir, ctx) = context();
        let mut json = json!({"builderId": "leaf", "parameters": {}});
        for _ in 0..(MAX_NESTING_DEPTH + 1) {
            json = json!({
                "builderId": "node",
                "parameters": {"child": {"type": "METADATA", "value": json}}
            });
        }
        let err = Metadata::from_bytes(json.to_string().as_bytes(), &ctx).unwrap_err();
        assert!(matches!(err, MetadataError::MalformedRecord(_)), "{err:?}");
    }

    #[test]
    fn replacing_deep_parameter_lowers_nesting() {
        let (_dir, ctx) = context();
        let metadata = Metadata::from_builder_id("node", &ctx)
            .with_parameter("child", chain(&ctx, 3).unwrap())
            .unwrap();
        assert_eq!(metadata.nesting(), 4);
        let metadata = metadata.with_parameter("child", 1).unwrap();
        assert_eq!(metadata.nesting(), 0);
    }

    #[test]
    fn nesting_deeper_than_limit_is_malformed() {
        let (_dir, ctx) = context();
        let mut json = json!({"builderId": "leaf", "parameters": {}});
        for _ in 0..(MAX_NESTING_DEPTH + 1) {
            json = json!({
                "builderId": "node",
                "parameters": {"child": {"type": "METADATA", "value": json}}
            });
        }
        let record: WireRecord = serde_json::from_value(json).unwrap();
        let err = Metadata::from_wire(record, &ctx).unwrap_err();
        assert!(matches!(err, MetadataError::MalformedRecord(_)));
    }

    // -----------------------------------------------------------------------
    // Hashes
    // -----------------------------------------------------------------------

    #[test]
    fn identical_content_gives_identical_hash() {
        let (_dir, ctx) = context();
        let payload = random_bytes(2_048, 3);
        let a = ctx
            .describe(&BinaryHolder {
                name: "v1".into(),
                payload: payload.clone(),
            })
            .unwrap();
        let b = ctx
            .describe(&BinaryHolder {
                name: "v2".into(),
                payload,
            })
            .unwrap();
        assert_eq!(a.hashes().len(), 1);
        assert_eq!(a.hashes(), b.hashes());
    }

    #[test]
    fn hashes_include_nested_records() {
        let (_dir, ctx) = context();
        let inner = ctx
            .describe(&BinaryHolder {
                name: "inner".into(),
                payload: b"inner bytes".to_vec(),
            })
            .unwrap();
        let outer = Metadata::from_builder_id("outer", &ctx)
            .with_parameter("inner", inner.clone())
            .unwrap()
            .with_parameter("own", b"outer bytes".to_vec())
            .unwrap();
        let hashes = outer.hashes();
        assert_eq!(hashes.len(), 2);
        assert!(inner.hashes().is_subset(&hashes));
    }
}
