//! Durable types shared by the unit tests.

use chrono::{DateTime, Utc};

use crate::builder::{ComponentBuilder, Durable, Setters};
use crate::context::Durability;
use crate::error::{MetadataResult, ParameterError};
use crate::metadata::Metadata;
use crate::value::{Real, Value};

pub fn register_fixtures(context: &Durability) {
    context.register::<SimpleClass>();
    context.register::<ContainerClass>();
    context.register::<BinaryHolder>();
    context.register::<CollectionHolder>();
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct SimpleClass {
    pub name: String,
    pub count: i32,
    pub created: DateTime<Utc>,
    pub score: f64,
    pub weight: f32,
}

impl SimpleClass {
    pub fn new(name: &str, count: i32, created: DateTime<Utc>) -> Self {
        Self {
            name: name.to_string(),
            count,
            created,
            score: f64::from(count) * 0.25,
            weight: 0.75,
        }
    }
}

#[derive(Default)]
pub struct SimpleClassBuilder {
    name: Option<String>,
    count: Option<i32>,
    created: Option<DateTime<Utc>>,
    score: f64,
    weight: f32,
}

impl ComponentBuilder for SimpleClassBuilder {
    type Output = SimpleClass;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new()
            .with("name", |b, v| {
                b.name = Some(v.into_string()?);
                Ok(())
            })
            .with("count", |b, v| {
                b.count = Some(v.into_i32()?);
                Ok(())
            })
            .with("created", |b, v| {
                b.created = Some(v.into_instant()?);
                Ok(())
            })
            .with("score", |b, v| {
                b.score = v.into_f64()?;
                Ok(())
            })
            .with("weight", |b, v| {
                b.weight = v.into_f32()?;
                Ok(())
            })
    }

    fn build(self) -> Result<SimpleClass, ParameterError> {
        Ok(SimpleClass {
            name: self.name.ok_or(ParameterError::Missing("name"))?,
            count: self.count.ok_or(ParameterError::Missing("count"))?,
            created: self.created.ok_or(ParameterError::Missing("created"))?,
            score: self.score,
            weight: self.weight,
        })
    }
}

impl Durable for SimpleClass {
    const BUILDER_ID: &'static str = "dura.test.SimpleClass";
    type Builder = SimpleClassBuilder;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        metadata
            .with_parameter("name", &self.name)?
            .with_parameter("count", self.count)?
            .with_parameter("created", self.created)?
            .with_parameter("score", self.score)?
            .with_parameter("weight", self.weight)
    }
}

// ---------------------------------------------------------------------------
// Nesting
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerClass {
    pub label: String,
    pub inner: SimpleClass,
}

#[derive(Default)]
pub struct ContainerClassBuilder {
    label: Option<String>,
    inner: Option<SimpleClass>,
}

impl ComponentBuilder for ContainerClassBuilder {
    type Output = ContainerClass;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new()
            .with("label", |b, v| {
                b.label = Some(v.into_string()?);
                Ok(())
            })
            .with("inner", |b, v| {
                b.inner = Some(v.into_durable()?);
                Ok(())
            })
    }

    fn build(self) -> Result<ContainerClass, ParameterError> {
        Ok(ContainerClass {
            label: self.label.ok_or(ParameterError::Missing("label"))?,
            inner: self.inner.ok_or(ParameterError::Missing("inner"))?,
        })
    }
}

impl Durable for ContainerClass {
    const BUILDER_ID: &'static str = "dura.test.ContainerClass";
    type Builder = ContainerClassBuilder;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        metadata
            .with_parameter("label", &self.label)?
            .with_durable("inner", &self.inner)
    }
}

// ---------------------------------------------------------------------------
// Binary content
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryHolder {
    pub name: String,
    pub payload: Vec<u8>,
}

#[derive(Default)]
pub struct BinaryHolderBuilder {
    name: Option<String>,
    payload: Option<Vec<u8>>,
}

impl ComponentBuilder for BinaryHolderBuilder {
    type Output = BinaryHolder;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new()
            .with("name", |b, v| {
                b.name = Some(v.into_string()?);
                Ok(())
            })
            .with("payload", |b, v| {
                b.payload = Some(v.into_bytes()?);
                Ok(())
            })
    }

    fn build(self) -> Result<BinaryHolder, ParameterError> {
        Ok(BinaryHolder {
            name: self.name.ok_or(ParameterError::Missing("name"))?,
            payload: self.payload.ok_or(ParameterError::Missing("payload"))?,
        })
    }
}

impl Durable for BinaryHolder {
    const BUILDER_ID: &'static str = "dura.test.BinaryHolder";
    type Builder = BinaryHolderBuilder;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        metadata
            .with_parameter("name", &self.name)?
            .with_parameter("payload", Value::reader(std::io::Cursor::new(self.payload.clone())))
    }
}

// ---------------------------------------------------------------------------
// Collections
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct CollectionHolder {
    pub tags: Vec<String>,
    pub empty: Vec<i64>,
    pub samples: Vec<f64>,
    pub children: Vec<SimpleClass>,
}

#[derive(Default)]
pub struct CollectionHolderBuilder {
    tags: Option<Vec<String>>,
    empty: Option<Vec<i64>>,
    samples: Option<Vec<f64>>,
    children: Option<Vec<SimpleClass>>,
}

impl ComponentBuilder for CollectionHolderBuilder {
    type Output = CollectionHolder;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new()
            .with("tags", |b, v| {
                b.tags = Some(v.into_vec(Real::into_string)?);
                Ok(())
            })
            .with("empty", |b, v| {
                b.empty = Some(v.into_vec(Real::into_i64)?);
                Ok(())
            })
            .with("samples", |b, v| {
                b.samples = Some(v.into_vec(Real::into_f64)?);
                Ok(())
            })
            .with("children", |b, v| {
                b.children = Some(v.into_vec(Real::into_durable::<SimpleClass>)?);
                Ok(())
            })
    }

    fn build(self) -> Result<CollectionHolder, ParameterError> {
        Ok(CollectionHolder {
            tags: self.tags.ok_or(ParameterError::Missing("tags"))?,
            empty: self.empty.ok_or(ParameterError::Missing("empty"))?,
            samples: self.samples.ok_or(ParameterError::Missing("samples"))?,
            children: self.children.ok_or(ParameterError::Missing("children"))?,
        })
    }
}

impl Durable for CollectionHolder {
    const BUILDER_ID: &'static str = "dura.test.CollectionHolder";
    type Builder = CollectionHolderBuilder;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        metadata
            .with_parameter("tags", Value::array(&self.tags))?
            .with_parameter("empty", Value::array(self.empty.iter().copied()))?
            .with_parameter("samples", Value::array(self.samples.iter().copied()))?
            .with_durables("children", &self.children)
    }
}
