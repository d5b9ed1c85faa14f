//! Capability contracts and the builder registration table.
//!
//! A [`Durable`] names the [`ComponentBuilder`] that reconstructs it. Each
//! builder exposes a closed table of named [`Setters`]; reconstruction walks
//! the parameters of a record and applies each one through the setter of the
//! same name. Builders are found at decode time by identifier through a
//! [`BuilderRegistry`] populated up front.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{MetadataError, MetadataResult, ParameterError};
use crate::metadata::Metadata;
use crate::value::Real;

/// Applies one reconstructed value to a builder.
pub type Setter<B> = fn(&mut B, Real) -> Result<(), ParameterError>;

/// The named single-argument setters a builder accepts.
pub struct Setters<B> {
    table: BTreeMap<&'static str, Setter<B>>,
}

impl<B> Setters<B> {
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Add a setter under `name`, replacing any previous one.
    pub fn with(mut self, name: &'static str, setter: Setter<B>) -> Self {
        self.table.insert(name, setter);
        self
    }

    pub fn get(&self, name: &str) -> Option<Setter<B>> {
        self.table.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    /// Setter names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl<B> Default for Setters<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for Setters<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

/// Single-use accumulator turning named parameter values into one instance.
pub trait ComponentBuilder: Default + Send + 'static {
    /// The type this builder produces.
    type Output: Send + 'static;

    /// Every parameter this builder accepts.
    fn setters() -> Setters<Self>;

    /// Consume the builder and produce the instance.
    fn build(self) -> Result<Self::Output, ParameterError>;
}

/// A domain object that can describe itself as a [`Metadata`] record.
pub trait Durable: Sized + Send + 'static {
    /// Identifier stored in records and used to find the builder again.
    const BUILDER_ID: &'static str;

    type Builder: ComponentBuilder<Output = Self>;

    /// Add this object's parameters to `metadata`, which starts empty and
    /// already carries [`Self::BUILDER_ID`].
    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata>;

    /// A fresh builder for this type.
    fn builder() -> Self::Builder {
        Self::Builder::default()
    }
}

/// Object-safe view of a builder in the middle of a reconstruction.
pub trait DynBuilder: Send {
    fn has_setter(&self, name: &str) -> bool;

    fn apply(&mut self, name: &str, value: Real) -> Result<(), ParameterError>;

    fn build(self: Box<Self>) -> Result<Box<dyn Any + Send>, ParameterError>;
}

struct TypedBuilder<B: ComponentBuilder> {
    builder: B,
    setters: Setters<B>,
}

impl<B: ComponentBuilder> DynBuilder for TypedBuilder<B> {
    fn has_setter(&self, name: &str) -> bool {
        self.setters.contains(name)
    }

    fn apply(&mut self, name: &str, value: Real) -> Result<(), ParameterError> {
        let setter = self
            .setters
            .get(name)
            .ok_or_else(|| ParameterError::Invalid(format!("no setter named {name:?}")))?;
        setter(&mut self.builder, value)
    }

    fn build(self: Box<Self>) -> Result<Box<dyn Any + Send>, ParameterError> {
        let output = self.builder.build()?;
        Ok(Box::new(output))
    }
}

/// Creates fresh builders for one identifier.
pub trait BuilderFactory: Send + Sync {
    fn builder_id(&self) -> &str;

    fn create(&self) -> Box<dyn DynBuilder>;
}

/// The factory for a [`Durable`] type's own builder.
pub struct DurableFactory<T>(PhantomData<fn() -> T>);

impl<T: Durable> DurableFactory<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Durable> Default for DurableFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Durable> BuilderFactory for DurableFactory<T> {
    fn builder_id(&self) -> &str {
        T::BUILDER_ID
    }

    fn create(&self) -> Box<dyn DynBuilder> {
        Box::new(TypedBuilder {
            builder: T::builder(),
            setters: T::Builder::setters(),
        })
    }
}

/// Registration table from builder identifier to factory.
///
/// Resolution is two-phase: [`try_resolve`](Self::try_resolve) never fails
/// and is what decoding uses, [`resolve`](Self::resolve) turns a miss into
/// [`MetadataError::NoBuilder`].
#[derive(Default)]
pub struct BuilderRegistry {
    factories: RwLock<HashMap<String, Arc<dyn BuilderFactory>>>,
}

impl BuilderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the builder of `T`. Returns `true` if an earlier
    /// registration for the same identifier was replaced.
    pub fn register<T: Durable>(&self) -> bool {
        self.register_factory(Arc::new(DurableFactory::<T>::new()))
    }

    pub fn register_factory(&self, factory: Arc<dyn BuilderFactory>) -> bool {
        let id = factory.builder_id().to_string();
        debug!(builder_id = %id, "registered builder");
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, factory)
            .is_some()
    }

    pub fn try_resolve(&self, builder_id: &str) -> Option<Arc<dyn BuilderFactory>> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(builder_id)
            .cloned()
    }

    pub fn resolve(&self, builder_id: &str) -> MetadataResult<Arc<dyn BuilderFactory>> {
        self.try_resolve(builder_id)
            .ok_or_else(|| MetadataError::NoBuilder {
                builder_id: builder_id.to_string(),
            })
    }

    pub fn contains(&self, builder_id: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(builder_id)
    }

    pub fn len(&self) -> usize {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered identifiers in sorted order.
    pub fn builder_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

impl fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuilderRegistry")
            .field("builder_ids", &self.builder_ids())
            .finish()
    }
}
