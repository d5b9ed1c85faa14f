use dura_metadata::{
    ComponentBuilder, Durable, Metadata, MetadataResult, ParameterError, Setters,
};
use dura_store::KeyValueStore;

use crate::config::RegistryConfig;

/// Everything needed to open a registry again: its store and its settings.
///
/// The store is nested as its own record, so any durable backend works.
/// See [`DurableRegistry::describe`](crate::DurableRegistry::describe) and
/// [`DurableRegistry::restore`](crate::DurableRegistry::restore).
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrySettings<S> {
    pub store: S,
    pub config: RegistryConfig,
}

pub struct RegistrySettingsBuilder<S> {
    store: Option<S>,
    config: RegistryConfig,
}

impl<S> Default for RegistrySettingsBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            config: RegistryConfig::default(),
        }
    }
}

impl<S: KeyValueStore + Durable> ComponentBuilder for RegistrySettingsBuilder<S> {
    type Output = RegistrySettings<S>;

    fn setters() -> Setters<Self> {
        Setters::<Self>::new()
            .with("storage", |b, v| {
                b.store = Some(v.into_durable::<S>()?);
                Ok(())
            })
            .with("record_namespace", |b, v| {
                b.config.record_namespace = v.into_string()?;
                Ok(())
            })
            .with("content_namespace", |b, v| {
                b.config.content_namespace = v.into_string()?;
                Ok(())
            })
            .with("upload_parallelism", |b, v| {
                let value = v.into_i64()?;
                b.config.upload_parallelism =
                    usize::try_from(value).map_err(|_| ParameterError::OutOfRange {
                        value,
                        target: "usize",
                    })?;
                Ok(())
            })
    }

    fn build(self) -> Result<RegistrySettings<S>, ParameterError> {
        let store = self.store.ok_or(ParameterError::Missing("storage"))?;
        self.config
            .validate()
            .map_err(|e| ParameterError::Invalid(e.to_string()))?;
        Ok(RegistrySettings {
            store,
            config: self.config,
        })
    }
}

impl<S: KeyValueStore + Durable> Durable for RegistrySettings<S> {
    const BUILDER_ID: &'static str = "dura.registry.DurableRegistry";
    type Builder = RegistrySettingsBuilder<S>;

    fn describe(&self, metadata: Metadata) -> MetadataResult<Metadata> {
        describe_settings(&self.store, &self.config, metadata)
    }
}

pub(crate) fn describe_settings<S: Durable>(
    store: &S,
    config: &RegistryConfig,
    metadata: Metadata,
) -> MetadataResult<Metadata> {
    let parallelism = i64::try_from(config.upload_parallelism).unwrap_or(i64::MAX);
    metadata
        .with_durable("storage", store)?
        .with_parameter("record_namespace", &config.record_namespace)?
        .with_parameter("content_namespace", &config.content_namespace)?
        .with_parameter("upload_parallelism", parallelism)
}
