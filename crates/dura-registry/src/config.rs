use dura_types::StorageKey;
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};

/// Registry settings.
///
/// ```toml
/// record_namespace = "records"
/// content_namespace = "content"
/// upload_parallelism = 4
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Top-level key segment under which records are stored.
    pub record_namespace: String,
    /// Top-level key segment under which content blobs are stored.
    pub content_namespace: String,
    /// Maximum number of blobs written concurrently during a commit.
    pub upload_parallelism: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            record_namespace: "records".into(),
            content_namespace: "content".into(),
            upload_parallelism: 4,
        }
    }
}

impl RegistryConfig {
    /// Parse and validate settings from TOML. Missing fields take defaults.
    pub fn from_toml_str(text: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RegistryResult<()> {
        for (field, value) in [
            ("record_namespace", &self.record_namespace),
            ("content_namespace", &self.content_namespace),
        ] {
            StorageKey::new([value.as_str()])
                .map_err(|e| RegistryError::Config(format!("{field}: {e}")))?;
        }
        if self.record_namespace == self.content_namespace {
            return Err(RegistryError::Config(
                "record and content namespaces must differ".into(),
            ));
        }
        if self.upload_parallelism == 0 {
            return Err(RegistryError::Config(
                "upload_parallelism must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub(crate) fn record_root(&self) -> RegistryResult<StorageKey> {
        Ok(StorageKey::new([self.record_namespace.as_str()])?)
    }

    pub(crate) fn content_root(&self) -> RegistryResult<StorageKey> {
        Ok(StorageKey::new([self.content_namespace.as_str()])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = RegistryConfig::default();
        assert_eq!(c.record_namespace, "records");
        assert_eq!(c.content_namespace, "content");
        assert_eq!(c.upload_parallelism, 4);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn parse_partial_toml() {
        let c = RegistryConfig::from_toml_str("upload_parallelism = 16\n").unwrap();
        assert_eq!(c.upload_parallelism, 16);
        assert_eq!(c.record_namespace, "records");
    }

    #[test]
    fn parse_full_toml() {
        let c = RegistryConfig::from_toml_str(
            r#"
            record_namespace = "models"
            content_namespace = "blobs"
            upload_parallelism = 1
            "#,
        )
        .unwrap();
        assert_eq!(c.record_namespace, "models");
        assert_eq!(c.content_namespace, "blobs");
    }

    #[test]
    fn invalid_values_are_rejected() {
        for text in [
            "upload_parallelism = 0",
            "record_namespace = \"a/b\"",
            "content_namespace = \"..\"",
            "record_namespace = \"\"",
            "record_namespace = \"same\"\ncontent_namespace = \"same\"",
            "upload_parallelism = \"many\"",
        ] {
            assert!(
                matches!(RegistryConfig::from_toml_str(text), Err(RegistryError::Config(_))),
                "{text} was accepted"
            );
        }
    }
}
