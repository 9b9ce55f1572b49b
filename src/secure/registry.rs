use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{LineageError, Result};

/// Settings an artifact plugin declares for its fetch step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginMetadata {
    pub id: String,
    #[serde(default)]
    pub fetch_settings: Vec<SettingMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingMetadata {
    pub key: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub required: bool,
}

impl PluginMetadata {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fetch_settings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, secure: bool) -> Self {
        self.fetch_settings.push(SettingMetadata {
            key: key.into(),
            secure,
            required: false,
        });
        self
    }

    /// Keys compare case-sensitively.
    pub fn is_secure(&self, key: &str) -> bool {
        self.fetch_settings
            .iter()
            .any(|setting| setting.secure && setting.key == key)
    }
}

/// Read access to the metadata of loaded artifact plugins.
pub trait PluginMetadataRegistry {
    fn lookup(&self, plugin_id: &str) -> Option<&PluginMetadata>;
}

impl<T: PluginMetadataRegistry + ?Sized> PluginMetadataRegistry for &T {
    fn lookup(&self, plugin_id: &str) -> Option<&PluginMetadata> {
        (**self).lookup(plugin_id)
    }
}

/// In-memory registry keyed by plugin id.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, PluginMetadata>,
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    plugins: Vec<PluginMetadata>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces and returns any metadata already registered under the same id.
    pub fn register(&mut self, metadata: PluginMetadata) -> Option<PluginMetadata> {
        self.plugins.insert(metadata.id.clone(), metadata)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Reads a `plugins = [...]` document from a TOML, JSON or YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let file: RegistryFile = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents)?,
            Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
            Some("toml") | None => toml::from_str(&contents)?,
            Some(other) => {
                return Err(LineageError::Config(format!(
                    "Unsupported plugin metadata format '{other}' for {}",
                    path.display()
                )))
            }
        };

        let mut registry = Self::new();
        for metadata in file.plugins {
            if let Some(previous) = registry.register(metadata) {
                debug!("Plugin '{}' registered twice; keeping the last entry", previous.id);
            }
        }
        debug!("Loaded metadata for {} plugins from {}", registry.len(), path.display());
        Ok(registry)
    }
}

impl PluginMetadataRegistry for PluginRegistry {
    fn lookup(&self, plugin_id: &str) -> Option<&PluginMetadata> {
        self.plugins.get(plugin_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_secure_keys_are_case_sensitive() {
        let metadata = PluginMetadata::new("cd.go.artifact.s3")
            .with_setting("SecretKey", true)
            .with_setting("Region", false);

        assert!(metadata.is_secure("SecretKey"));
        assert!(!metadata.is_secure("secretkey"));
        assert!(!metadata.is_secure("Region"));
    }

    #[test]
    fn test_register_replaces_previous_metadata() {
        let mut registry = PluginRegistry::new();
        registry.register(PluginMetadata::new("p"));

        let previous = registry.register(PluginMetadata::new("p").with_setting("Token", true));

        assert!(previous.is_some());
        assert!(registry.lookup("p").unwrap().is_secure("Token"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(
            file,
            r#"
[[plugins]]
id = "cd.go.artifact.s3"

[[plugins.fetch-settings]]
key = "SecretKey"
secure = true

[[plugins.fetch-settings]]
key = "Destination"
"#
        )
        .unwrap();

        let registry = PluginRegistry::load(file.path()).unwrap();

        let metadata = registry.lookup("cd.go.artifact.s3").unwrap();
        assert_eq!(metadata.fetch_settings.len(), 2);
        assert!(metadata.is_secure("SecretKey"));
        assert!(!metadata.is_secure("Destination"));
    }

    #[test]
    fn test_load_from_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        write!(
            file,
            r#"{{"plugins": [{{"id": "docker", "fetch-settings": [{{"key": "Password", "secure": true}}]}}]}}"#
        )
        .unwrap();

        let registry = PluginRegistry::load(file.path()).unwrap();

        assert!(registry.lookup("docker").unwrap().is_secure("Password"));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let file = NamedTempFile::with_suffix(".ini").unwrap();

        assert!(PluginRegistry::load(file.path()).is_err());
    }
}
