mod representer;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::configuration::ConfigurationProperty;
use crate::error::{LineageError, Result};

pub use representer::{from_json, to_json, ConfigHelperOptions};

/// Artifact declared by a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactConfig {
    Build(BuiltinArtifact),
    Test(BuiltinArtifact),
    /// Published through an artifact plugin; serialized as `external`.
    #[serde(rename = "external")]
    Pluggable(PluggableArtifact),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactType {
    Build,
    Test,
    External,
}

impl ArtifactType {
    pub const ALL: [Self; 3] = [Self::Build, Self::Test, Self::External];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::Test => "test",
            Self::External => "external",
        }
    }
}

impl ArtifactConfig {
    pub fn artifact_type(&self) -> ArtifactType {
        match self {
            Self::Build(_) => ArtifactType::Build,
            Self::Test(_) => ArtifactType::Test,
            Self::Pluggable(_) => ArtifactType::External,
        }
    }

    pub fn as_pluggable(&self) -> Option<&PluggableArtifact> {
        match self {
            Self::Pluggable(artifact) => Some(artifact),
            Self::Build(_) | Self::Test(_) => None,
        }
    }
}

/// File or directory copied by the orchestrator itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuiltinArtifact {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluggableArtifact {
    /// Unique among the pluggable artifacts of a job.
    pub id: String,
    pub store_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configuration: Vec<ConfigurationProperty>,
}

impl PluggableArtifact {
    pub fn new(id: impl Into<String>, store_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            store_id: store_id.into(),
            configuration: Vec::new(),
        }
    }
}

/// External artifact repository served by a plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactStore {
    pub id: String,
    pub plugin_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configuration: Vec<ConfigurationProperty>,
}

impl ArtifactStore {
    pub fn new(id: impl Into<String>, plugin_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            plugin_id: plugin_id.into(),
            configuration: Vec::new(),
        }
    }
}

/// Global artifact store registry, keyed by store id.
#[derive(Debug, Clone, Default)]
pub struct ArtifactStores {
    stores: IndexMap<String, ArtifactStore>,
}

impl ArtifactStores {
    pub fn new(stores: Vec<ArtifactStore>) -> Result<Self> {
        let mut by_id = IndexMap::with_capacity(stores.len());
        for store in stores {
            if by_id.contains_key(&store.id) {
                return Err(LineageError::InvalidGraph(format!(
                    "Artifact store '{}' is defined more than once",
                    store.id
                )));
            }
            by_id.insert(store.id.clone(), store);
        }
        Ok(Self { stores: by_id })
    }

    pub fn find(&self, id: &str) -> Option<&ArtifactStore> {
        self.stores.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtifactStore> {
        self.stores.values()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}
