use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::{ConfigGraph, Pipeline, Template};
use crate::artifact::ArtifactStore;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Toml,
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Picks the format from a file extension; `None` when it says nothing.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Serialized form of a configuration graph.
///
/// This is what config-loading infrastructure hands over; it only becomes a
/// `ConfigGraph` once the structural checks in `ConfigGraph::new` pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Snapshot {
    #[serde(default)]
    pub artifact_stores: Vec<ArtifactStore>,
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub pipelines: Vec<Pipeline>,
}

impl Snapshot {
    /// Load a snapshot from a TOML, JSON or YAML file.
    ///
    /// Files without a recognised extension are tried as TOML, then JSON, then YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        debug!("Read configuration snapshot from {}", path.display());

        match SnapshotFormat::from_path(path) {
            Some(format) => Self::parse(&contents, format),
            None => Self::parse(&contents, SnapshotFormat::Toml)
                .or_else(|_| Self::parse(&contents, SnapshotFormat::Json))
                .or_else(|_| Self::parse(&contents, SnapshotFormat::Yaml)),
        }
    }

    pub fn parse(contents: &str, format: SnapshotFormat) -> Result<Self> {
        let snapshot = match format {
            SnapshotFormat::Toml => toml::from_str(contents)?,
            SnapshotFormat::Json => serde_json::from_str(contents)?,
            SnapshotFormat::Yaml => serde_yaml::from_str(contents)?,
        };
        Ok(snapshot)
    }

    pub fn into_graph(self) -> Result<ConfigGraph> {
        ConfigGraph::new(self.pipelines, self.templates, self.artifact_stores)
    }
}

impl From<&ConfigGraph> for Snapshot {
    fn from(graph: &ConfigGraph) -> Self {
        Self {
            artifact_stores: graph.artifact_stores().iter().cloned().collect(),
            templates: graph.templates().cloned().collect(),
            pipelines: graph.pipelines().cloned().collect(),
        }
    }
}
