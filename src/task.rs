use serde::{Deserialize, Serialize};

use crate::configuration::ConfigurationProperty;
use crate::graph::{CaseInsensitiveName, PathFromAncestor};

/// A job step that copies an artifact produced by another job.
///
/// The `artifact-origin` field selects the variant: `builtin` for files the
/// orchestrator copies itself, `external` for artifacts kept in a plugin
/// backed artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "artifact-origin", rename_all = "lowercase")]
pub enum FetchTask {
    Builtin(BuiltinFetchTask),
    #[serde(rename = "external")]
    Pluggable(PluggableFetchTask),
}

impl FetchTask {
    /// Empty when fetching from the pipeline that owns the task.
    pub fn pipeline(&self) -> &PathFromAncestor {
        match self {
            Self::Builtin(task) => &task.pipeline,
            Self::Pluggable(task) => &task.pipeline,
        }
    }

    pub fn stage(&self) -> &CaseInsensitiveName {
        match self {
            Self::Builtin(task) => &task.stage,
            Self::Pluggable(task) => &task.stage,
        }
    }

    pub fn job(&self) -> &CaseInsensitiveName {
        match self {
            Self::Builtin(task) => &task.job,
            Self::Pluggable(task) => &task.job,
        }
    }

    pub fn as_pluggable(&self) -> Option<&PluggableFetchTask> {
        match self {
            Self::Pluggable(task) => Some(task),
            Self::Builtin(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BuiltinFetchTask {
    #[serde(default)]
    pub pipeline: PathFromAncestor,
    #[serde(default)]
    pub stage: CaseInsensitiveName,
    #[serde(default)]
    pub job: CaseInsensitiveName,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub is_source_a_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl BuiltinFetchTask {
    pub fn new(
        pipeline: impl Into<PathFromAncestor>,
        stage: impl Into<CaseInsensitiveName>,
        job: impl Into<CaseInsensitiveName>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: stage.into(),
            job: job.into(),
            source: source.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluggableFetchTask {
    #[serde(default)]
    pub pipeline: PathFromAncestor,
    #[serde(default)]
    pub stage: CaseInsensitiveName,
    #[serde(default)]
    pub job: CaseInsensitiveName,
    #[serde(default)]
    pub artifact_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub configuration: Vec<ConfigurationProperty>,
}

impl PluggableFetchTask {
    pub fn new(
        pipeline: impl Into<PathFromAncestor>,
        stage: impl Into<CaseInsensitiveName>,
        job: impl Into<CaseInsensitiveName>,
        artifact_id: impl Into<String>,
    ) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: stage.into(),
            job: job.into(),
            artifact_id: artifact_id.into(),
            configuration: Vec::new(),
        }
    }

    /// Fetch from an earlier stage of the pipeline that owns the task.
    pub fn from_current_pipeline(
        stage: impl Into<CaseInsensitiveName>,
        job: impl Into<CaseInsensitiveName>,
        artifact_id: impl Into<String>,
    ) -> Self {
        Self::new(PathFromAncestor::default(), stage, job, artifact_id)
    }

    #[must_use]
    pub fn with_configuration(mut self, configuration: Vec<ConfigurationProperty>) -> Self {
        self.configuration = configuration;
        self
    }
}

impl From<PluggableFetchTask> for FetchTask {
    fn from(task: PluggableFetchTask) -> Self {
        Self::Pluggable(task)
    }
}

impl From<BuiltinFetchTask> for FetchTask {
    fn from(task: BuiltinFetchTask) -> Self {
        Self::Builtin(task)
    }
}
