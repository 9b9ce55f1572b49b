use std::fmt;

use serde::{Deserialize, Serialize};

use super::name::CaseInsensitiveName;
use crate::artifact::ArtifactConfig;
use crate::task::FetchTask;

/// Where a pipeline definition lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Origin {
    /// Stored in the orchestrator's own configuration and editable in place.
    #[default]
    File,
    /// Versioned together with a source repository.
    ConfigRepo {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        revision: Option<String>,
    },
}

impl Origin {
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File)
    }

    pub fn is_config_repo(&self) -> bool {
        matches!(self, Self::ConfigRepo { .. })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("the configuration file"),
            Self::ConfigRepo {
                url,
                revision: Some(revision),
            } => write!(f, "config repository {url} at revision {revision}"),
            Self::ConfigRepo { url, revision: None } => write!(f, "config repository {url}"),
        }
    }
}

/// "Downstream requires `pipeline :: stage` to complete."
///
/// Declared on the downstream pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub pipeline: CaseInsensitiveName,
    pub stage: CaseInsensitiveName,
}

impl DependencyEdge {
    pub fn new(pipeline: impl Into<CaseInsensitiveName>, stage: impl Into<CaseInsensitiveName>) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: stage.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Job {
    pub name: CaseInsensitiveName,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<FetchTask>,
}

impl Job {
    pub fn new(name: impl Into<CaseInsensitiveName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_artifact(mut self, artifact: ArtifactConfig) -> Self {
        self.artifacts.push(artifact);
        self
    }

    #[must_use]
    pub fn with_task(mut self, task: FetchTask) -> Self {
        self.tasks.push(task);
        self
    }
}

/// Stage declaration order is significant: a stage runs after every stage
/// declared before it in the same pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stage {
    pub name: CaseInsensitiveName,
    #[serde(default)]
    pub jobs: Vec<Job>,
}

impl Stage {
    pub fn new(name: impl Into<CaseInsensitiveName>, jobs: Vec<Job>) -> Self {
        Self {
            name: name.into(),
            jobs,
        }
    }

    pub fn job(&self, name: &CaseInsensitiveName) -> Option<&Job> {
        self.jobs.iter().find(|job| &job.name == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: CaseInsensitiveName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub origin: Origin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencyEdge>,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<CaseInsensitiveName>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    #[must_use]
    pub fn depends_on(
        mut self,
        pipeline: impl Into<CaseInsensitiveName>,
        stage: impl Into<CaseInsensitiveName>,
    ) -> Self {
        self.dependencies.push(DependencyEdge::new(pipeline, stage));
        self
    }

    #[must_use]
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage(&self, name: &CaseInsensitiveName) -> Option<&Stage> {
        self.stages.iter().find(|stage| &stage.name == name)
    }

    /// Declaration position of a stage.
    pub fn stage_index(&self, name: &CaseInsensitiveName) -> Option<usize> {
        self.stages.iter().position(|stage| &stage.name == name)
    }

    /// Every edge this pipeline declares towards `upstream`.
    pub fn edges_to<'a>(
        &'a self,
        upstream: &'a CaseInsensitiveName,
    ) -> impl Iterator<Item = &'a DependencyEdge> + 'a {
        self.dependencies
            .iter()
            .filter(move |edge| &edge.pipeline == upstream)
    }

    pub fn depends_directly_on(&self, upstream: &CaseInsensitiveName) -> bool {
        self.edges_to(upstream).next().is_some()
    }
}

/// Reusable stage list; tasks inside it have no position in the dependency
/// graph until a pipeline instantiates the template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    pub name: CaseInsensitiveName,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

impl Template {
    pub fn new(name: impl Into<CaseInsensitiveName>, stages: Vec<Stage>) -> Self {
        Self {
            name: name.into(),
            stages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_index_follows_declaration_order() {
        let pipeline = Pipeline::new("p")
            .with_stage(Stage::new("s1", vec![]))
            .with_stage(Stage::new("S2", vec![]));

        assert_eq!(pipeline.stage_index(&"s1".into()), Some(0));
        assert_eq!(pipeline.stage_index(&"s2".into()), Some(1));
        assert_eq!(pipeline.stage_index(&"s3".into()), None);
    }

    #[test]
    fn test_edges_to_upstream() {
        let pipeline = Pipeline::new("downstream")
            .depends_on("upstream", "up-stage1")
            .depends_on("other", "o1");

        assert!(pipeline.depends_directly_on(&"UPSTREAM".into()));
        assert!(!pipeline.depends_directly_on(&"dummy".into()));
        assert_eq!(pipeline.edges_to(&"other".into()).count(), 1);
    }

    #[test]
    fn test_origin_display() {
        let repo = Origin::ConfigRepo {
            url: "https://example.com/repo.git".to_string(),
            revision: Some("abc123".to_string()),
        };

        assert_eq!(Origin::File.to_string(), "the configuration file");
        assert_eq!(
            repo.to_string(),
            "config repository https://example.com/repo.git at revision abc123"
        );
    }

    #[test]
    fn test_origin_deserializes_from_tagged_table() {
        let origin: Origin =
            serde_json::from_str(r#"{"type": "config_repo", "url": "git@host:repo"}"#).unwrap();

        assert!(origin.is_config_repo());
        assert!(Origin::default().is_file());
    }
}
