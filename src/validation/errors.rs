use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use thiserror::Error;

use super::ancestry::DependencyLink;

/// `pipeline :: stage :: job` coordinates quoted in error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobLocator {
    pub pipeline: String,
    pub stage: String,
    pub job: String,
}

impl JobLocator {
    pub fn new(pipeline: impl fmt::Display, stage: impl fmt::Display, job: impl fmt::Display) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            stage: stage.to_string(),
            job: job.to_string(),
        }
    }
}

impl fmt::Display for JobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} :: {} :: {}", self.pipeline, self.stage, self.job)
    }
}

/// A user-correctable problem with one field of a fetch task.
///
/// The `Display` text is the message shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Stage is a required field.")]
    StageRequired,

    #[error("Job is a required field.")]
    JobRequired,

    #[error("Invalid fetch artifact artifactId name '{artifact_id}'. This must be alphanumeric and can contain underscores and periods (however, it cannot start with a period). The maximum allowed length is 255 characters.")]
    InvalidArtifactId { artifact_id: String },

    #[error("Duplicate key '{key}' found for Fetch pluggable artifact")]
    DuplicateConfigurationKey { key: String },

    #[error("Should provide either srcdir or srcfile")]
    SourceRequired,

    #[error("Destination '{destination}' must be a relative path that stays inside the working directory")]
    InvalidDestination { destination: String },

    #[error("Pipeline \"{pipeline}\" tries to fetch artifact from pipeline \"{target}\" which is not an upstream pipeline{}", path_hint(.candidate_paths, .more_paths))]
    NotAnUpstreamDependency {
        pipeline: String,
        target: String,
        /// Routes that would reach `target` if declared explicitly.
        candidate_paths: Vec<String>,
        /// Routes left out of `candidate_paths`.
        more_paths: usize,
    },

    #[error("Pipeline \"{pipeline}\" tries to fetch artifact from pipeline \"{target}\" which does not exist.")]
    PipelineNotFound { pipeline: String, target: String },

    #[error("Pipeline named '{ancestor}' exists, but is not an ancestor of '{pipeline}' as declared in '{path}'.")]
    NotAnAncestor {
        ancestor: String,
        pipeline: String,
        path: String,
    },

    #[error("Pipeline named '{ancestor}' which is declared ancestor of '{pipeline}' through path '{path}' does not exist.")]
    AncestorNotFound {
        ancestor: String,
        pipeline: String,
        path: String,
    },

    #[error("\"{requester}\" tries to fetch artifact from job \"{source_job}\" which is defined in {origin} - This is not allowed.")]
    IncompatibleOrigin {
        requester: JobLocator,
        source_job: JobLocator,
        origin: String,
    },

    #[error("\"{requester}\" tries to fetch artifact from stage \"{pipeline} :: {stage}\" which does not exist.")]
    StageNotFound {
        requester: JobLocator,
        pipeline: String,
        stage: String,
    },

    #[error("{}", incomplete_stage_message(.requester, .pipeline, .stage, .chain))]
    StageNotGuaranteedComplete {
        requester: JobLocator,
        pipeline: String,
        stage: String,
        /// Edges followed from the fetching pipeline to `pipeline`; empty
        /// when the stage belongs to the fetching pipeline itself.
        chain: Vec<DependencyLink>,
    },

    #[error("\"{requester}\" tries to fetch artifact from job \"{source_job}\" which does not exist.")]
    JobNotFound {
        requester: JobLocator,
        source_job: JobLocator,
    },

    #[error("Pluggable artifact with id `{artifact_id}` does not exist in [{}/{}/{}].", .source_job.pipeline, .source_job.stage, .source_job.job)]
    ArtifactIdNotFound {
        artifact_id: String,
        source_job: JobLocator,
    },
}

impl ValidationError {
    /// Stable identifier for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StageRequired => "StageRequired",
            Self::JobRequired => "JobRequired",
            Self::InvalidArtifactId { .. } => "InvalidArtifactId",
            Self::DuplicateConfigurationKey { .. } => "DuplicateConfigurationKey",
            Self::SourceRequired => "SourceRequired",
            Self::InvalidDestination { .. } => "InvalidDestination",
            Self::NotAnUpstreamDependency { .. } => "NotAnUpstreamDependency",
            Self::PipelineNotFound { .. } => "PipelineNotFound",
            Self::NotAnAncestor { .. } => "NotAnAncestor",
            Self::AncestorNotFound { .. } => "AncestorNotFound",
            Self::IncompatibleOrigin { .. } => "IncompatibleOrigin",
            Self::StageNotFound { .. } => "StageNotFound",
            Self::StageNotGuaranteedComplete { .. } => "StageNotGuaranteedComplete",
            Self::JobNotFound { .. } => "JobNotFound",
            Self::ArtifactIdNotFound { .. } => "ArtifactIdNotFound",
        }
    }

    /// Human-readable dependency chain for ordering failures.
    pub fn dependency_chain(&self) -> Option<String> {
        match self {
            Self::StageNotGuaranteedComplete { chain, .. } if !chain.is_empty() => Some(
                chain
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" -> "),
            ),
            _ => None,
        }
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let chain = self.dependency_chain();
        let mut state =
            serializer.serialize_struct("ValidationError", if chain.is_some() { 3 } else { 2 })?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.to_string())?;
        if let Some(chain) = chain {
            state.serialize_field("dependency_chain", &chain)?;
        }
        state.end()
    }
}

fn path_hint(candidate_paths: &[String], more_paths: &usize) -> String {
    match (candidate_paths, *more_paths) {
        ([], _) => String::new(),
        ([path], 0) => format!(". It is an ancestor; declare the path '{path}' to fetch from it"),
        (paths, more) => {
            let listed = paths
                .iter()
                .map(|path| format!("'{path}'"))
                .collect::<Vec<_>>()
                .join(", ");
            let rest = if more == 0 {
                String::new()
            } else {
                format!(" and {more} more")
            };
            format!(
                ". It is an ancestor reachable through several paths ({listed}{rest}); declare one of them to choose the route"
            )
        }
    }
}

fn incomplete_stage_message(
    requester: &JobLocator,
    pipeline: &str,
    stage: &str,
    chain: &[DependencyLink],
) -> String {
    if chain.is_empty() {
        format!(
            "\"{requester}\" tries to fetch artifact from its own stage \"{pipeline} :: {stage}\" which does not run before stage \"{}\".",
            requester.stage
        )
    } else {
        format!(
            "\"{requester}\" tries to fetch artifact from stage \"{pipeline} :: {stage}\" which does not complete before \"{}\" pipeline's dependencies.",
            requester.pipeline
        )
    }
}

/// Validation errors of one task, grouped by field name in the order they
/// were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: IndexMap<String, Vec<ValidationError>>,
}

impl FieldErrors {
    pub fn add(&mut self, field: impl Into<String>, error: ValidationError) {
        self.errors.entry(field.into()).or_default().push(error);
    }

    /// All messages on `field`, comma separated.
    pub fn on(&self, field: &str) -> Option<String> {
        self.errors.get(field).map(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })
    }

    pub fn get(&self, field: &str) -> &[ValidationError] {
        self.errors.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of messages across all fields.
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ValidationError])> {
        self.errors
            .iter()
            .map(|(field, errors)| (field.as_str(), errors.as_slice()))
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.errors.len()))?;
        for (field, errors) in &self.errors {
            map.serialize_entry(field, errors)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_join_messages_per_field() {
        let mut errors = FieldErrors::default();
        errors.add("stage", ValidationError::StageRequired);
        errors.add("stage", ValidationError::StageRequired);
        errors.add("job", ValidationError::JobRequired);

        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.on("stage").unwrap(),
            "Stage is a required field., Stage is a required field."
        );
        assert!(errors.on("artifactId").is_none());
        assert!(errors.get("artifactId").is_empty());
    }

    #[test]
    fn test_not_an_upstream_message_without_candidates() {
        let error = ValidationError::NotAnUpstreamDependency {
            pipeline: "downstream".into(),
            target: "dummy".into(),
            candidate_paths: vec![],
            more_paths: 0,
        };

        assert_eq!(
            error.to_string(),
            "Pipeline \"downstream\" tries to fetch artifact from pipeline \"dummy\" which is not an upstream pipeline"
        );
    }

    #[test]
    fn test_not_an_upstream_message_suggests_paths() {
        let single = ValidationError::NotAnUpstreamDependency {
            pipeline: "downstream".into(),
            target: "uppest_stream".into(),
            candidate_paths: vec!["uppest_stream/upstream".into()],
            more_paths: 0,
        };
        let ambiguous = ValidationError::NotAnUpstreamDependency {
            pipeline: "downstream".into(),
            target: "uppest_stream".into(),
            candidate_paths: vec!["uppest_stream/upstream".into(), "uppest_stream/peer".into()],
            more_paths: 0,
        };
        let truncated = ValidationError::NotAnUpstreamDependency {
            pipeline: "top".into(),
            target: "p0a".into(),
            candidate_paths: vec!["p0a/p1a".into()],
            more_paths: 41,
        };

        assert!(truncated
            .to_string()
            .contains("several paths ('p0a/p1a' and 41 more)"));
        assert!(single.to_string().ends_with("declare the path 'uppest_stream/upstream' to fetch from it"));
        assert!(ambiguous
            .to_string()
            .contains("several paths ('uppest_stream/upstream', 'uppest_stream/peer')"));
    }

    #[test]
    fn test_serializes_code_message_and_chain() {
        let error = ValidationError::StageNotGuaranteedComplete {
            requester: JobLocator::new("downstream", "stage", "job"),
            pipeline: "upstream".into(),
            stage: "up-stage2".into(),
            chain: vec![DependencyLink::new("downstream", "upstream", "up-stage1")],
        };

        let value = serde_json::to_value(&error).unwrap();

        assert_eq!(value["code"], "StageNotGuaranteedComplete");
        assert_eq!(value["dependency_chain"], "downstream <- upstream :: up-stage1");
        assert_eq!(
            value["message"],
            "\"downstream :: stage :: job\" tries to fetch artifact from stage \"upstream :: up-stage2\" which does not complete before \"downstream\" pipeline's dependencies."
        );
    }

    #[test]
    fn test_own_stage_message() {
        let error = ValidationError::StageNotGuaranteedComplete {
            requester: JobLocator::new("build", "compile", "make"),
            pipeline: "build".into(),
            stage: "package".into(),
            chain: vec![],
        };

        assert_eq!(
            error.to_string(),
            "\"build :: compile :: make\" tries to fetch artifact from its own stage \"build :: package\" which does not run before stage \"compile\"."
        );
        assert!(error.dependency_chain().is_none());
    }
}
