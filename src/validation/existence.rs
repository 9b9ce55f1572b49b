use log::debug;

use super::errors::{JobLocator, ValidationError};
use super::ValidationContext;
use crate::artifact::PluggableArtifact;
use crate::graph::{CaseInsensitiveName, ConfigGraph, Job, Pipeline, Stage};

pub fn check_job<'g>(
    context: &ValidationContext<'_>,
    pipeline: &Pipeline,
    stage: &'g Stage,
    job: &CaseInsensitiveName,
) -> Result<&'g Job, ValidationError> {
    stage.job(job).ok_or_else(|| ValidationError::JobNotFound {
        requester: context.requester(),
        source_job: JobLocator::new(&pipeline.name, &stage.name, job),
    })
}

/// Finds the pluggable artifact `artifact_id` declared on `job`.
///
/// An artifact whose store is not registered is still accepted; the store
/// may be created later, but its secure settings cannot be resolved until
/// then.
pub fn check_artifact<'g>(
    graph: &ConfigGraph,
    pipeline: &Pipeline,
    stage: &Stage,
    job: &'g Job,
    artifact_id: &str,
) -> Result<&'g PluggableArtifact, ValidationError> {
    let artifact = find_pluggable_artifact(job, artifact_id).ok_or_else(|| {
        ValidationError::ArtifactIdNotFound {
            artifact_id: artifact_id.to_string(),
            source_job: JobLocator::new(&pipeline.name, &stage.name, &job.name),
        }
    })?;

    if graph.artifact_stores().find(&artifact.store_id).is_none() {
        debug!(
            "Artifact '{}' on {} :: {} :: {} uses unregistered store '{}'",
            artifact.id, pipeline.name, stage.name, job.name, artifact.store_id
        );
    }

    Ok(artifact)
}

pub(crate) fn find_pluggable_artifact<'g>(job: &'g Job, artifact_id: &str) -> Option<&'g PluggableArtifact> {
    job.artifacts
        .iter()
        .filter_map(|artifact| artifact.as_pluggable())
        .find(|artifact| artifact.id == artifact_id)
}
