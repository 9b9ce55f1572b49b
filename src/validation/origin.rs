use super::ancestry::ResolvedTarget;
use super::errors::{JobLocator, ValidationError};
use super::ValidationContext;
use crate::graph::{CaseInsensitiveName, Origin};

/// A file pipeline may only fetch from file pipelines. A config repository
/// pipeline may fetch from either.
pub fn is_origin_compatible(downstream: &Origin, ancestor: &Origin) -> bool {
    downstream.is_config_repo() || ancestor.is_file()
}

pub fn check_origin(
    context: &ValidationContext<'_>,
    target: &ResolvedTarget<'_>,
    stage: &CaseInsensitiveName,
    job: &CaseInsensitiveName,
) -> Result<(), ValidationError> {
    let ResolvedTarget::Ancestor { pipeline, .. } = target else {
        return Ok(());
    };
    let Some(current) = context.current_pipeline() else {
        return Ok(());
    };

    if is_origin_compatible(&current.origin, &pipeline.origin) {
        Ok(())
    } else {
        Err(ValidationError::IncompatibleOrigin {
            requester: context.requester(),
            source_job: JobLocator::new(&pipeline.name, stage, job),
            origin: pipeline.origin.to_string(),
        })
    }
}
