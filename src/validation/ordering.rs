use super::ancestry::ResolvedTarget;
use super::errors::ValidationError;
use super::ValidationContext;
use crate::graph::{CaseInsensitiveName, Stage};

/// Whether `stage` of the resolved pipeline has completed whenever the task
/// runs in `current_stage`.
///
/// For an ancestor this holds up to and including the stage pinned by the
/// dependency edge. Within the task's own pipeline the stage must come
/// strictly before `current_stage`.
pub fn is_guaranteed_complete(
    target: &ResolvedTarget<'_>,
    stage: &CaseInsensitiveName,
    current_stage: &CaseInsensitiveName,
) -> bool {
    let pipeline = target.pipeline();
    let Some(index) = pipeline.stage_index(stage) else {
        return false;
    };

    match target {
        ResolvedTarget::CurrentPipeline(_) => pipeline
            .stage_index(current_stage)
            .is_some_and(|current| index < current),
        ResolvedTarget::Ancestor { edge, .. } => pipeline
            .stage_index(&edge.stage)
            .is_some_and(|pinned| index <= pinned),
    }
}

/// Finds `stage` on the resolved pipeline and checks it is guaranteed to
/// have run.
pub fn check_stage<'g>(
    context: &ValidationContext<'_>,
    target: &ResolvedTarget<'g>,
    stage: &CaseInsensitiveName,
) -> Result<&'g Stage, ValidationError> {
    let pipeline = target.pipeline();
    let found = pipeline
        .stage(stage)
        .ok_or_else(|| ValidationError::StageNotFound {
            requester: context.requester(),
            pipeline: pipeline.name.to_string(),
            stage: stage.to_string(),
        })?;

    if !is_guaranteed_complete(target, stage, context.stage_name()) {
        let chain = match target {
            ResolvedTarget::CurrentPipeline(_) => Vec::new(),
            ResolvedTarget::Ancestor { chain, .. } => chain.clone(),
        };
        return Err(ValidationError::StageNotGuaranteedComplete {
            requester: context.requester(),
            pipeline: pipeline.name.to_string(),
            stage: stage.to_string(),
            chain,
        });
    }

    Ok(found)
}
