use log::debug;

use super::ancestry::{self, Resolution};
use super::errors::FieldErrors;
use super::{existence, ordering, origin, structure, ValidationContext};
use super::{ARTIFACT_ID, JOB, PIPELINE_NAME, STAGE};
use crate::task::FetchTask;

/// Validates one fetch task in its context, returning every field error.
///
/// Structural checks always run. Graph checks then run in order (ancestry,
/// origin, stage, job, artifact) and stop at the first failure, since each
/// one needs what the previous one found. Template stages stop after the
/// structural checks.
pub fn validate_fetch_task(task: &FetchTask, context: &ValidationContext<'_>) -> FieldErrors {
    let mut errors = FieldErrors::default();

    structure::check_required(task, &mut errors);
    let artifact_id_valid = match task {
        FetchTask::Pluggable(pluggable) => {
            structure::check_configuration_keys(pluggable, &mut errors);
            structure::check_artifact_id(pluggable, &mut errors)
        }
        FetchTask::Builtin(builtin) => {
            structure::check_builtin_paths(builtin, &mut errors);
            false
        }
    };

    if task.stage().is_blank() || task.job().is_blank() {
        return errors;
    }

    let target = match ancestry::resolve(context, task.pipeline()) {
        Ok(Resolution::Resolved(target)) => target,
        Ok(Resolution::Skipped) => {
            debug!("Skipping graph checks for {}: template stage", context.requester());
            return errors;
        }
        Err(error) => {
            errors.add(PIPELINE_NAME, error);
            return errors;
        }
    };

    if let Err(error) = origin::check_origin(context, &target, task.stage(), task.job()) {
        errors.add(STAGE, error);
        return errors;
    }

    let stage = match ordering::check_stage(context, &target, task.stage()) {
        Ok(stage) => stage,
        Err(error) => {
            errors.add(STAGE, error);
            return errors;
        }
    };

    let job = match existence::check_job(context, target.pipeline(), stage, task.job()) {
        Ok(job) => job,
        Err(error) => {
            errors.add(JOB, error);
            return errors;
        }
    };

    if let (FetchTask::Pluggable(pluggable), true) = (task, artifact_id_valid) {
        if let Err(error) = existence::check_artifact(
            context.graph(),
            target.pipeline(),
            stage,
            job,
            &pluggable.artifact_id,
        ) {
            errors.add(ARTIFACT_ID, error);
        }
    }

    errors
}
