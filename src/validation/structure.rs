//! Checks that need nothing but the task itself.

use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;

use super::errors::{FieldErrors, ValidationError};
use super::{configuration_key_field, ARTIFACT_ID, DESTINATION, JOB, SOURCE, STAGE};
use crate::configuration::duplicate_keys;
use crate::task::{BuiltinFetchTask, FetchTask, PluggableFetchTask};

static ARTIFACT_ID_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

/// Alphanumerics, underscores and periods; no leading period; at most 255
/// characters.
pub fn is_valid_artifact_id(artifact_id: &str) -> bool {
    ARTIFACT_ID_PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.]{0,254}$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(artifact_id))
}

pub fn check_required(task: &FetchTask, errors: &mut FieldErrors) {
    if task.stage().is_blank() {
        errors.add(STAGE, ValidationError::StageRequired);
    }
    if task.job().is_blank() {
        errors.add(JOB, ValidationError::JobRequired);
    }
}

/// Returns whether the id is well formed.
pub fn check_artifact_id(task: &PluggableFetchTask, errors: &mut FieldErrors) -> bool {
    let valid = is_valid_artifact_id(&task.artifact_id);
    if !valid {
        errors.add(
            ARTIFACT_ID,
            ValidationError::InvalidArtifactId {
                artifact_id: task.artifact_id.clone(),
            },
        );
    }
    valid
}

pub fn check_configuration_keys(task: &PluggableFetchTask, errors: &mut FieldErrors) {
    for (index, key) in duplicate_keys(&task.configuration) {
        errors.add(
            configuration_key_field(index),
            ValidationError::DuplicateConfigurationKey {
                key: key.to_string(),
            },
        );
    }
}

pub fn check_builtin_paths(task: &BuiltinFetchTask, errors: &mut FieldErrors) {
    if task.source.trim().is_empty() {
        errors.add(SOURCE, ValidationError::SourceRequired);
    }

    if let Some(destination) = &task.destination {
        if !stays_inside_working_directory(destination) {
            errors.add(
                DESTINATION,
                ValidationError::InvalidDestination {
                    destination: destination.clone(),
                },
            );
        }
    }
}

fn stays_inside_working_directory(path: &str) -> bool {
    let mut depth: usize = 0;
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::ConfigurationProperty;

    #[test]
    fn test_artifact_id_format() {
        assert!(is_valid_artifact_id("s3"));
        assert!(is_valid_artifact_id("installer_v2.zip"));
        assert!(is_valid_artifact_id(&"a".repeat(255)));

        assert!(!is_valid_artifact_id(""));
        assert!(!is_valid_artifact_id(".hidden"));
        assert!(!is_valid_artifact_id("has space"));
        assert!(!is_valid_artifact_id("dash-ed"));
        assert!(!is_valid_artifact_id(&"a".repeat(256)));
    }

    #[test]
    fn test_blank_stage_and_job_are_required() {
        let task: FetchTask = PluggableFetchTask::new("", " ", "", "s3").into();
        let mut errors = FieldErrors::default();

        check_required(&task, &mut errors);

        assert_eq!(errors.on(STAGE).unwrap(), "Stage is a required field.");
        assert_eq!(errors.on(JOB).unwrap(), "Job is a required field.");
    }

    #[test]
    fn test_duplicate_keys_flag_each_occurrence() {
        let task = PluggableFetchTask::new("dummy", "stage", "job", "s3").with_configuration(vec![
            ConfigurationProperty::plain("Foo", "Bar"),
            ConfigurationProperty::plain("Foo", "Bar"),
            ConfigurationProperty::plain("Unique", "Value"),
        ]);
        let mut errors = FieldErrors::default();

        check_configuration_keys(&task, &mut errors);

        let expected = "Duplicate key 'Foo' found for Fetch pluggable artifact";
        assert_eq!(errors.on("configuration[0].configurationKey").unwrap(), expected);
        assert_eq!(errors.on("configuration[1].configurationKey").unwrap(), expected);
        assert!(errors.on("configuration[2].configurationKey").is_none());
    }

    #[test]
    fn test_invalid_artifact_id_message() {
        let task = PluggableFetchTask::new("dummy", "stage", "job", "");
        let mut errors = FieldErrors::default();

        assert!(!check_artifact_id(&task, &mut errors));
        assert_eq!(
            errors.on(ARTIFACT_ID).unwrap(),
            "Invalid fetch artifact artifactId name ''. This must be alphanumeric and can contain underscores and periods (however, it cannot start with a period). The maximum allowed length is 255 characters."
        );
    }

    #[test]
    fn test_builtin_source_and_destination() {
        let mut task = BuiltinFetchTask::new("upstream", "stage", "job", "");
        task.destination = Some("../outside".to_string());
        let mut errors = FieldErrors::default();

        check_builtin_paths(&task, &mut errors);

        assert_eq!(errors.get(SOURCE), &[ValidationError::SourceRequired]);
        assert_eq!(errors.get(DESTINATION).len(), 1);
    }

    #[test]
    fn test_destination_may_step_back_inside_working_directory() {
        assert!(stays_inside_working_directory("lib/../pkg"));
        assert!(stays_inside_working_directory("./pkg"));
        assert!(!stays_inside_working_directory("pkg/../../etc"));
        assert!(!stays_inside_working_directory("/etc/passwd"));
    }
}
