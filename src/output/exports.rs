use anyhow::Result;
use serde::Serialize;
use std::io::Write;

use crate::config::OutputFormat;
use crate::report::{GraphReport, SecureReport};

use super::summary::{render_secure_summary, render_summary};

/// Writes a validation report in the requested format.
///
/// - CSV: one row per error, for spreadsheets and CI annotations
/// - JSON: programmatic access
/// - Summary: the same tables printed to the terminal
pub fn export_report(
    report: &GraphReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            writeln!(output, "{}", render_summary(report))?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_report_csv(report, output),
    }
}

/// Writes the list of secure properties in the requested format.
pub fn export_secure_report(
    report: &SecureReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Summary => {
            writeln!(output, "{}", render_secure_summary(report))?;
            Ok(())
        }
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Csv => export_secure_csv(report, output),
    }
}

fn export_json(value: &impl Serialize, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn export_report_csv(report: &GraphReport, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Task,Field,Code,Message,Dependency Chain")?;

    for task in report.invalid() {
        let location = task.location.to_string();
        for (field, errors) in task.errors.iter() {
            for error in errors {
                writeln!(
                    output,
                    "{},{},{},{},{}",
                    quoted(&location),
                    quoted(field),
                    error.code(),
                    quoted(&error.to_string()),
                    quoted(&error.dependency_chain().unwrap_or_default())
                )?;
            }
        }
    }

    Ok(())
}

fn export_secure_csv(report: &SecureReport, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "Task,Plugin,Key")?;

    for property in &report.properties {
        writeln!(
            output,
            "{},{},{}",
            quoted(&property.location.to_string()),
            quoted(&property.plugin_id),
            quoted(&property.key)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ScopeKind, TaskLocation, TaskReport};
    use crate::secure::SecuredProperty;
    use crate::validation::{FieldErrors, JobLocator, ValidationError, JOB, PIPELINE_NAME};

    fn create_location() -> TaskLocation {
        TaskLocation {
            scope: ScopeKind::Pipeline,
            owner: "downstream".to_string(),
            stage: "stage".to_string(),
            job: "job".to_string(),
            task: 1,
        }
    }

    fn create_report() -> GraphReport {
        let mut errors = FieldErrors::default();
        errors.add(
            PIPELINE_NAME,
            ValidationError::PipelineNotFound {
                pipeline: "downstream".to_string(),
                target: "ghost".to_string(),
            },
        );
        errors.add(
            JOB,
            ValidationError::JobNotFound {
                requester: JobLocator::new("downstream", "stage", "job"),
                source_job: JobLocator::new("upstream", "up-stage1", "missing"),
            },
        );
        GraphReport::new(vec![
            TaskReport {
                location: create_location(),
                errors,
            },
            TaskReport {
                location: create_location(),
                errors: FieldErrors::default(),
            },
        ])
    }

    fn export_to_string(format: OutputFormat, pretty: bool) -> String {
        let mut buffer = Vec::new();
        export_report(&create_report(), format, pretty, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_export_json() {
        let output = export_to_string(OutputFormat::Json, false);

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_tasks"], 2);
        assert_eq!(value["invalid_tasks"], 1);
        assert_eq!(
            value["tasks"][0]["errors"]["pipelineName"][0]["code"],
            "PipelineNotFound"
        );
    }

    #[test]
    fn test_export_pretty_json() {
        let output = export_to_string(OutputFormat::Json, true);

        assert!(output.contains("\n  \"validated_at\""));
    }

    #[test]
    fn test_export_csv_one_row_per_error() {
        let output = export_to_string(OutputFormat::Csv, false);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "Task,Field,Code,Message,Dependency Chain");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("\"downstream :: stage :: job [task 1]\",\"pipelineName\",PipelineNotFound,"));
        assert!(lines[2].contains("JobNotFound"));
    }

    #[test]
    fn test_export_csv_escapes_quotes() {
        let output = export_to_string(OutputFormat::Csv, false);

        assert!(output.contains("\"Pipeline \"\"downstream\"\" tries to fetch artifact"));
    }

    #[test]
    fn test_export_summary() {
        let output = export_to_string(OutputFormat::Summary, false);

        assert!(output.contains("Overview"));
        assert!(output.contains("PipelineNotFound"));
    }

    #[test]
    fn test_export_secure_csv() {
        let report = SecureReport::new(vec![SecuredProperty {
            location: create_location(),
            plugin_id: "cd.go.artifact.docker".to_string(),
            key: "Password".to_string(),
        }]);
        let mut buffer = Vec::new();

        export_secure_report(&report, OutputFormat::Csv, false, &mut buffer).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(
            output,
            "Task,Plugin,Key\n\"downstream :: stage :: job [task 1]\",\"cd.go.artifact.docker\",\"Password\"\n"
        );
    }
}
