use std::fmt::Write;

use indexmap::IndexMap;

use crate::report::{GraphReport, SecureReport};

use super::styling::{bright_green, bright_red, bright_yellow, cyan, dim, section_title};
use super::tables::{color_coded_error_count_cell, create_cyan_header, create_table, status_cell};

/// Prints a human-readable validation summary to stdout.
///
/// Displays color-coded tables showing:
/// - Overview: task and error counts, validation time
/// - Fetch Tasks: every task with its status and error count
/// - Errors: each message next to the field it belongs to, with the
///   dependency chain for stage ordering failures
/// - Errors by Code: how often each kind of problem occurred
pub fn print_summary(report: &GraphReport) {
    println!("{}", render_summary(report));
}

/// Prints the secure properties that would be encrypted.
pub fn print_secure_summary(report: &SecureReport) {
    println!("{}", render_secure_summary(report));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", emoji, section_title(title));
}

#[allow(clippy::format_push_string)]
pub fn render_summary(report: &GraphReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");

    let invalid_display = if report.invalid_tasks == 0 {
        bright_green(report.invalid_tasks)
    } else {
        bright_red(report.invalid_tasks)
    };

    output.push_str(&format!(
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n\n",
        dim("Fetch tasks validated:"),
        bright_yellow(report.total_tasks),
        dim("Invalid tasks:"),
        invalid_display,
        dim("Errors:"),
        bright_yellow(report.total_errors),
        dim("Validation date:"),
        dim(report.validated_at.format("%Y-%m-%d %H:%M UTC"))
    ));

    if report.tasks.is_empty() {
        output.push_str(&format!("{}\n", bright_yellow("No fetch tasks found.")));
        return output;
    }

    add_section_header(&mut output, "📋", "Fetch Tasks");

    let mut tasks_table = create_table();
    tasks_table.set_header(create_cyan_header(&["Task", "Status", "Errors"]));
    for task in &report.tasks {
        tasks_table.add_row(vec![
            comfy_table::Cell::new(task.location.to_string()),
            status_cell(task.is_valid()),
            color_coded_error_count_cell(task.errors.len()),
        ]);
    }
    output.push_str(&format!("{tasks_table}\n\n"));

    if report.is_valid() {
        output.push_str(&format!("{}\n", bright_green("All fetch tasks are valid.")));
        return output;
    }

    add_section_header(&mut output, "❌", "Errors");

    let mut errors_table = create_table();
    errors_table.set_header(create_cyan_header(&["Task", "Field", "Message", "Dependency Chain"]));
    let mut by_code: IndexMap<&str, usize> = IndexMap::new();
    for task in report.invalid() {
        for (field, errors) in task.errors.iter() {
            for error in errors {
                *by_code.entry(error.code()).or_default() += 1;
                errors_table.add_row(vec![
                    task.location.to_string(),
                    field.to_string(),
                    error.to_string(),
                    error.dependency_chain().unwrap_or_else(|| "-".to_string()),
                ]);
            }
        }
    }
    output.push_str(&format!("{errors_table}\n\n"));

    add_section_header(&mut output, "🔎", "Errors by Code");

    let mut codes_table = create_table();
    codes_table.set_header(create_cyan_header(&["Code", "Count"]));
    by_code.sort_by(|_, a, _, b| b.cmp(a));
    for (code, count) in by_code {
        codes_table.add_row(vec![
            comfy_table::Cell::new(code),
            color_coded_error_count_cell(count),
        ]);
    }
    output.push_str(&format!("{codes_table}\n"));

    output
}

#[allow(clippy::format_push_string)]
pub fn render_secure_summary(report: &SecureReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🔐", "Secure Properties");

    output.push_str(&format!(
        "  {} {}\n  {} {}\n\n",
        dim("Values to encrypt:"),
        bright_yellow(report.properties.len()),
        dim("Generated:"),
        dim(report.generated_at.format("%Y-%m-%d %H:%M UTC"))
    ));

    if report.properties.is_empty() {
        output.push_str(&format!(
            "{}\n",
            bright_green("No plain-text secure values found.")
        ));
        return output;
    }

    let mut table = create_table();
    table.set_header(create_cyan_header(&["Task", "Plugin", "Key"]));
    for property in &report.properties {
        table.add_row(vec![
            property.location.to_string(),
            property.plugin_id.clone(),
            cyan(&property.key).to_string(),
        ]);
    }
    output.push_str(&format!("{table}\n"));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ScopeKind, TaskLocation, TaskReport};
    use crate::secure::SecuredProperty;
    use crate::validation::{DependencyLink, FieldErrors, JobLocator, ValidationError, STAGE};

    fn create_location(job: &str) -> TaskLocation {
        TaskLocation {
            scope: ScopeKind::Pipeline,
            owner: "downstream".to_string(),
            stage: "stage".to_string(),
            job: job.to_string(),
            task: 1,
        }
    }

    fn create_report(errors: FieldErrors) -> GraphReport {
        GraphReport::new(vec![
            TaskReport {
                location: create_location("build"),
                errors: FieldErrors::default(),
            },
            TaskReport {
                location: create_location("deploy"),
                errors,
            },
        ])
    }

    #[test]
    fn test_render_summary_without_tasks() {
        let output = render_summary(&GraphReport::new(vec![]));

        assert!(output.contains("Overview"));
        assert!(output.contains("No fetch tasks found."));
        assert!(!output.contains("Fetch Tasks"));
    }

    #[test]
    fn test_render_summary_all_valid() {
        let output = render_summary(&create_report(FieldErrors::default()));

        assert!(output.contains("downstream :: stage :: build [task 1]"));
        assert!(output.contains("All fetch tasks are valid."));
        assert!(!output.contains("Errors by Code"));
    }

    #[test]
    fn test_render_summary_lists_errors_with_chain() {
        let mut errors = FieldErrors::default();
        errors.add(
            STAGE,
            ValidationError::StageNotGuaranteedComplete {
                requester: JobLocator::new("downstream", "stage", "deploy"),
                pipeline: "uppest_stream".to_string(),
                stage: "uppest-stage3".to_string(),
                chain: vec![
                    DependencyLink::new("downstream", "upstream", "up-stage1"),
                    DependencyLink::new("upstream", "uppest_stream", "uppest-stage2"),
                ],
            },
        );

        let output = render_summary(&create_report(errors));

        assert!(output.contains("invalid"));
        assert!(output.contains("Errors by Code"));
        assert!(output.contains("StageNotGuaranteedComplete"));
        assert!(output.contains("downstream <- upstream :: up-stage1"));
    }

    #[test]
    fn test_render_secure_summary() {
        let report = SecureReport::new(vec![SecuredProperty {
            location: create_location("deploy"),
            plugin_id: "cd.go.artifact.s3".to_string(),
            key: "SecretKey".to_string(),
        }]);

        let output = render_secure_summary(&report);

        assert!(output.contains("cd.go.artifact.s3"));
        assert!(output.contains("SecretKey"));
        assert!(output.contains("downstream :: stage :: deploy [task 1]"));
    }

    #[test]
    fn test_render_secure_summary_empty() {
        let output = render_secure_summary(&SecureReport::new(vec![]));

        assert!(output.contains("No plain-text secure values found."));
    }
}
