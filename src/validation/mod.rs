//! Fetch-task validation.
//!
//! A fetch task is checked against the configuration graph from the point of
//! view of the job that owns it: the path must name a real ancestor, the
//! fetched stage must be guaranteed to have completed, file pipelines must not
//! read from config repository pipelines, and the job and artifact must exist.
//! Problems are collected per field in [`FieldErrors`].

mod ancestry;
mod errors;
mod existence;
mod fetch;
#[cfg(test)]
pub(crate) mod fixtures;
mod ordering;
mod origin;
mod structure;

use log::info;

use crate::error::{LineageError, Result};
use crate::graph::{CaseInsensitiveName, ConfigGraph, Pipeline, Stage, Template};
use crate::report::{GraphReport, ScopeKind, TaskLocation, TaskReport};

pub use ancestry::{resolve, resolve_from, DependencyLink, Resolution, ResolvedTarget};
pub use errors::{FieldErrors, JobLocator, ValidationError};
pub use existence::{check_artifact, check_job};
pub(crate) use existence::find_pluggable_artifact;
pub use fetch::validate_fetch_task;
pub use ordering::{check_stage, is_guaranteed_complete};
pub use origin::{check_origin, is_origin_compatible};
pub use structure::is_valid_artifact_id;

pub const PIPELINE_NAME: &str = "pipelineName";
pub const STAGE: &str = "stage";
pub const JOB: &str = "job";
pub const ARTIFACT_ID: &str = "artifactId";
pub const SOURCE: &str = "source";
pub const DESTINATION: &str = "destination";

/// Field carrying duplicate-key errors for the configuration property at
/// `index`.
pub fn configuration_key_field(index: usize) -> String {
    format!("configuration[{index}].configurationKey")
}

/// What owns the stage being validated.
#[derive(Debug, Clone, Copy)]
pub enum Scope<'g> {
    Pipeline(&'g Pipeline),
    Template(&'g Template),
}

impl<'g> Scope<'g> {
    pub fn name(&self) -> &'g CaseInsensitiveName {
        match self {
            Self::Pipeline(pipeline) => &pipeline.name,
            Self::Template(template) => &template.name,
        }
    }
}

/// Position of a task in the graph: the snapshot plus the owning pipeline (or
/// template), stage and job.
#[derive(Debug, Clone)]
pub struct ValidationContext<'g> {
    graph: &'g ConfigGraph,
    scope: Scope<'g>,
    stage: CaseInsensitiveName,
    job: CaseInsensitiveName,
}

impl<'g> ValidationContext<'g> {
    /// # Errors
    ///
    /// Returns `LineageError::InvalidRequest` if the pipeline is not part of
    /// the graph.
    pub fn for_pipeline(
        graph: &'g ConfigGraph,
        pipeline: &CaseInsensitiveName,
        stage: impl Into<CaseInsensitiveName>,
        job: impl Into<CaseInsensitiveName>,
    ) -> Result<Self> {
        let pipeline = graph.pipeline(pipeline).ok_or_else(|| {
            LineageError::InvalidRequest(format!("Pipeline '{pipeline}' is not part of the graph"))
        })?;
        Ok(Self {
            graph,
            scope: Scope::Pipeline(pipeline),
            stage: stage.into(),
            job: job.into(),
        })
    }

    /// # Errors
    ///
    /// Returns `LineageError::InvalidRequest` if the template is not part of
    /// the graph.
    pub fn for_template(
        graph: &'g ConfigGraph,
        template: &CaseInsensitiveName,
        stage: impl Into<CaseInsensitiveName>,
        job: impl Into<CaseInsensitiveName>,
    ) -> Result<Self> {
        let template = graph.template(template).ok_or_else(|| {
            LineageError::InvalidRequest(format!("Template '{template}' is not part of the graph"))
        })?;
        Ok(Self {
            graph,
            scope: Scope::Template(template),
            stage: stage.into(),
            job: job.into(),
        })
    }

    fn within(graph: &'g ConfigGraph, scope: Scope<'g>, stage: &Stage, job: &CaseInsensitiveName) -> Self {
        Self {
            graph,
            scope,
            stage: stage.name.clone(),
            job: job.clone(),
        }
    }

    pub fn graph(&self) -> &'g ConfigGraph {
        self.graph
    }

    pub fn within_template(&self) -> bool {
        matches!(self.scope, Scope::Template(_))
    }

    /// `None` inside a template.
    pub fn current_pipeline(&self) -> Option<&'g Pipeline> {
        match self.scope {
            Scope::Pipeline(pipeline) => Some(pipeline),
            Scope::Template(_) => None,
        }
    }

    pub fn stage_name(&self) -> &CaseInsensitiveName {
        &self.stage
    }

    /// The job that owns the task, as quoted in error messages.
    pub fn requester(&self) -> JobLocator {
        JobLocator::new(self.scope.name(), &self.stage, &self.job)
    }
}

/// Validates every fetch task of every pipeline and template in the graph.
pub fn validate_graph(graph: &ConfigGraph) -> GraphReport {
    let mut tasks = Vec::new();

    for pipeline in graph.pipelines() {
        validate_stages(graph, Scope::Pipeline(pipeline), &pipeline.stages, &mut tasks);
    }
    for template in graph.templates() {
        validate_stages(graph, Scope::Template(template), &template.stages, &mut tasks);
    }

    let report = GraphReport::new(tasks);
    info!(
        "Validated {} fetch tasks: {} invalid, {} errors",
        report.total_tasks, report.invalid_tasks, report.total_errors
    );
    report
}

fn validate_stages(graph: &ConfigGraph, scope: Scope<'_>, stages: &[Stage], tasks: &mut Vec<TaskReport>) {
    let kind = match scope {
        Scope::Pipeline(_) => ScopeKind::Pipeline,
        Scope::Template(_) => ScopeKind::Template,
    };

    for stage in stages {
        for job in &stage.jobs {
            let context = ValidationContext::within(graph, scope, stage, &job.name);
            for (index, task) in job.tasks.iter().enumerate() {
                tasks.push(TaskReport {
                    location: TaskLocation {
                        scope: kind,
                        owner: scope.name().to_string(),
                        stage: stage.name.to_string(),
                        job: job.name.to_string(),
                        task: index + 1,
                    },
                    errors: validate_fetch_task(task, &context),
                });
            }
        }
    }
}
