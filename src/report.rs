use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::secure::SecuredProperty;
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Pipeline,
    Template,
}

/// Where a fetch task sits; `task` is its 1-based position in the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLocation {
    pub scope: ScopeKind,
    pub owner: String,
    pub stage: String,
    pub job: String,
    pub task: usize,
}

impl fmt::Display for TaskLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope == ScopeKind::Template {
            f.write_str("template ")?;
        }
        write!(
            f,
            "{} :: {} :: {} [task {}]",
            self.owner, self.stage, self.job, self.task
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub location: TaskLocation,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

impl TaskReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of validating every fetch task in a graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub validated_at: DateTime<Utc>,
    pub total_tasks: usize,
    pub invalid_tasks: usize,
    pub total_errors: usize,
    pub tasks: Vec<TaskReport>,
}

impl GraphReport {
    pub fn new(tasks: Vec<TaskReport>) -> Self {
        Self {
            validated_at: Utc::now(),
            total_tasks: tasks.len(),
            invalid_tasks: tasks.iter().filter(|task| !task.is_valid()).count(),
            total_errors: tasks.iter().map(|task| task.errors.len()).sum(),
            tasks,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid_tasks == 0
    }

    pub fn invalid(&self) -> impl Iterator<Item = &TaskReport> {
        self.tasks.iter().filter(|task| !task.is_valid())
    }
}

/// Values that would be encrypted before the graph is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SecureReport {
    pub generated_at: DateTime<Utc>,
    pub properties: Vec<SecuredProperty>,
}

impl SecureReport {
    pub fn new(properties: Vec<SecuredProperty>) -> Self {
        Self {
            generated_at: Utc::now(),
            properties,
        }
    }
}
