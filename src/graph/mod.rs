//! Immutable configuration snapshot handed to the validators.
//!
//! Pipelines, templates and artifact stores are kept in ordered maps keyed by
//! name; every relationship (dependency edges, ancestry) is answered by a
//! query over those maps rather than by back-references between nodes.

mod model;
mod name;
mod path;
mod snapshot;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use crate::artifact::{ArtifactConfig, ArtifactStore, ArtifactStores};
use crate::error::{LineageError, Result};

pub use model::{DependencyEdge, Job, Origin, Pipeline, Stage, Template};
pub use name::CaseInsensitiveName;
pub use path::PathFromAncestor;
pub use snapshot::{Snapshot, SnapshotFormat};

/// Result of [`ConfigGraph::ancestor_paths`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AncestorRoutes {
    /// The first routes found, up to the requested limit.
    pub paths: Vec<PathFromAncestor>,
    /// Every route, including those not listed in `paths`.
    pub total: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigGraph {
    pipelines: IndexMap<CaseInsensitiveName, Pipeline>,
    templates: IndexMap<CaseInsensitiveName, Template>,
    artifact_stores: ArtifactStores,
}

impl ConfigGraph {
    /// Builds a snapshot, rejecting duplicate names and dependency cycles.
    ///
    /// Edges that name a pipeline missing from the snapshot are kept; the
    /// fetch validator reports them when a task relies on them.
    ///
    /// # Errors
    ///
    /// Returns `LineageError::InvalidGraph` if:
    /// - two pipelines, templates or artifact stores share a name
    /// - a pipeline declares the same stage twice, or a stage the same job twice
    /// - a job declares the same pluggable artifact id twice
    /// - a pipeline depends, directly or transitively, on itself
    pub fn new(
        pipelines: Vec<Pipeline>,
        templates: Vec<Template>,
        artifact_stores: Vec<ArtifactStore>,
    ) -> Result<Self> {
        let mut pipeline_map = IndexMap::with_capacity(pipelines.len());
        for pipeline in pipelines {
            check_stage_names(&pipeline.name, &pipeline.stages)?;
            if pipeline_map.contains_key(&pipeline.name) {
                return Err(LineageError::InvalidGraph(format!(
                    "Pipeline '{}' is defined more than once",
                    pipeline.name
                )));
            }
            pipeline_map.insert(pipeline.name.clone(), pipeline);
        }

        let mut template_map = IndexMap::with_capacity(templates.len());
        for template in templates {
            check_stage_names(&template.name, &template.stages)?;
            if template_map.contains_key(&template.name) {
                return Err(LineageError::InvalidGraph(format!(
                    "Template '{}' is defined more than once",
                    template.name
                )));
            }
            template_map.insert(template.name.clone(), template);
        }

        let graph = Self {
            pipelines: pipeline_map,
            templates: template_map,
            artifact_stores: ArtifactStores::new(artifact_stores)?,
        };
        graph.check_acyclic()?;

        debug!(
            "Built configuration graph with {} pipelines and {} templates",
            graph.pipelines.len(),
            graph.templates.len()
        );

        Ok(graph)
    }

    pub fn pipeline(&self, name: &CaseInsensitiveName) -> Option<&Pipeline> {
        self.pipelines.get(name)
    }

    pub fn pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.pipelines.values()
    }

    pub fn template(&self, name: &CaseInsensitiveName) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.values()
    }

    pub fn artifact_stores(&self) -> &ArtifactStores {
        &self.artifact_stores
    }

    pub(crate) fn pipeline_mut(&mut self, name: &CaseInsensitiveName) -> Option<&mut Pipeline> {
        self.pipelines.get_mut(name)
    }

    /// Dependency routes from `ancestor` down to `pipeline`, at most `limit`
    /// of them, plus the total number of routes.
    ///
    /// Each route is returned the way a fetch task declares it: most distant
    /// pipeline first, immediate upstream of `pipeline` last. Routes are listed
    /// in edge declaration order.
    pub fn ancestor_paths(
        &self,
        pipeline: &CaseInsensitiveName,
        ancestor: &CaseInsensitiveName,
        limit: usize,
    ) -> AncestorRoutes {
        let Some(start) = self.pipeline(pipeline) else {
            return AncestorRoutes::default();
        };

        let mut counts = HashMap::new();
        let total = self.count_routes(start, ancestor, &mut counts);
        let mut paths = Vec::new();
        if total > 0 {
            let mut trail = Vec::new();
            self.collect_paths(start, ancestor, &counts, limit, &mut trail, &mut paths);
        }
        AncestorRoutes { paths, total }
    }

    /// Number of routes from each visited pipeline to `ancestor`, memoised in
    /// `counts`. Saturates instead of overflowing.
    fn count_routes<'g>(
        &'g self,
        current: &'g Pipeline,
        ancestor: &CaseInsensitiveName,
        counts: &mut HashMap<&'g CaseInsensitiveName, usize>,
    ) -> usize {
        if let Some(&count) = counts.get(&current.name) {
            return count;
        }

        let mut seen = HashSet::new();
        let mut count = 0_usize;
        for edge in &current.dependencies {
            if !seen.insert(&edge.pipeline) {
                continue;
            }
            let routes = if &edge.pipeline == ancestor {
                1
            } else {
                self.pipeline(&edge.pipeline)
                    .map_or(0, |upstream| self.count_routes(upstream, ancestor, counts))
            };
            count = count.saturating_add(routes);
        }
        counts.insert(&current.name, count);
        count
    }

    fn collect_paths<'g>(
        &'g self,
        current: &'g Pipeline,
        ancestor: &CaseInsensitiveName,
        counts: &HashMap<&'g CaseInsensitiveName, usize>,
        limit: usize,
        trail: &mut Vec<CaseInsensitiveName>,
        paths: &mut Vec<PathFromAncestor>,
    ) {
        let mut seen = HashSet::new();
        for edge in &current.dependencies {
            if paths.len() >= limit {
                return;
            }
            if !seen.insert(&edge.pipeline) {
                continue;
            }

            if &edge.pipeline == ancestor {
                trail.push(edge.pipeline.clone());
                paths.push(PathFromAncestor::from_segments(
                    trail.iter().rev().cloned().collect(),
                ));
                trail.pop();
            } else if let Some(upstream) = self.pipeline(&edge.pipeline) {
                // only upstreams that lead to `ancestor`
                if counts.get(&upstream.name).copied().unwrap_or(0) == 0 {
                    continue;
                }
                trail.push(edge.pipeline.clone());
                self.collect_paths(upstream, ancestor, counts, limit, trail, paths);
                trail.pop();
            }
        }
    }

    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'g>(
            graph: &'g ConfigGraph,
            pipeline: &'g Pipeline,
            marks: &mut IndexMap<&'g CaseInsensitiveName, Mark>,
            stack: &mut Vec<&'g CaseInsensitiveName>,
        ) -> Result<()> {
            match marks.get(&pipeline.name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    let cycle = stack
                        .iter()
                        .skip_while(|name| **name != &pipeline.name)
                        .chain(std::iter::once(&&pipeline.name))
                        .map(|name| name.as_str())
                        .collect::<Vec<_>>()
                        .join(" <- ");
                    return Err(LineageError::InvalidGraph(format!(
                        "Circular dependency between pipelines: {cycle}"
                    )));
                }
                None => {}
            }

            marks.insert(&pipeline.name, Mark::Visiting);
            stack.push(&pipeline.name);
            for edge in &pipeline.dependencies {
                if let Some(upstream) = graph.pipeline(&edge.pipeline) {
                    visit(graph, upstream, marks, stack)?;
                }
            }
            stack.pop();
            marks.insert(&pipeline.name, Mark::Done);
            Ok(())
        }

        let mut marks = IndexMap::new();
        let mut stack = Vec::new();
        for pipeline in self.pipelines.values() {
            visit(self, pipeline, &mut marks, &mut stack)?;
        }
        Ok(())
    }
}

fn check_stage_names(owner: &CaseInsensitiveName, stages: &[Stage]) -> Result<()> {
    let mut stage_names = HashSet::new();
    for stage in stages {
        if !stage_names.insert(&stage.name) {
            return Err(LineageError::InvalidGraph(format!(
                "Stage '{}' is defined more than once in '{owner}'",
                stage.name
            )));
        }

        let mut job_names = HashSet::new();
        for job in &stage.jobs {
            if !job_names.insert(&job.name) {
                return Err(LineageError::InvalidGraph(format!(
                    "Job '{}' is defined more than once in '{owner} :: {}'",
                    job.name, stage.name
                )));
            }

            let mut artifact_ids = HashSet::new();
            for artifact in job.artifacts.iter().filter_map(ArtifactConfig::as_pluggable) {
                if !artifact_ids.insert(artifact.id.as_str()) {
                    return Err(LineageError::InvalidGraph(format!(
                        "Pluggable artifact '{}' is defined more than once in '{owner} :: {} :: {}'",
                        artifact.id, stage.name, job.name
                    )));
                }
            }
        }
    }
    Ok(())
}
