//! Turns the `pipeline` path of a fetch task into the pipeline it reads from.

use std::fmt;

use serde::Serialize;

use super::errors::ValidationError;
use super::ValidationContext;
use crate::graph::{CaseInsensitiveName, ConfigGraph, DependencyEdge, PathFromAncestor, Pipeline};

/// Routes listed in a `NotAnUpstreamDependency` message.
const MAX_CANDIDATE_PATHS: usize = 5;

/// One dependency edge followed while walking a path, downstream side first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyLink {
    pub downstream: String,
    pub upstream: String,
    pub stage: String,
}

impl DependencyLink {
    pub fn new(
        downstream: impl fmt::Display,
        upstream: impl fmt::Display,
        stage: impl fmt::Display,
    ) -> Self {
        Self {
            downstream: downstream.to_string(),
            upstream: upstream.to_string(),
            stage: stage.to_string(),
        }
    }
}

impl fmt::Display for DependencyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {} :: {}", self.downstream, self.upstream, self.stage)
    }
}

#[derive(Debug, Clone)]
pub enum ResolvedTarget<'g> {
    /// The task reads from an earlier stage of its own pipeline.
    CurrentPipeline(&'g Pipeline),
    Ancestor {
        pipeline: &'g Pipeline,
        /// Edge into `pipeline` at the far end of the walk. Its stage bounds
        /// what is guaranteed to have completed.
        edge: &'g DependencyEdge,
        chain: Vec<DependencyLink>,
    },
}

impl<'g> ResolvedTarget<'g> {
    pub fn pipeline(&self) -> &'g Pipeline {
        match self {
            Self::CurrentPipeline(pipeline) => pipeline,
            Self::Ancestor { pipeline, .. } => pipeline,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Resolution<'g> {
    /// Template stages have no position in the dependency graph.
    Skipped,
    Resolved(ResolvedTarget<'g>),
}

/// Resolves `path` relative to the pipeline that owns the task.
pub fn resolve<'g>(
    context: &ValidationContext<'g>,
    path: &PathFromAncestor,
) -> Result<Resolution<'g>, ValidationError> {
    match context.current_pipeline() {
        None => Ok(Resolution::Skipped),
        Some(current) => resolve_from(context.graph(), current, path).map(Resolution::Resolved),
    }
}

/// Resolves `path` starting at `current`.
///
/// - An empty path, or one naming `current` alone, is the current pipeline.
/// - A single name must be an immediate upstream of `current`.
/// - A longer path must be a chain of direct edges, checked from `current`
///   backwards. The first link that does not hold is reported, naming its
///   upstream side.
pub fn resolve_from<'g>(
    graph: &'g ConfigGraph,
    current: &'g Pipeline,
    path: &PathFromAncestor,
) -> Result<ResolvedTarget<'g>, ValidationError> {
    match path.segments() {
        [] => Ok(ResolvedTarget::CurrentPipeline(current)),
        [target] if target == &current.name => Ok(ResolvedTarget::CurrentPipeline(current)),
        [target] => resolve_immediate(graph, current, target),
        _ => resolve_declared_path(graph, current, path),
    }
}

fn resolve_immediate<'g>(
    graph: &'g ConfigGraph,
    current: &'g Pipeline,
    target: &CaseInsensitiveName,
) -> Result<ResolvedTarget<'g>, ValidationError> {
    if !current.depends_directly_on(target) {
        let routes = graph.ancestor_paths(&current.name, target, MAX_CANDIDATE_PATHS);
        return Err(ValidationError::NotAnUpstreamDependency {
            pipeline: current.name.to_string(),
            target: target.to_string(),
            more_paths: routes.total.saturating_sub(routes.paths.len()),
            candidate_paths: routes.paths.iter().map(ToString::to_string).collect(),
        });
    }

    let not_found = || ValidationError::PipelineNotFound {
        pipeline: current.name.to_string(),
        target: target.to_string(),
    };
    let upstream = graph.pipeline(target).ok_or_else(not_found)?;
    let edge = furthest_edge(current, upstream).ok_or_else(not_found)?;

    Ok(ResolvedTarget::Ancestor {
        pipeline: upstream,
        edge,
        chain: vec![DependencyLink::new(&current.name, &upstream.name, &edge.stage)],
    })
}

fn resolve_declared_path<'g>(
    graph: &'g ConfigGraph,
    current: &'g Pipeline,
    path: &PathFromAncestor,
) -> Result<ResolvedTarget<'g>, ValidationError> {
    let mut downstream = current;
    let mut chain = Vec::with_capacity(path.segments().len());
    let mut reached = None;

    for name in path.segments().iter().rev() {
        let upstream = graph
            .pipeline(name)
            .ok_or_else(|| ValidationError::AncestorNotFound {
                ancestor: name.to_string(),
                pipeline: current.name.to_string(),
                path: path.to_string(),
            })?;
        let edge = furthest_edge(downstream, upstream).ok_or_else(|| {
            ValidationError::NotAnAncestor {
                ancestor: upstream.name.to_string(),
                pipeline: current.name.to_string(),
                path: path.to_string(),
            }
        })?;

        chain.push(DependencyLink::new(&downstream.name, &upstream.name, &edge.stage));
        reached = Some((upstream, edge));
        downstream = upstream;
    }

    Ok(match reached {
        Some((pipeline, edge)) => ResolvedTarget::Ancestor {
            pipeline,
            edge,
            chain,
        },
        None => ResolvedTarget::CurrentPipeline(current),
    })
}

/// Among the edges `downstream` declares on `upstream`, the one pinning the
/// latest stage.
fn furthest_edge<'g>(downstream: &'g Pipeline, upstream: &'g Pipeline) -> Option<&'g DependencyEdge> {
    downstream
        .edges_to(&upstream.name)
        .max_by_key(|edge| upstream.stage_index(&edge.stage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::fixtures::{create_graph, create_graph_with, find_pipeline};

    fn resolve_for<'g>(
        graph: &'g ConfigGraph,
        pipeline: &str,
        path: &str,
    ) -> Result<ResolvedTarget<'g>, ValidationError> {
        let current = graph.pipeline(&pipeline.into()).unwrap();
        resolve_from(graph, current, &path.into())
    }

    #[test]
    fn test_empty_path_is_current_pipeline() {
        let graph = create_graph();

        let target = resolve_for(&graph, "downstream", "").unwrap();

        assert!(matches!(target, ResolvedTarget::CurrentPipeline(_)));
        assert_eq!(target.pipeline().name, "downstream");
    }

    #[test]
    fn test_own_name_is_current_pipeline() {
        let graph = create_graph();

        let target = resolve_for(&graph, "downstream", "DOWNSTREAM").unwrap();

        assert!(matches!(target, ResolvedTarget::CurrentPipeline(_)));
    }

    #[test]
    fn test_immediate_upstream_resolves() {
        let graph = create_graph();

        let target = resolve_for(&graph, "downstream", "upstream").unwrap();

        let ResolvedTarget::Ancestor { pipeline, edge, chain } = target else {
            panic!("expected an ancestor");
        };
        assert_eq!(pipeline.name, "upstream");
        assert_eq!(edge.stage, "up-stage1");
        assert_eq!(chain, vec![DependencyLink::new("downstream", "upstream", "up-stage1")]);
    }

    #[test]
    fn test_declared_path_walks_every_link() {
        let graph = create_graph();

        let target = resolve_for(&graph, "downstream", "uppest_stream/upstream").unwrap();

        let ResolvedTarget::Ancestor { pipeline, edge, chain } = target else {
            panic!("expected an ancestor");
        };
        assert_eq!(pipeline.name, "uppest_stream");
        assert_eq!(edge.stage, "uppest-stage2");
        assert_eq!(
            chain.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec![
                "downstream <- upstream :: up-stage1",
                "upstream <- uppest_stream :: uppest-stage2",
            ]
        );
    }

    #[test]
    fn test_alternate_path_uses_its_own_edge() {
        let graph = create_graph();

        let target = resolve_for(&graph, "downstream", "uppest_stream/upstreams_peer").unwrap();

        let ResolvedTarget::Ancestor { edge, .. } = target else {
            panic!("expected an ancestor");
        };
        assert_eq!(edge.stage, "uppest-stage1");
    }

    #[test]
    fn test_indirect_ancestor_requires_path() {
        let graph = create_graph();

        let err = resolve_for(&graph, "downstream", "uppest_stream").unwrap_err();

        assert_eq!(
            err,
            ValidationError::NotAnUpstreamDependency {
                pipeline: "downstream".into(),
                target: "uppest_stream".into(),
                candidate_paths: vec![
                    "uppest_stream/upstream".into(),
                    "uppest_stream/upstreams_peer".into()
                ],
                more_paths: 0,
            }
        );
    }

    #[test]
    fn test_unrelated_pipeline_is_not_upstream() {
        let graph = create_graph();

        let err = resolve_for(&graph, "downstream", "dummy").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Pipeline \"downstream\" tries to fetch artifact from pipeline \"dummy\" which is not an upstream pipeline"
        );
    }

    #[test]
    fn test_path_through_non_parent_is_not_an_ancestor() {
        let graph = create_graph();

        let err = resolve_for(&graph, "downstream", "random_pipeline/upstream").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Pipeline named 'random_pipeline' exists, but is not an ancestor of 'downstream' as declared in 'random_pipeline/upstream'."
        );
    }

    #[test]
    fn test_reversed_path_is_not_an_ancestor() {
        let graph = create_graph();

        let err = resolve_for(&graph, "downstream", "upstream/uppest_stream").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Pipeline named 'uppest_stream' exists, but is not an ancestor of 'downstream' as declared in 'upstream/uppest_stream'."
        );
    }

    #[test]
    fn test_unknown_pipeline_in_path() {
        let graph = create_graph();

        let err = resolve_for(&graph, "downstream", "ghost/upstream").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Pipeline named 'ghost' which is declared ancestor of 'downstream' through path 'ghost/upstream' does not exist."
        );
    }

    #[test]
    fn test_edge_to_missing_pipeline() {
        let graph = create_graph_with(|pipelines| {
            let dummy = find_pipeline(pipelines, "dummy");
            *dummy = dummy.clone().depends_on("ghost", "stage");
        });

        let err = resolve_for(&graph, "dummy", "ghost").unwrap_err();

        assert_eq!(
            err,
            ValidationError::PipelineNotFound {
                pipeline: "dummy".into(),
                target: "ghost".into(),
            }
        );
    }

    #[test]
    fn test_furthest_of_several_edges_wins() {
        let graph = create_graph_with(|pipelines| {
            let downstream = find_pipeline(pipelines, "downstream");
            *downstream = downstream.clone().depends_on("upstream", "up-stage2");
        });

        let target = resolve_for(&graph, "downstream", "upstream").unwrap();

        let ResolvedTarget::Ancestor { edge, .. } = target else {
            panic!("expected an ancestor");
        };
        assert_eq!(edge.stage, "up-stage2");
    }
}
