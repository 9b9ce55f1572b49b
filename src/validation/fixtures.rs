//! Shared test graph.
//!
//! ```text
//! uppest_stream ──uppest-stage2──> upstream ──up-stage1──> downstream
//!       └───────uppest-stage1──> upstreams_peer ──peer-stage──┘
//! ```
//!
//! Every pipeline starts with a `stage` stage holding a `job` job. The
//! `random_pipeline`, `uppest_lookalike` and `dummy` pipelines are unrelated
//! to the chain. Each job of the chain publishes a pluggable artifact `s3`.

use crate::artifact::{ArtifactConfig, ArtifactStore, PluggableArtifact};
use crate::graph::{ConfigGraph, Job, Pipeline, Stage, Template};
use crate::task::{FetchTask, PluggableFetchTask};

use super::ValidationContext;

pub(crate) const STORE_ID: &str = "cd.go.s3";
pub(crate) const PLUGIN_ID: &str = "cd.go.artifact.s3";

fn create_job(name: &str) -> Job {
    Job::new(name).with_artifact(ArtifactConfig::Pluggable(PluggableArtifact::new("s3", STORE_ID)))
}

fn create_pipeline(name: &str, stages: &[(&str, &str)]) -> Pipeline {
    stages.iter().fold(
        Pipeline::new(name).with_stage(Stage::new("stage", vec![create_job("job")])),
        |pipeline, (stage, job)| pipeline.with_stage(Stage::new(*stage, vec![create_job(job)])),
    )
}

pub(crate) fn create_pipelines() -> Vec<Pipeline> {
    vec![
        create_pipeline("random_pipeline", &[("random-stage1", "random-job1")]),
        create_pipeline("uppest_lookalike", &[("uppest-stage1", "uppest-job1")]),
        create_pipeline(
            "uppest_stream",
            &[
                ("uppest-stage1", "uppest-job1"),
                ("uppest-stage2", "uppest-job2"),
                ("uppest-stage3", "uppest-job3"),
            ],
        ),
        create_pipeline("upstreams_peer", &[("peer-stage", "peer-job")])
            .depends_on("uppest_stream", "uppest-stage1"),
        create_pipeline("upstream", &[("up-stage1", "up-job1"), ("up-stage2", "up-job2")])
            .depends_on("uppest_stream", "uppest-stage2"),
        create_pipeline("downstream", &[("deploy", "deploy-job")])
            .depends_on("upstream", "up-stage1")
            .depends_on("upstreams_peer", "peer-stage"),
        create_pipeline("dummy", &[]),
    ]
}

pub(crate) fn create_graph_with(edit: impl FnOnce(&mut Vec<Pipeline>)) -> ConfigGraph {
    let mut pipelines = create_pipelines();
    edit(&mut pipelines);
    ConfigGraph::new(
        pipelines,
        vec![Template::new(
            "deploy_template",
            vec![Stage::new("stage", vec![Job::new("job")])],
        )],
        vec![ArtifactStore::new(STORE_ID, PLUGIN_ID)],
    )
    .unwrap()
}

pub(crate) fn create_graph() -> ConfigGraph {
    create_graph_with(|_| {})
}

pub(crate) fn find_pipeline<'a>(pipelines: &'a mut [Pipeline], name: &str) -> &'a mut Pipeline {
    pipelines
        .iter_mut()
        .find(|pipeline| pipeline.name == name)
        .unwrap()
}

/// Context of `<pipeline> :: stage :: job`.
pub(crate) fn create_context<'g>(graph: &'g ConfigGraph, pipeline: &str) -> ValidationContext<'g> {
    ValidationContext::for_pipeline(graph, &pipeline.into(), "stage", "job").unwrap()
}

pub(crate) fn create_template_context(graph: &ConfigGraph) -> ValidationContext<'_> {
    ValidationContext::for_template(graph, &"deploy_template".into(), "stage", "job").unwrap()
}

pub(crate) fn s3_task(path: &str, stage: &str, job: &str) -> FetchTask {
    PluggableFetchTask::new(path, stage, job, "s3").into()
}
