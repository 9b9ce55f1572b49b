//! Encryption of plugin-declared secure settings on pluggable fetch tasks.
//!
//! Which configuration keys are secret is only known to the artifact plugin
//! that serves the fetched artifact's store. The resolver follows the task to
//! that plugin, asks the [`PluginMetadataRegistry`] for its fetch settings and
//! encrypts matching plain values through an [`EncryptionProvider`]. When any
//! link of that chain is missing, the task is left untouched.

mod preview;
mod registry;

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use crate::configuration::PropertyValue;
use crate::graph::{ConfigGraph, Pipeline};
use crate::report::{ScopeKind, TaskLocation};
use crate::task::{FetchTask, PluggableFetchTask};
use crate::validation::{find_pluggable_artifact, resolve_from};

pub use preview::PreviewCipher;
pub use registry::{PluginMetadata, PluginMetadataRegistry, PluginRegistry, SettingMetadata};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EncryptionError(pub String);

/// Cipher backing secure configuration values.
pub trait EncryptionProvider {
    fn encrypt(&self, plain_text: &str) -> Result<String, EncryptionError>;

    /// Whether `value` is already cipher text produced by this provider.
    fn is_encrypted(&self, value: &str) -> bool;
}

impl<T: EncryptionProvider + ?Sized> EncryptionProvider for &T {
    fn encrypt(&self, plain_text: &str) -> Result<String, EncryptionError> {
        (**self).encrypt(plain_text)
    }

    fn is_encrypted(&self, value: &str) -> bool {
        (**self).is_encrypted(value)
    }
}

/// A configuration value turned secure by [`SecurePropertyResolver::encrypt_graph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuredProperty {
    pub location: TaskLocation,
    pub plugin_id: String,
    pub key: String,
}

/// Graph with its secure values encrypted, plus what changed.
#[derive(Debug, Clone)]
pub struct SecuredGraph {
    pub graph: ConfigGraph,
    pub secured: Vec<SecuredProperty>,
}

pub struct SecurePropertyResolver<R, E> {
    registry: R,
    encryption: E,
}

impl<R: PluginMetadataRegistry, E: EncryptionProvider> SecurePropertyResolver<R, E> {
    pub fn new(registry: R, encryption: E) -> Self {
        Self {
            registry,
            encryption,
        }
    }

    /// Encrypts the plain values of `task` that its plugin declares secure.
    ///
    /// `pipeline` is the pipeline owning the task; it need not be the copy
    /// stored in `graph`. Returns the id of the plugin consulted and the
    /// number of values that became encrypted. Calling it again on the same
    /// task changes nothing.
    ///
    /// # Errors
    ///
    /// Fails when the encryption provider fails; the task is then left
    /// unchanged.
    pub fn encrypt_secure_properties(
        &self,
        graph: &ConfigGraph,
        pipeline: &Pipeline,
        task: &mut PluggableFetchTask,
    ) -> Result<Option<(String, usize)>, EncryptionError> {
        let Some(plugin_id) = self.plugin_for(graph, pipeline, task) else {
            return Ok(None);
        };
        let Some(metadata) = self.registry.lookup(&plugin_id) else {
            debug!("Plugin '{plugin_id}' is not registered; leaving configuration of task in '{}' as is", pipeline.name);
            return Ok(None);
        };

        let mut replacements = Vec::new();
        for (index, property) in task.configuration.iter().enumerate() {
            let PropertyValue::Plain(value) = &property.value else {
                continue;
            };
            if !metadata.is_secure(&property.key) {
                continue;
            }

            let cipher_text = if self.encryption.is_encrypted(value) {
                value.clone()
            } else {
                self.encryption.encrypt(value)?
            };
            replacements.push((index, cipher_text));
        }

        let count = replacements.len();
        for (index, cipher_text) in replacements {
            task.configuration[index].value = PropertyValue::Encrypted(cipher_text);
        }

        Ok(Some((plugin_id, count)))
    }

    /// Follows the task to the plugin serving its artifact's store.
    fn plugin_for(
        &self,
        graph: &ConfigGraph,
        pipeline: &Pipeline,
        task: &PluggableFetchTask,
    ) -> Option<String> {
        let target = match resolve_from(graph, pipeline, &task.pipeline) {
            Ok(target) => target,
            Err(error) => {
                debug!("Cannot resolve fetch source of task in '{}': {error}", pipeline.name);
                return None;
            }
        };
        let source = target.pipeline();

        let Some(job) = source
            .stage(&task.stage)
            .and_then(|stage| stage.job(&task.job))
        else {
            debug!(
                "No job {} :: {} :: {}; leaving configuration as is",
                source.name, task.stage, task.job
            );
            return None;
        };

        let Some(artifact) = find_pluggable_artifact(job, &task.artifact_id) else {
            debug!(
                "No pluggable artifact '{}' on {} :: {} :: {}",
                task.artifact_id, source.name, task.stage, task.job
            );
            return None;
        };

        let Some(store) = graph.artifact_stores().find(&artifact.store_id) else {
            debug!("Artifact store '{}' is not registered", artifact.store_id);
            return None;
        };

        if store.plugin_id.trim().is_empty() {
            debug!("Artifact store '{}' names no plugin", store.id);
            return None;
        }

        Some(store.plugin_id.clone())
    }

    /// Runs [`Self::encrypt_secure_properties`] over every pipeline task.
    ///
    /// `graph` itself is not modified; the result carries an updated copy.
    /// Template tasks are skipped since their fetch source is unknown.
    ///
    /// # Errors
    ///
    /// Fails on the first encryption failure.
    pub fn encrypt_graph(&self, graph: &ConfigGraph) -> Result<SecuredGraph, EncryptionError> {
        let mut secured_graph = graph.clone();
        let mut secured = Vec::new();

        for pipeline in graph.pipelines() {
            for (stage_index, stage) in pipeline.stages.iter().enumerate() {
                for (job_index, job) in stage.jobs.iter().enumerate() {
                    for (task_index, task) in job.tasks.iter().enumerate() {
                        let Some(original) = task.as_pluggable() else {
                            continue;
                        };

                        let mut updated = original.clone();
                        let Some((plugin_id, count)) =
                            self.encrypt_secure_properties(graph, pipeline, &mut updated)?
                        else {
                            continue;
                        };
                        if count == 0 {
                            continue;
                        }

                        let location = TaskLocation {
                            scope: ScopeKind::Pipeline,
                            owner: pipeline.name.to_string(),
                            stage: stage.name.to_string(),
                            job: job.name.to_string(),
                            task: task_index + 1,
                        };
                        secured.extend(
                            original
                                .configuration
                                .iter()
                                .zip(&updated.configuration)
                                .filter(|(before, after)| !before.is_encrypted() && after.is_encrypted())
                                .map(|(_, after)| SecuredProperty {
                                    location: location.clone(),
                                    plugin_id: plugin_id.clone(),
                                    key: after.key.clone(),
                                }),
                        );

                        if let Some(target) = secured_graph.pipeline_mut(&pipeline.name) {
                            target.stages[stage_index].jobs[job_index].tasks[task_index] =
                                FetchTask::Pluggable(updated);
                        }
                    }
                }
            }
        }

        if graph.templates().next().is_some() {
            debug!("Template fetch tasks are left as is");
        }
        info!("Secured {} configuration values", secured.len());

        Ok(SecuredGraph {
            graph: secured_graph,
            secured,
        })
    }
}
