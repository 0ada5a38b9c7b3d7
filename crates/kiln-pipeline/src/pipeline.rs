//! Ordered stage composition

use crate::artifact::ArtifactGraph;
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use crate::stage::PipelineStage;
use parking_lot::RwLock;
use std::sync::Arc;

/// Stage that runs its stages in order
///
/// Stages may be appended at any time, including by a stage of this
/// pipeline while it runs; a stage appended during a run is processed in
/// that same run. The first error stops the run and is returned unchanged.
#[derive(Debug)]
pub struct Pipeline {
    name: String,
    stages: RwLock<Vec<Arc<dyn PipelineStage>>>,
}

impl Pipeline {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: RwLock::new(Vec::new()),
        }
    }

    /// Append a shared stage
    pub fn append_stage(&self, stage: Arc<dyn PipelineStage>) -> &Self {
        tracing::debug!(pipeline = %self.name, stage = stage.name(), "stage appended");
        self.stages.write().push(stage);
        self
    }

    /// Append an owned stage
    pub fn append(&self, stage: impl PipelineStage + 'static) -> &Self {
        self.append_stage(Arc::new(stage))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.read().is_empty()
    }

    /// Names of the stages in order
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.stages
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    fn stage_at(&self, index: usize) -> Option<Arc<dyn PipelineStage>> {
        self.stages.read().get(index).cloned()
    }
}

impl PipelineStage for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        // The lock is released before each stage runs so it may append.
        let mut cursor = 0;
        while let Some(stage) = self.stage_at(cursor) {
            tracing::debug!(pipeline = %self.name, stage = stage.name(), "running stage");
            if let Err(error) = stage.process(graph, env) {
                tracing::debug!(pipeline = %self.name, stage = stage.name(), %error, "stage failed");
                return Err(error);
            }
            cursor += 1;
        }
        Ok(())
    }
}
