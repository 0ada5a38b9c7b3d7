//! Pipeline stages

use crate::artifact::ArtifactGraph;
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use std::fmt::{self, Debug, Formatter};

/// One step of an install
///
/// A stage processes the whole install graph. It may mutate the graph,
/// including adding children, and reports through the environment's log.
/// Pipelines are stages too, so they nest.
pub trait PipelineStage: Send + Sync + Debug {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Process the graph
    ///
    /// # Errors
    /// A returned error stops the enclosing pipeline.
    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError>;
}

type StageFn = dyn Fn(&mut ArtifactGraph, &InstallEnvironment) -> Result<(), DeploymentError>
    + Send
    + Sync;

/// Stage backed by a closure
pub struct FnStage {
    name: String,
    f: Box<StageFn>,
}

impl FnStage {
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ArtifactGraph, &InstallEnvironment) -> Result<(), DeploymentError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

impl Debug for FnStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish_non_exhaustive()
    }
}

impl PipelineStage for FnStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        (self.f)(graph, env)
    }
}
