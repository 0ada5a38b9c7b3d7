//! Pipelines with compensation
//!
//! A [`CompensatingPipeline`] runs its forward stages like a [`Pipeline`].
//! If any of them fails, by error or by panic, the compensation stage runs
//! exactly once and the original failure is then passed on. Failures of the
//! compensation itself are logged and never replace the original.

use crate::artifact::ArtifactGraph;
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use crate::pipeline::Pipeline;
use crate::stage::PipelineStage;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Pipeline that undoes partial work on failure
#[derive(Debug)]
pub struct CompensatingPipeline {
    forward: Arc<Pipeline>,
    compensation: Arc<dyn PipelineStage>,
}

impl CompensatingPipeline {
    /// Wrap an existing forward pipeline
    #[must_use]
    pub fn new(forward: Arc<Pipeline>, compensation: Arc<dyn PipelineStage>) -> Self {
        Self {
            forward,
            compensation,
        }
    }

    /// Empty forward pipeline called `name`
    #[must_use]
    pub fn named(name: impl Into<String>, compensation: impl PipelineStage + 'static) -> Self {
        Self::new(Arc::new(Pipeline::new(name)), Arc::new(compensation))
    }

    /// Forward stages; stages holding a weak handle may append to it
    #[inline]
    #[must_use]
    pub fn forward(&self) -> &Arc<Pipeline> {
        &self.forward
    }

    /// Append a forward stage
    pub fn append_stage(&self, stage: Arc<dyn PipelineStage>) -> &Self {
        self.forward.append_stage(stage);
        self
    }

    /// Append an owned forward stage
    pub fn append(&self, stage: impl PipelineStage + 'static) -> &Self {
        self.forward.append(stage);
        self
    }

    fn compensate(&self, graph: &mut ArtifactGraph, env: &InstallEnvironment) {
        tracing::warn!(
            pipeline = self.forward.name(),
            compensation = self.compensation.name(),
            "running compensation"
        );

        let outcome =
            panic::catch_unwind(AssertUnwindSafe(|| self.compensation.process(graph, env)));
        let failure = match outcome {
            Ok(Ok(())) => return,
            Ok(Err(error)) => error,
            Err(payload) => DeploymentError::Panicked(panic_message(payload.as_ref())),
        };
        env.log().log_failure("compensation failed", &failure);
    }
}

impl PipelineStage for CompensatingPipeline {
    fn name(&self) -> &str {
        self.forward.name()
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.forward.process(graph, env)));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => {
                env.log().log_failure("pipeline failed", &error);
                self.compensate(graph, env);
                Err(error)
            }
            Err(payload) => {
                let failure = DeploymentError::Panicked(panic_message(payload.as_ref()));
                env.log().log_failure("pipeline failed", &failure);
                self.compensate(graph, env);
                panic::resume_unwind(payload)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_from_payloads() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42_u32), "non-string panic payload");
    }
}
