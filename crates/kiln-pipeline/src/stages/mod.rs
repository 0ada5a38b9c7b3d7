//! Built-in stages and the standard install pipeline

mod lifecycle;
mod scoping;
mod storage;

pub use lifecycle::StateTransitionStage;
pub use scoping::{ScopingStage, SCOPE_PROPERTY};
pub use storage::{StorageRollbackStage, StorageSynchronizeStage};

use crate::compensation::CompensatingPipeline;
use crate::pipeline::Pipeline;
use kiln_artifact::State;
use kiln_scope::ScoperOptions;
use std::sync::Arc;

/// Name of the nested pipeline holding graph transforms
pub const TRANSFORM_PIPELINE: &str = "transform";

/// Standard install: synchronize, transform, `INSTALLING`, `INSTALLED`
///
/// Any failure rolls storage back and returns every artifact to
/// `INITIAL` before the failure is passed on.
#[must_use]
pub fn install_pipeline(options: ScoperOptions) -> CompensatingPipeline {
    let transform = Pipeline::new(TRANSFORM_PIPELINE);
    transform.append(ScopingStage::new(options));

    let install = Pipeline::new("install");
    install
        .append(StorageSynchronizeStage)
        .append(transform)
        .append(StateTransitionStage::new(State::Installing))
        .append(StateTransitionStage::new(State::Installed));

    CompensatingPipeline::new(Arc::new(install), Arc::new(StorageRollbackStage))
}
