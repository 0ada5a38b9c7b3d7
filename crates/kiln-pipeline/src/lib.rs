//! Kiln Install Pipeline
//!
//! Install graphs and the staged pipeline that drives them.
//!
//! # Overview
//!
//! - **InstallGraph**: rooted DAG of artifacts with visit-once traversal
//! - **PipelineStage**: one step over the whole graph
//! - **Pipeline**: ordered stages, itself a stage
//! - **CompensatingPipeline**: runs compensation once when a stage fails
//! - **InstallGraphFactory**: builds graphs from plan and descriptor files
//!
//! # Example
//!
//! ```rust
//! use kiln_artifact::{State, Version};
//! use kiln_pipeline::prelude::*;
//! use kiln_scope::{ModuleDescriptor, ScoperOptions};
//!
//! let mut graph = ArtifactGraph::for_artifact(InstallArtifact::bundle(
//!     ModuleDescriptor::new("web", Version::new(1, 0, 0)),
//! ));
//!
//! let pipeline = install_pipeline(ScoperOptions::default());
//! pipeline
//!     .process(&mut graph, &InstallEnvironment::default())
//!     .unwrap();
//!
//! assert_eq!(graph[graph.root()].current_state(), State::Installed);
//! ```

#![allow(missing_docs)]

pub mod artifact;
pub mod compensation;
pub mod environment;
pub mod error;
pub mod factory;
pub mod graph;
pub mod pipeline;
pub mod stage;
pub mod stages;

// Re-exports
pub use artifact::{ArtifactGraph, ArtifactPayload, InstallArtifact, PlanAttributes};
pub use compensation::CompensatingPipeline;
pub use environment::{
    InstallEnvironment, InstallLog, LogEntry, RecordingInstallLog, TracingInstallLog,
};
pub use error::DeploymentError;
pub use factory::{
    DescriptorIdentityDeterminer, IdentityDeterminer, InstallGraphFactory, PlanDescriptor,
    PlanEntry,
};
pub use graph::{InstallGraph, NodeId};
pub use pipeline::Pipeline;
pub use stage::{FnStage, PipelineStage};
pub use stages::{
    install_pipeline, ScopingStage, StateTransitionStage, StorageRollbackStage,
    StorageSynchronizeStage,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and running pipelines
    pub use crate::{
        install_pipeline, ArtifactGraph, CompensatingPipeline, DeploymentError, InstallArtifact,
        InstallEnvironment, InstallGraph, Pipeline, PipelineStage,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
