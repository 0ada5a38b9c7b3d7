//! Deployment errors

use kiln_artifact::{ArtifactError, StorageError};
use kiln_scope::{DescriptorError, ScopingError};
use std::path::PathBuf;

/// Failure raised by a pipeline stage
///
/// Every variant except [`DeploymentError::Panicked`] and
/// [`DeploymentError::Unexpected`] is a domain failure: an expected
/// outcome of a bad deployment rather than a defect.
#[derive(Debug, thiserror::Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Scoping(#[from] ScopingError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error("cannot determine the identity of {}", .0.display())]
    UnknownArtifact(PathBuf),

    #[error("invalid plan {}: {reason}", plan.display())]
    InvalidPlan { plan: PathBuf, reason: String },

    #[error("{artifact} belongs to scope {existing} and cannot join scope {scope}")]
    ScopeConflict {
        artifact: String,
        existing: String,
        scope: String,
    },

    #[error("dependencies of {artifact} cannot be satisfied: {reason}")]
    DependencySatisfaction { artifact: String, reason: String },

    #[error("stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("stage panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl DeploymentError {
    /// Shorthand for [`DeploymentError::StageFailed`]
    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Whether this is an expected deployment failure rather than a defect
    #[must_use]
    pub fn is_domain_failure(&self) -> bool {
        !matches!(self, Self::Panicked(_) | Self::Unexpected(_))
    }
}
