//! Error types for artifacts

use crate::state::State;
use crate::version::VersionError;
use std::path::PathBuf;

/// Errors related to artifact identity and lifecycle
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArtifactError {
    /// Lifecycle table does not permit the move
    #[error("illegal state transition: {from} -> {to}")]
    IllegalTransition { from: State, to: State },

    /// Malformed version or range
    #[error(transparent)]
    Version(#[from] VersionError),
}

/// Errors raised by artifact storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying filesystem failure
    #[error("storage i/o failure")]
    Io(#[from] std::io::Error),

    /// Backing content is missing
    #[error("artifact content not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Operation not available for this storage
    #[error("storage does not support {0}")]
    Unsupported(&'static str),

    /// Storage-specific failure
    #[error("storage failure: {0}")]
    Failed(String),
}
