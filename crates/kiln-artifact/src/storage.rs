//! Artifact storage contract
//!
//! Storage owns the bytes behind an artifact. Install stages synchronize
//! it; compensation rolls it back.

use crate::error::StorageError;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Backing storage of one artifact
///
/// Implementations must be shareable across the pipeline and any
/// monitoring threads.
pub trait ArtifactStorage: Send + Sync + Debug {
    /// Bring the stored copy up to date with its current source
    fn synchronize(&self) -> Result<(), StorageError>;

    /// Replace the stored copy with content from `source_uri`
    fn synchronize_from(&self, source_uri: &str) -> Result<(), StorageError>;

    /// Undo the most recent synchronization
    fn roll_back(&self) -> Result<(), StorageError>;

    /// Remove the stored copy
    fn delete(&self) -> Result<(), StorageError>;

    /// Location of the stored copy on the filesystem
    fn filesystem_view(&self) -> &Path;
}

/// Storage that reads an artifact in place
///
/// Synchronizing only checks that the file is still present; nothing is
/// copied, so rollback has nothing to undo and deletion is refused.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    path: PathBuf,
}

impl LocalFileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactStorage for LocalFileStorage {
    fn synchronize(&self) -> Result<(), StorageError> {
        if self.path.exists() {
            tracing::trace!(path = %self.path.display(), "storage synchronized in place");
            Ok(())
        } else {
            Err(StorageError::NotFound(self.path.clone()))
        }
    }

    fn synchronize_from(&self, _source_uri: &str) -> Result<(), StorageError> {
        Err(StorageError::Unsupported("synchronize from a source uri"))
    }

    fn roll_back(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn delete(&self) -> Result<(), StorageError> {
        Err(StorageError::Unsupported("delete"))
    }

    fn filesystem_view(&self) -> &Path {
        &self.path
    }
}
