//! Storage synchronization and rollback

use crate::artifact::ArtifactGraph;
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use crate::stage::PipelineStage;

/// Synchronizes the storage of every reachable artifact
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageSynchronizeStage;

impl PipelineStage for StorageSynchronizeStage {
    fn name(&self) -> &str {
        "synchronize storage"
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let root = graph.root();
        graph.try_visit(root, |graph, id| {
            let artifact = &graph[id];
            if let Some(storage) = artifact.storage() {
                storage.synchronize()?;
                env.log().log(self.name(), "synchronized", &[artifact.identity()]);
            }
            Ok::<_, DeploymentError>(true)
        })
    }
}

/// Compensation: rolls back every storage and resets states to initial
///
/// Carries on past individual failures and reports the first one once
/// every artifact has been handled.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageRollbackStage;

impl PipelineStage for StorageRollbackStage {
    fn name(&self) -> &str {
        "roll back storage"
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let root = graph.root();
        let mut first_failure = None;
        graph.visit(root, |graph, id| {
            let artifact = &graph[id];
            if let Some(storage) = artifact.storage() {
                if let Err(error) = storage.roll_back() {
                    tracing::warn!(artifact = %artifact.identity(), %error, "rollback failed");
                    first_failure.get_or_insert(DeploymentError::from(error));
                }
            }
            artifact.state().set_initial();
            true
        });
        env.log().log(self.name(), "rolled back", &[]);
        first_failure.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::InstallArtifact;
    use kiln_artifact::{LocalFileStorage, State, StorageError, Version};
    use kiln_scope::ModuleDescriptor;
    use std::sync::Arc;

    fn stored_at(path: &std::path::Path) -> ArtifactGraph {
        ArtifactGraph::for_artifact(
            InstallArtifact::bundle(ModuleDescriptor::new("a", Version::zero()))
                .with_storage(Arc::new(LocalFileStorage::new(path))),
        )
    }

    #[test]
    fn test_synchronize_missing_content_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut graph = stored_at(&dir.path().join("absent.jar"));
        let err = StorageSynchronizeStage
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap_err();
        assert!(matches!(err, DeploymentError::Storage(StorageError::NotFound(_))));
    }

    #[test]
    fn test_rollback_resets_state() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut graph = stored_at(file.path());
        let root = graph.root();
        graph[root].state().set_installing();

        StorageRollbackStage
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap();
        assert_eq!(graph[root].current_state(), State::Initial);
    }
}
