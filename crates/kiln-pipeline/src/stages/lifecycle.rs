//! Lifecycle transitions

use crate::artifact::ArtifactGraph;
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use crate::stage::PipelineStage;
use kiln_artifact::State;

/// Moves every reachable artifact to `target` through the lifecycle table
///
/// Artifacts already in `target` are left alone. The first illegal move
/// stops the stage.
#[derive(Debug, Clone)]
pub struct StateTransitionStage {
    name: String,
    target: State,
}

impl StateTransitionStage {
    #[must_use]
    pub fn new(target: State) -> Self {
        Self {
            name: format!("transition to {target}"),
            target,
        }
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> State {
        self.target
    }
}

impl PipelineStage for StateTransitionStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let root = graph.root();
        let mut moved = 0_usize;
        graph.try_visit(root, |graph, id| {
            let artifact = &graph[id];
            if artifact.state().transition_to(self.target)? {
                moved += 1;
            }
            Ok::<_, DeploymentError>(true)
        })?;
        env.log().log(&self.name, "state changed", &[&self.target, &moved]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::InstallArtifact;
    use kiln_artifact::{ArtifactError, Version};
    use kiln_scope::ModuleDescriptor;

    fn pair() -> ArtifactGraph {
        let mut graph =
            ArtifactGraph::for_artifact(InstallArtifact::bundle(ModuleDescriptor::new("a", Version::zero())));
        let root = graph.root();
        graph.add_artifact(
            Some(root),
            InstallArtifact::bundle(ModuleDescriptor::new("b", Version::zero())),
        );
        graph
    }

    #[test]
    fn test_moves_every_artifact() {
        let mut graph = pair();
        let env = InstallEnvironment::default();
        StateTransitionStage::new(State::Installing)
            .process(&mut graph, &env)
            .unwrap();
        StateTransitionStage::new(State::Installed)
            .process(&mut graph, &env)
            .unwrap();
        assert!(graph
            .artifacts()
            .iter()
            .all(|a| a.current_state() == State::Installed));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut graph = pair();
        let err = StateTransitionStage::new(State::Active)
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeploymentError::Artifact(ArtifactError::IllegalTransition {
                from: State::Initial,
                to: State::Active
            })
        ));
    }

    #[test]
    fn test_name_mentions_target() {
        assert_eq!(
            StateTransitionStage::new(State::Installed).name(),
            "transition to INSTALLED"
        );
    }
}
