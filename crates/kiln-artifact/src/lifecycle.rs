//! Artifact lifecycle transitions

use crate::error::ArtifactError;
use crate::state::State;

/// Validates a lifecycle transition.
///
/// Only consulted by [`crate::ArtifactState::transition_to`]; the plain
/// setters stay permissive so that rollback can always restore a state.
pub fn validate_transition(from: State, to: State) -> Result<(), ArtifactError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(ArtifactError::IllegalTransition { from, to })
    }
}

pub fn allowed_transitions(from: State) -> Vec<State> {
    use State::*;
    match from {
        Initial => vec![Installing],
        Installing => vec![Installed, Initial],
        Installed => vec![Resolving, Starting, Uninstalling],
        Resolving => vec![Resolved, Installed],
        Resolved => vec![Starting, Installed, Uninstalling],
        Starting => vec![Active, Resolved],
        Active => vec![Stopping],
        Stopping => vec![Resolved, Active],
        Uninstalling => vec![Uninstalled],
        Uninstalled => vec![],
    }
}

fn allowed(from: State, to: State) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
