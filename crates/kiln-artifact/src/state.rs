//! Artifact lifecycle state
//!
//! [`ArtifactState`] is a lock-protected cell holding one [`State`]. The
//! plain setters accept any transition and report whether the stored value
//! changed; [`ArtifactState::transition_to`] additionally consults the
//! lifecycle table in [`crate::lifecycle`].

use crate::error::ArtifactError;
use crate::lifecycle;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Lifecycle states of an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    #[default]
    Initial,
    Installing,
    Installed,
    Resolving,
    Resolved,
    Starting,
    Active,
    Stopping,
    Uninstalling,
    Uninstalled,
}

impl State {
    /// Every state, in lifecycle order
    pub const ALL: [State; 10] = [
        State::Initial,
        State::Installing,
        State::Installed,
        State::Resolving,
        State::Resolved,
        State::Starting,
        State::Active,
        State::Stopping,
        State::Uninstalling,
        State::Uninstalled,
    ];

    /// Upper-case name, e.g. `INSTALLED`
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            State::Initial => "INITIAL",
            State::Installing => "INSTALLING",
            State::Installed => "INSTALLED",
            State::Resolving => "RESOLVING",
            State::Resolved => "RESOLVED",
            State::Starting => "STARTING",
            State::Active => "ACTIVE",
            State::Stopping => "STOPPING",
            State::Uninstalling => "UNINSTALLING",
            State::Uninstalled => "UNINSTALLED",
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread-safe state cell held by every artifact
///
/// All reads and writes go through one mutex per instance; there is no
/// ordering between distinct cells.
#[derive(Debug, Default)]
pub struct ArtifactState {
    state: Mutex<State>,
}

impl ArtifactState {
    /// New cell in [`State::Initial`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn get(&self) -> State {
        *self.state.lock()
    }

    /// Store `state` unconditionally; `true` iff the value changed
    pub fn set(&self, state: State) -> bool {
        let mut guard = self.state.lock();
        let changed = *guard != state;
        *guard = state;
        changed
    }

    /// Apply `to` only if the lifecycle table allows it from the current state
    ///
    /// Re-entering the current state is a no-op and yields `Ok(false)`.
    ///
    /// # Errors
    /// Returns [`ArtifactError::IllegalTransition`] when the move is not in
    /// the lifecycle table; the stored state is left untouched.
    pub fn transition_to(&self, to: State) -> Result<bool, ArtifactError> {
        let mut guard = self.state.lock();
        let from = *guard;
        if from == to {
            return Ok(false);
        }
        lifecycle::validate_transition(from, to)?;
        *guard = to;
        Ok(true)
    }

    pub fn set_initial(&self) -> bool {
        self.set(State::Initial)
    }

    pub fn set_installing(&self) -> bool {
        self.set(State::Installing)
    }

    pub fn set_installed(&self) -> bool {
        self.set(State::Installed)
    }

    pub fn set_resolving(&self) -> bool {
        self.set(State::Resolving)
    }

    pub fn set_resolved(&self) -> bool {
        self.set(State::Resolved)
    }

    pub fn set_starting(&self) -> bool {
        self.set(State::Starting)
    }

    pub fn set_active(&self) -> bool {
        self.set(State::Active)
    }

    pub fn set_stopping(&self) -> bool {
        self.set(State::Stopping)
    }

    pub fn set_uninstalling(&self) -> bool {
        self.set(State::Uninstalling)
    }

    pub fn set_uninstalled(&self) -> bool {
        self.set(State::Uninstalled)
    }
}
