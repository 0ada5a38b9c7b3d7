//! Install artifacts
//!
//! The value carried by each node of an install graph. An
//! [`InstallArtifact`] pairs an identity with its lifecycle state, a
//! property bag, the storage holding its content and a type-specific
//! payload.

use crate::graph::{InstallGraph, NodeId};
use kiln_artifact::{
    artifact_type, ArtifactIdentity, ArtifactIdentityScoper, ArtifactState, ArtifactStorage,
    State,
};
use kiln_scope::ModuleDescriptor;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

/// Install graph whose nodes are artifacts
pub type ArtifactGraph = InstallGraph<InstallArtifact>;

/// Plan behaviour flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanAttributes {
    /// Members are confined to a scope of their own
    pub scoped: bool,
    /// Members are started and stopped together
    pub atomic: bool,
}

/// Type-specific content of an artifact
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactPayload {
    Bundle(ModuleDescriptor),
    Plan(PlanAttributes),
    Configuration(BTreeMap<String, String>),
    /// Content the kernel does not interpret
    Opaque,
}

/// Artifact taking part in an install
#[derive(Debug)]
pub struct InstallArtifact {
    identity: ArtifactIdentity,
    state: ArtifactState,
    properties: BTreeMap<String, String>,
    storage: Option<Arc<dyn ArtifactStorage>>,
    payload: ArtifactPayload,
    node: Option<NodeId>,
}

impl InstallArtifact {
    /// Create an artifact in the initial state
    #[must_use]
    pub fn new(identity: ArtifactIdentity, payload: ArtifactPayload) -> Self {
        Self {
            identity,
            state: ArtifactState::new(),
            properties: BTreeMap::new(),
            storage: None,
            payload,
            node: None,
        }
    }

    /// Bundle artifact whose identity is taken from `descriptor`
    #[must_use]
    pub fn bundle(descriptor: ModuleDescriptor) -> Self {
        let identity = ArtifactIdentity::new(
            artifact_type::BUNDLE,
            descriptor.symbolic_name.clone(),
            descriptor.version.clone(),
        );
        Self::new(identity, ArtifactPayload::Bundle(descriptor))
    }

    /// Plan artifact
    #[must_use]
    pub fn plan(identity: ArtifactIdentity, attributes: PlanAttributes) -> Self {
        Self::new(identity, ArtifactPayload::Plan(attributes))
    }

    #[must_use]
    pub fn with_storage(mut self, storage: Arc<dyn ArtifactStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn identity(&self) -> &ArtifactIdentity {
        &self.identity
    }

    /// Replace the identity; the descriptor of a bundle keeps its own name
    pub fn set_identity(&mut self, identity: ArtifactIdentity) {
        self.identity = identity;
    }

    /// Give the artifact the scope `scope_name` and its scoped external name
    ///
    /// Applying the same scope again leaves the identity unchanged.
    pub fn apply_scope(&mut self, scope_name: &str) {
        let identity = self.identity.with_scope(scope_name);
        let unscoped = identity.with_name(ArtifactIdentityScoper::unscoped_name(&identity));
        self.identity = ArtifactIdentityScoper::scope_artifact_identity(&unscoped);
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> &ArtifactState {
        &self.state
    }

    /// Current lifecycle state
    #[inline]
    #[must_use]
    pub fn current_state(&self) -> State {
        self.state.get()
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.properties.insert(key.into(), value.into())
    }

    #[inline]
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Backing storage; synthetic artifacts have none
    #[must_use]
    pub fn storage(&self) -> Option<&Arc<dyn ArtifactStorage>> {
        self.storage.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &ArtifactPayload {
        &self.payload
    }

    /// Module descriptor of a bundle
    #[must_use]
    pub fn descriptor(&self) -> Option<&ModuleDescriptor> {
        match &self.payload {
            ArtifactPayload::Bundle(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    pub fn descriptor_mut(&mut self) -> Option<&mut ModuleDescriptor> {
        match &mut self.payload {
            ArtifactPayload::Bundle(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// Plan flags, if this is a plan
    #[must_use]
    pub fn plan_attributes(&self) -> Option<PlanAttributes> {
        match self.payload {
            ArtifactPayload::Plan(attributes) => Some(attributes),
            _ => None,
        }
    }

    /// Whether this is a plan whose members share a scope
    #[must_use]
    pub fn is_scoped_plan(&self) -> bool {
        self.plan_attributes().is_some_and(|a| a.scoped)
    }

    /// Node rooting this artifact's subtree, once inserted in a graph
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }
}

impl Display for InstallArtifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.identity, self.state.get())
    }
}

impl InstallGraph<InstallArtifact> {
    /// Graph rooted at `root`
    #[must_use]
    pub fn for_artifact(root: InstallArtifact) -> Self {
        let mut graph = InstallGraph::new(root);
        let id = graph.root();
        graph[id].node = Some(id);
        graph
    }

    /// Insert `artifact`, as a child of `parent` when given
    pub fn add_artifact(&mut self, parent: Option<NodeId>, artifact: InstallArtifact) -> NodeId {
        let id = match parent {
            Some(parent) => self.add_child_value(parent, artifact),
            None => self.add_node(artifact),
        };
        self[id].node = Some(id);
        id
    }

    /// Every artifact reachable from the root, in walk order
    #[must_use]
    pub fn artifacts(&self) -> Vec<&InstallArtifact> {
        self.descendants(self.root())
            .into_iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// First reachable artifact with the given identity name
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|id| self[*id].identity().name() == name)
    }
}
