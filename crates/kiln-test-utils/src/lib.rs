//! Testing utilities for the Kiln workspace
//!
//! Shared fixtures: artifacts and graphs, a storage that records what was
//! done to it, and stages that succeed, fail or panic on demand.

#![allow(missing_docs)]

use kiln_artifact::{
    artifact_type, ArtifactIdentity, ArtifactStorage, StorageError, Version,
};
use kiln_pipeline::{
    ArtifactGraph, DeploymentError, InstallArtifact, InstallEnvironment, NodeId, PipelineStage,
    PlanAttributes,
};
use kiln_scope::{ExportedPackage, ModuleDescriptor};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared ordered record of calls
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Number of entries equal to `entry`
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }
}

/// What a scripted stage or storage does when called
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Behavior {
    #[default]
    Succeed,
    Fail(String),
    Panic(String),
}

/// Storage that journals `<name>:<operation>` for every call
#[derive(Debug)]
pub struct RecordingStorage {
    name: String,
    path: PathBuf,
    journal: Journal,
    on_synchronize: Behavior,
    on_roll_back: Behavior,
}

impl RecordingStorage {
    #[must_use]
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(format!("/recording/{name}")),
            name,
            journal: journal.clone(),
            on_synchronize: Behavior::Succeed,
            on_roll_back: Behavior::Succeed,
        }
    }

    #[must_use]
    pub fn failing_synchronize(mut self, message: impl Into<String>) -> Self {
        self.on_synchronize = Behavior::Fail(message.into());
        self
    }

    #[must_use]
    pub fn failing_roll_back(mut self, message: impl Into<String>) -> Self {
        self.on_roll_back = Behavior::Fail(message.into());
        self
    }

    fn record(&self, operation: &str, behavior: &Behavior) -> Result<(), StorageError> {
        self.journal.push(format!("{}:{operation}", self.name));
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(StorageError::Failed(message.clone())),
            Behavior::Panic(message) => panic!("{message}"),
        }
    }
}

impl ArtifactStorage for RecordingStorage {
    fn synchronize(&self) -> Result<(), StorageError> {
        self.record("synchronize", &self.on_synchronize)
    }

    fn synchronize_from(&self, _source_uri: &str) -> Result<(), StorageError> {
        self.record("synchronize_from", &self.on_synchronize)
    }

    fn roll_back(&self) -> Result<(), StorageError> {
        self.record("roll_back", &self.on_roll_back)
    }

    fn delete(&self) -> Result<(), StorageError> {
        self.record("delete", &Behavior::Succeed)
    }

    fn filesystem_view(&self) -> &Path {
        &self.path
    }
}

/// Stage that journals its name and then behaves as scripted
#[derive(Debug)]
pub struct ScriptedStage {
    name: String,
    journal: Journal,
    behavior: Behavior,
}

impl ScriptedStage {
    #[must_use]
    pub fn succeeding(name: impl Into<String>, journal: &Journal) -> Self {
        Self::with_behavior(name, journal, Behavior::Succeed)
    }

    #[must_use]
    pub fn failing(name: impl Into<String>, journal: &Journal) -> Self {
        let name = name.into();
        let message = format!("{name} failed");
        Self::with_behavior(name, journal, Behavior::Fail(message))
    }

    #[must_use]
    pub fn panicking(name: impl Into<String>, journal: &Journal) -> Self {
        let name = name.into();
        let message = format!("{name} panicked");
        Self::with_behavior(name, journal, Behavior::Panic(message))
    }

    #[must_use]
    pub fn with_behavior(name: impl Into<String>, journal: &Journal, behavior: Behavior) -> Self {
        Self {
            name: name.into(),
            journal: journal.clone(),
            behavior,
        }
    }
}

impl PipelineStage for ScriptedStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn process(
        &self,
        _graph: &mut ArtifactGraph,
        _env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        self.journal.push(self.name.clone());
        match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(DeploymentError::stage_failed(&self.name, message.clone())),
            Behavior::Panic(message) => panic!("{message}"),
        }
    }
}

pub fn v(major: u32, minor: u32, micro: u32) -> Version {
    Version::new(major, minor, micro)
}

pub fn bundle(name: &str) -> InstallArtifact {
    InstallArtifact::bundle(ModuleDescriptor::new(name, v(1, 0, 0)))
}

pub fn exporting_bundle(name: &str, package: &str) -> InstallArtifact {
    InstallArtifact::bundle(
        ModuleDescriptor::new(name, v(1, 0, 0)).export(ExportedPackage::new(package, v(1, 0, 0))),
    )
}

pub fn plan(name: &str, scoped: bool) -> InstallArtifact {
    InstallArtifact::plan(
        ArtifactIdentity::new(artifact_type::PLAN, name, v(1, 0, 0)),
        PlanAttributes {
            scoped,
            atomic: true,
        },
    )
}

/// `root -> {left, right}`, both parents of `shared`
pub fn diamond_graph() -> (ArtifactGraph, [NodeId; 4]) {
    let mut graph = ArtifactGraph::for_artifact(plan("root", false));
    let root = graph.root();
    let left = graph.add_artifact(Some(root), bundle("left"));
    let right = graph.add_artifact(Some(root), bundle("right"));
    let shared = graph.add_artifact(Some(left), bundle("shared"));
    graph.add_child(right, shared);
    (graph, [root, left, right, shared])
}
