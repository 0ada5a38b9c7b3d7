//! Building install graphs from files
//!
//! A plan file lists the artifacts to install together:
//!
//! ```toml
//! name = "shop"
//! version = "1.0.0"
//! scoped = true
//! atomic = true
//!
//! [[artifacts]]
//! type = "bundle"
//! path = "bundles/web.toml"
//!
//! [[artifacts]]
//! type = "plan"
//! path = "billing.toml"
//!
//! [[artifacts]]
//! type = "configuration"
//! name = "shop.db"
//! properties = { url = "postgres://localhost/shop" }
//! ```
//!
//! Paths are relative to the plan file. A file listed by several plans
//! of the same scope becomes a single node shared by each of them. Each
//! scope gets its own node for the file.

use crate::artifact::{ArtifactGraph, ArtifactPayload, InstallArtifact, PlanAttributes};
use crate::error::DeploymentError;
use crate::graph::NodeId;
use kiln_artifact::{artifact_type, ArtifactIdentity, LocalFileStorage, Version};
use kiln_scope::{read_document, ModuleDescriptor, Scope};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decides the identity of an artifact file
pub trait IdentityDeterminer: Send + Sync {
    /// Identity of `file`, or `None` if this determiner does not recognise it
    ///
    /// # Errors
    /// Returns error if the file is recognised but cannot be read.
    fn determine_identity(
        &self,
        file: &Path,
        scope_name: Option<&str>,
    ) -> Result<Option<ArtifactIdentity>, DeploymentError>;
}

/// Recognises `.json` and `.toml` module descriptors as bundles
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorIdentityDeterminer;

impl IdentityDeterminer for DescriptorIdentityDeterminer {
    fn determine_identity(
        &self,
        file: &Path,
        scope_name: Option<&str>,
    ) -> Result<Option<ArtifactIdentity>, DeploymentError> {
        if !matches!(
            file.extension().and_then(|e| e.to_str()),
            Some("json" | "toml")
        ) {
            return Ok(None);
        }

        let descriptor = ModuleDescriptor::from_path(file)?;
        let identity = match scope_name {
            Some(scope) => ArtifactIdentity::scoped(
                artifact_type::BUNDLE,
                descriptor.symbolic_name,
                descriptor.version,
                scope,
            ),
            None => ArtifactIdentity::new(
                artifact_type::BUNDLE,
                descriptor.symbolic_name,
                descriptor.version,
            ),
        };
        Ok(Some(identity))
    }
}

/// Plan file contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub scoped: bool,
    #[serde(default)]
    pub atomic: bool,
    #[serde(default)]
    pub artifacts: Vec<PlanEntry>,
}

/// One artifact listed by a plan
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanEntry {
    #[serde(rename = "type")]
    pub artifact_type: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<Version>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// Builds install graphs from plan and descriptor files
pub struct InstallGraphFactory {
    determiner: Box<dyn IdentityDeterminer>,
}

impl std::fmt::Debug for InstallGraphFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallGraphFactory").finish_non_exhaustive()
    }
}

impl Default for InstallGraphFactory {
    fn default() -> Self {
        Self::new(DescriptorIdentityDeterminer)
    }
}

/// Node sharing is keyed by scope and canonical path
type SharedKey = (Option<String>, PathBuf);

/// Per-build bookkeeping
#[derive(Default)]
struct Build {
    shared: HashMap<SharedKey, NodeId>,
    open_plans: Vec<PathBuf>,
}

impl InstallGraphFactory {
    #[must_use]
    pub fn new(determiner: impl IdentityDeterminer + 'static) -> Self {
        Self {
            determiner: Box::new(determiner),
        }
    }

    /// Graph holding a single bundle
    ///
    /// # Errors
    /// Returns error if the descriptor cannot be read or recognised.
    pub fn from_bundle_file(&self, path: &Path) -> Result<ArtifactGraph, DeploymentError> {
        let artifact = self.bundle_artifact(path, None)?;
        Ok(ArtifactGraph::for_artifact(artifact))
    }

    /// Graph rooted at the plan in `path`
    ///
    /// # Errors
    /// Returns error if any listed file cannot be read or recognised, or a
    /// plan includes itself.
    pub fn from_plan_file(&self, path: &Path) -> Result<ArtifactGraph, DeploymentError> {
        let plan: PlanDescriptor = read_document(path)?;
        let mut build = Build::default();
        build.open_plans.push(key(path));

        let mut graph = ArtifactGraph::for_artifact(plan_artifact(&plan, path, None));
        let root = graph.root();
        let scope = plan_scope(&plan, None);
        self.add_entries(&mut graph, root, &plan, path, scope.as_deref(), &mut build)?;

        tracing::debug!(plan = %plan.name, nodes = graph.node_count(), "install graph built");
        Ok(graph)
    }

    fn add_entries(
        &self,
        graph: &mut ArtifactGraph,
        parent: NodeId,
        plan: &PlanDescriptor,
        plan_path: &Path,
        scope: Option<&str>,
        build: &mut Build,
    ) -> Result<(), DeploymentError> {
        let base = plan_path.parent().unwrap_or_else(|| Path::new(""));

        for entry in &plan.artifacts {
            let path = entry.path.as_ref().map(|p| base.join(p));

            let shared_key = path.as_deref().map(|p| (scope.map(str::to_owned), key(p)));
            if let Some(existing) = shared_key.as_ref().and_then(|k| build.shared.get(k)) {
                graph.add_child(parent, *existing);
                continue;
            }

            let child = match (entry.artifact_type.as_str(), path.as_deref()) {
                (artifact_type::PLAN, Some(path)) => {
                    if build.open_plans.contains(&key(path)) {
                        return Err(invalid(plan_path, format!("plan {} includes itself", path.display())));
                    }
                    let nested: PlanDescriptor = read_document(path)?;
                    let nested_scope = plan_scope(&nested, scope);
                    let id = graph.add_artifact(Some(parent), plan_artifact(&nested, path, scope));

                    build.open_plans.push(key(path));
                    self.add_entries(graph, id, &nested, path, nested_scope.as_deref(), build)?;
                    build.open_plans.pop();
                    id
                }
                (artifact_type::BUNDLE, Some(path)) => {
                    graph.add_artifact(Some(parent), self.bundle_artifact(path, scope)?)
                }
                (artifact_type::CONFIGURATION, _) => {
                    let name = entry
                        .name
                        .clone()
                        .ok_or_else(|| invalid(plan_path, "configuration entry needs a name"))?;
                    let identity = ArtifactIdentity::new(
                        artifact_type::CONFIGURATION,
                        name,
                        entry.version.clone().unwrap_or_default(),
                    );
                    let mut artifact = InstallArtifact::new(
                        identity,
                        ArtifactPayload::Configuration(entry.properties.clone()),
                    );
                    if let Some(path) = path.as_deref() {
                        artifact = artifact.with_storage(Arc::new(LocalFileStorage::new(path)));
                    }
                    graph.add_artifact(Some(parent), artifact)
                }
                (other, Some(path)) => {
                    let name = entry
                        .name
                        .clone()
                        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
                        .ok_or_else(|| DeploymentError::UnknownArtifact(path.to_path_buf()))?;
                    let version = entry.version.clone().unwrap_or_default();
                    let identity = match scope {
                        Some(scope) => ArtifactIdentity::scoped(other, name, version, scope),
                        None => ArtifactIdentity::new(other, name, version),
                    };
                    let artifact = InstallArtifact::new(identity, ArtifactPayload::Opaque)
                        .with_storage(Arc::new(LocalFileStorage::new(path)));
                    graph.add_artifact(Some(parent), artifact)
                }
                (other, None) => {
                    return Err(invalid(plan_path, format!("{other} entry needs a path")));
                }
            };

            if entry.artifact_type != artifact_type::CONFIGURATION {
                for (name, value) in &entry.properties {
                    graph[child].set_property(name.as_str(), value.as_str());
                }
            }
            if let Some(shared_key) = shared_key {
                build.shared.insert(shared_key, child);
            }
        }
        Ok(())
    }

    fn bundle_artifact(
        &self,
        path: &Path,
        scope: Option<&str>,
    ) -> Result<InstallArtifact, DeploymentError> {
        let identity = self
            .determiner
            .determine_identity(path, scope)?
            .ok_or_else(|| DeploymentError::UnknownArtifact(path.to_path_buf()))?;
        let descriptor = ModuleDescriptor::from_path(path)?;

        let mut artifact = InstallArtifact::bundle(descriptor)
            .with_storage(Arc::new(LocalFileStorage::new(path)));
        artifact.set_identity(identity);
        Ok(artifact)
    }
}

fn plan_artifact(plan: &PlanDescriptor, path: &Path, scope: Option<&str>) -> InstallArtifact {
    let name = plan.name.as_str();
    let identity = match plan_scope(plan, scope) {
        Some(scope) => ArtifactIdentity::scoped(artifact_type::PLAN, name, plan.version.clone(), scope),
        None => ArtifactIdentity::new(artifact_type::PLAN, name, plan.version.clone()),
    };
    InstallArtifact::plan(
        identity,
        PlanAttributes {
            scoped: plan.scoped,
            atomic: plan.atomic,
        },
    )
    .with_storage(Arc::new(LocalFileStorage::new(path)))
}

/// Scope members of `plan` belong to; an enclosing scope wins
fn plan_scope(plan: &PlanDescriptor, enclosing: Option<&str>) -> Option<String> {
    match enclosing {
        Some(scope) => Some(scope.to_string()),
        None if plan.scoped => Some(Scope::name_for(&plan.name, &plan.version)),
        None => None,
    }
}

fn key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn invalid(plan: &Path, reason: impl Into<String>) -> DeploymentError {
    DeploymentError::InvalidPlan {
        plan: plan.to_path_buf(),
        reason: reason.into(),
    }
}
