//! Command implementations behind the `kiln` binary

use crate::config::KernelConfig;
use kiln_artifact::State;
use kiln_pipeline::{
    install_pipeline, DeploymentError, InstallEnvironment, InstallGraphFactory, LogEntry,
    PipelineStage, RecordingInstallLog,
};
use kiln_scope::{ModuleDescriptor, Scope, Scoper, ScopingError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors of the `scope` command
#[derive(Debug, thiserror::Error)]
pub enum ScopeCommandError {
    #[error(transparent)]
    Descriptor(#[from] kiln_scope::DescriptorError),

    #[error(transparent)]
    Scoping(#[from] ScopingError),
}

/// Output of the `scope` command
#[derive(Debug, Clone, Serialize)]
pub struct ScopeReport {
    pub scope: Scope,
    pub descriptors: Vec<ModuleDescriptor>,
}

/// Load `paths` and scope them as `scope_name`
///
/// # Errors
/// Returns error if a descriptor cannot be loaded or scoping fails.
pub fn scope_descriptors(
    paths: &[PathBuf],
    scope_name: &str,
    config: &KernelConfig,
) -> Result<ScopeReport, ScopeCommandError> {
    let mut descriptors = paths
        .iter()
        .map(|path| ModuleDescriptor::from_path(path))
        .collect::<Result<Vec<_>, _>>()?;

    let scope = Scoper::new(&mut descriptors, scope_name)
        .with_options(config.scoper_options())
        .scope()?;
    tracing::info!(scope = scope_name, bundles = descriptors.len(), "descriptors scoped");

    Ok(ScopeReport { scope, descriptors })
}

/// Final state of one artifact after an install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactReport {
    pub identity: String,
    pub state: State,
}

/// Output of the `install` command
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub plan: PathBuf,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub artifacts: Vec<ArtifactReport>,
    pub log: Vec<LogEntry>,
}

/// Build the graph of `plan` and run the standard install pipeline over it
///
/// A failing install still yields a report; only a plan that cannot be
/// turned into a graph is an error.
///
/// # Errors
/// Returns error if the plan or a file it lists cannot be loaded.
pub fn install_plan(plan: &Path, config: &KernelConfig) -> Result<InstallReport, DeploymentError> {
    let mut graph = InstallGraphFactory::default().from_plan_file(plan)?;

    let log = Arc::new(RecordingInstallLog::new());
    let env = InstallEnvironment::new(log.clone());
    let outcome = install_pipeline(config.scoper_options()).process(&mut graph, &env);

    match &outcome {
        Ok(()) => tracing::info!(plan = %plan.display(), "plan installed"),
        Err(error) => tracing::error!(plan = %plan.display(), %error, "plan install failed"),
    }

    let artifacts = graph
        .artifacts()
        .into_iter()
        .map(|artifact| ArtifactReport {
            identity: artifact.identity().to_string(),
            state: artifact.current_state(),
        })
        .collect();

    Ok(InstallReport {
        plan: plan.to_path_buf(),
        succeeded: outcome.is_ok(),
        error: outcome.err().map(|e| e.to_string()),
        artifacts,
        log: log.entries(),
    })
}
