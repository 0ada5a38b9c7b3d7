//! Scoping transform
//!
//! Every scoped plan reachable from the root becomes a scope. Its members
//! receive the scope in their identity, their descriptors are rewritten by
//! the [`Scoper`], and a synthetic context bundle importing every scoped
//! export is attached beneath the plan.

use crate::artifact::{ArtifactGraph, InstallArtifact};
use crate::environment::InstallEnvironment;
use crate::error::DeploymentError;
use crate::graph::NodeId;
use crate::stage::PipelineStage;
use kiln_artifact::{artifact_type, ArtifactIdentity, Version};
use kiln_scope::{Scope, Scoper, ScoperOptions};

/// Property set on a plan once its scope has been built
pub const SCOPE_PROPERTY: &str = "kiln.scope";

/// Stage applying scoping to every scoped plan
#[derive(Debug, Clone, Default)]
pub struct ScopingStage {
    options: ScoperOptions,
}

impl ScopingStage {
    #[must_use]
    pub fn new(options: ScoperOptions) -> Self {
        Self { options }
    }

    fn scope_plan(
        &self,
        graph: &mut ArtifactGraph,
        plan: NodeId,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let plan_identity = graph[plan].identity().clone();
        let scope_name = plan_identity.scope_name().map_or_else(
            || Scope::name_for(plan_identity.name(), plan_identity.version()),
            str::to_owned,
        );

        let members: Vec<NodeId> = graph
            .descendants(plan)
            .into_iter()
            .filter(|id| *id != plan)
            .collect();
        // A member already in another scope would be pulled out of it.
        for id in &members {
            let identity = graph[*id].identity();
            if let Some(existing) = identity.scope_name().filter(|s| *s != scope_name) {
                return Err(DeploymentError::ScopeConflict {
                    artifact: identity.to_string(),
                    existing: existing.to_string(),
                    scope: scope_name,
                });
            }
        }
        let bundles: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|id| graph[*id].descriptor().is_some())
            .collect();
        let mut descriptors: Vec<_> = bundles
            .iter()
            .filter_map(|id| graph[*id].descriptor().cloned())
            .collect();

        // Nothing is written back unless scoping succeeds.
        let scope = Scoper::new(&mut descriptors, scope_name.as_str())
            .with_options(self.options.clone())
            .scope()?;

        for (id, descriptor) in bundles.iter().zip(descriptors) {
            if let Some(slot) = graph[*id].descriptor_mut() {
                *slot = descriptor;
            }
        }
        for id in &members {
            graph[*id].apply_scope(&scope_name);
        }
        let scoped_plan = plan_identity.with_scope(scope_name.as_str());
        graph[plan].set_identity(scoped_plan);
        graph[plan].set_property(SCOPE_PROPERTY, scope_name.as_str());

        let context = scope.synthetic_context_descriptor(&self.options.scope_attribute);
        let context_identity = ArtifactIdentity::scoped(
            artifact_type::BUNDLE,
            context.symbolic_name.clone(),
            Version::zero(),
            scope_name.as_str(),
        );
        let mut context_artifact = InstallArtifact::bundle(context);
        context_artifact.set_identity(context_identity);
        graph.add_artifact(Some(plan), context_artifact);

        for warning in scope.warnings() {
            tracing::warn!(scope = %scope_name, %warning, "scoping warning");
            env.log().log(self.name(), "scoping warning", &[&scope_name, warning]);
        }
        env.log().log(
            self.name(),
            "plan scoped",
            &[&plan_identity, &scope_name, &scope.bundles().len()],
        );
        Ok(())
    }
}

impl PipelineStage for ScopingStage {
    fn name(&self) -> &str {
        "scoping"
    }

    fn process(
        &self,
        graph: &mut ArtifactGraph,
        env: &InstallEnvironment,
    ) -> Result<(), DeploymentError> {
        let root = graph.root();
        graph.try_visit(root, |graph, id| {
            if !graph[id].is_scoped_plan() {
                return Ok(true);
            }
            if graph[id].property(SCOPE_PROPERTY).is_none() {
                self.scope_plan(graph, id, env)?;
            }
            // A nested scoped plan joins the enclosing scope.
            Ok(false)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::PlanAttributes;
    use crate::environment::RecordingInstallLog;
    use kiln_scope::{ExportedPackage, ModuleDescriptor, ScopingError};
    use std::sync::Arc;

    fn v(major: u32, minor: u32) -> Version {
        Version::new(major, minor, 0)
    }

    fn shop(scoped: bool) -> ArtifactGraph {
        let plan = InstallArtifact::plan(
            ArtifactIdentity::new(artifact_type::PLAN, "shop", v(1, 0)),
            PlanAttributes {
                scoped,
                atomic: true,
            },
        );
        let mut graph = ArtifactGraph::for_artifact(plan);
        let root = graph.root();
        graph.add_artifact(
            Some(root),
            InstallArtifact::bundle(
                ModuleDescriptor::new("web", v(1, 0)).export(ExportedPackage::new("p", v(1, 0))),
            ),
        );
        graph
    }

    #[test]
    fn test_scoped_plan_rewrites_members_and_adds_context() {
        let mut graph = shop(true);
        let log = Arc::new(RecordingInstallLog::new());
        let env = InstallEnvironment::new(log.clone());

        ScopingStage::default().process(&mut graph, &env).unwrap();

        let root = graph.root();
        let children = graph.children(root);
        assert_eq!(children.len(), 2);

        let web = &graph[children[0]];
        assert_eq!(web.identity().name(), "shop-1.0-web");
        assert_eq!(web.identity().scope_name(), Some("shop-1.0"));
        assert_eq!(web.descriptor().unwrap().symbolic_name, "shop-1.0-web");

        let context = &graph[children[1]];
        assert_eq!(context.identity().name(), "shop-1.0-synthetic.context");
        assert_eq!(context.descriptor().unwrap().imports[0].name, "p");

        assert_eq!(graph[root].identity().scope_name(), Some("shop-1.0"));
        assert_eq!(graph[root].identity().name(), "shop");
        assert_eq!(log.events(), vec!["plan scoped"]);
    }

    #[test]
    fn test_second_run_is_noop() {
        let mut graph = shop(true);
        let env = InstallEnvironment::default();
        let stage = ScopingStage::default();
        stage.process(&mut graph, &env).unwrap();
        stage.process(&mut graph, &env).unwrap();
        assert_eq!(graph.children(graph.root()).len(), 2);
    }

    #[test]
    fn test_unscoped_plan_untouched() {
        let mut graph = shop(false);
        ScopingStage::default()
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap();
        let children = graph.children(graph.root());
        assert_eq!(children.len(), 1);
        assert_eq!(graph[children[0]].identity().name(), "web");
    }

    #[test]
    fn test_member_shared_between_scopes_rejected() {
        let mut graph = ArtifactGraph::for_artifact(InstallArtifact::plan(
            ArtifactIdentity::new(artifact_type::PLAN, "root", v(1, 0)),
            PlanAttributes::default(),
        ));
        let root = graph.root();
        let scoped = PlanAttributes {
            scoped: true,
            atomic: false,
        };
        let a = graph.add_artifact(
            Some(root),
            InstallArtifact::plan(ArtifactIdentity::new(artifact_type::PLAN, "a", v(1, 0)), scoped),
        );
        let b = graph.add_artifact(
            Some(root),
            InstallArtifact::plan(ArtifactIdentity::new(artifact_type::PLAN, "b", v(1, 0)), scoped),
        );
        let common = graph.add_artifact(
            Some(a),
            InstallArtifact::bundle(
                ModuleDescriptor::new("common", v(1, 0)).export(ExportedPackage::new("c", v(1, 0))),
            ),
        );
        graph.add_child(b, common);

        let err = ScopingStage::default()
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeploymentError::ScopeConflict { ref existing, ref scope, .. }
                if existing == "a-1.0" && scope == "b-1.0"
        ));
        assert_eq!(graph[common].identity().name(), "a-1.0-common");
        assert_eq!(
            graph[common].descriptor().unwrap().exports[0].attributes["module_scope"],
            "a-1.0"
        );
        assert!(graph[b].property(SCOPE_PROPERTY).is_none());
    }

    #[test]
    fn test_failed_scoping_leaves_graph_unchanged() {
        let mut graph = shop(true);
        let root = graph.root();
        graph.add_artifact(
            Some(root),
            InstallArtifact::bundle(
                ModuleDescriptor::new("admin", v(1, 0)).export(ExportedPackage::new("p", v(2, 0))),
            ),
        );

        let err = ScopingStage::default()
            .process(&mut graph, &InstallEnvironment::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DeploymentError::Scoping(ScopingError::DuplicateExport { .. })
        ));
        let web = &graph[graph.children(root)[0]];
        assert_eq!(web.identity().name(), "web");
        assert_eq!(web.descriptor().unwrap().symbolic_name, "web");
        assert!(graph[root].property(SCOPE_PROPERTY).is_none());
    }
}
