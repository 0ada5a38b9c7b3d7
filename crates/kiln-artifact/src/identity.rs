//! Artifact identities
//!
//! An [`ArtifactIdentity`] names an installable unit by type, name, version
//! and, when it belongs to a scoped application, the scope name.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Well-known artifact type identifiers
///
/// Artifact types are open strings; these are the ones the kernel itself
/// treats specially.
pub mod artifact_type {
    /// Module bundle
    pub const BUNDLE: &str = "bundle";
    /// Plan grouping other artifacts
    pub const PLAN: &str = "plan";
    /// Configuration (never scoped)
    pub const CONFIGURATION: &str = "configuration";
}

/// Identity of an artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    #[serde(rename = "type")]
    artifact_type: String,
    name: String,
    version: Version,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope_name: Option<String>,
}

impl ArtifactIdentity {
    /// Create unscoped identity
    #[inline]
    #[must_use]
    pub fn new(artifact_type: impl Into<String>, name: impl Into<String>, version: Version) -> Self {
        Self {
            artifact_type: artifact_type.into(),
            name: name.into(),
            version,
            scope_name: None,
        }
    }

    /// Create identity with explicit scope
    #[inline]
    #[must_use]
    pub fn scoped(
        artifact_type: impl Into<String>,
        name: impl Into<String>,
        version: Version,
        scope_name: impl Into<String>,
    ) -> Self {
        Self {
            scope_name: Some(scope_name.into()),
            ..Self::new(artifact_type, name, version)
        }
    }

    /// Artifact type identifier
    #[inline]
    #[must_use]
    pub fn artifact_type(&self) -> &str {
        &self.artifact_type
    }

    /// Artifact name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Artifact version
    #[inline]
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Scope name, if the artifact belongs to a scope
    #[inline]
    #[must_use]
    pub fn scope_name(&self) -> Option<&str> {
        self.scope_name.as_deref()
    }

    /// Whether this identity has the given type
    #[inline]
    #[must_use]
    pub fn is_type(&self, artifact_type: &str) -> bool {
        self.artifact_type == artifact_type
    }

    /// Same identity with a different name
    #[inline]
    #[must_use]
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..self.clone()
        }
    }

    /// Same identity placed in `scope_name`
    #[inline]
    #[must_use]
    pub fn with_scope(&self, scope_name: impl Into<String>) -> Self {
        Self {
            scope_name: Some(scope_name.into()),
            ..self.clone()
        }
    }
}

impl Display for ArtifactIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.artifact_type, self.name, self.version)?;
        if let Some(scope) = &self.scope_name {
            write!(f, " (scope {scope})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_display() {
        let id = ArtifactIdentity::new(artifact_type::BUNDLE, "foo", Version::new(1, 0, 0));
        assert_eq!(id.to_string(), "bundle:foo:1.0.0");

        let scoped = id.with_scope("app-1");
        assert_eq!(scoped.to_string(), "bundle:foo:1.0.0 (scope app-1)");
    }

    #[test]
    fn test_identity_serde_uses_type_key() {
        let id = ArtifactIdentity::scoped("plan", "app", Version::new(1, 2, 0), "app-1.2");
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["type"], "plan");
        assert_eq!(json["version"], "1.2.0");

        let back: ArtifactIdentity = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }
}
