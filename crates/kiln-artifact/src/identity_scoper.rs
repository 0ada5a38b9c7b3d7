//! Scoped external names for artifact identities

use crate::identity::{artifact_type, ArtifactIdentity};

/// Separator between a scope name and the name it qualifies
pub const SCOPE_SEPARATOR: &str = "-";

/// Derives the scoped external name of an identity from its scope name
///
/// Identities without a scope, and configuration identities, are never
/// renamed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactIdentityScoper;

impl ArtifactIdentityScoper {
    /// `scope_name + "-" + name`
    #[inline]
    #[must_use]
    pub fn scoped_name(scope_name: &str, name: &str) -> String {
        format!("{scope_name}{SCOPE_SEPARATOR}{name}")
    }

    /// Produce the scoped form of `identity`
    ///
    /// Type, version and scope are preserved; only the name changes.
    #[must_use]
    pub fn scope_artifact_identity(identity: &ArtifactIdentity) -> ArtifactIdentity {
        match Self::scope_of(identity) {
            Some(scope) => identity.with_name(Self::scoped_name(scope, identity.name())),
            None => identity.clone(),
        }
    }

    /// Recover the unscoped name of a scoped identity
    ///
    /// Returns the name unchanged when it does not carry the scope prefix
    /// or would be empty once the prefix is stripped.
    #[must_use]
    pub fn unscoped_name(identity: &ArtifactIdentity) -> String {
        let name = identity.name();
        let Some(scope) = Self::scope_of(identity) else {
            return name.to_string();
        };

        let prefix = Self::scoped_name(scope, "");
        match name.strip_prefix(prefix.as_str()) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => name.to_string(),
        }
    }

    fn scope_of(identity: &ArtifactIdentity) -> Option<&str> {
        if identity.is_type(artifact_type::CONFIGURATION) {
            return None;
        }
        identity.scope_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;

    fn bundle(name: &str, scope: Option<&str>) -> ArtifactIdentity {
        let id = ArtifactIdentity::new(artifact_type::BUNDLE, name, Version::new(1, 0, 0));
        match scope {
            Some(s) => id.with_scope(s),
            None => id,
        }
    }

    #[test]
    fn test_scopes_bundle_name() {
        let scoped = ArtifactIdentityScoper::scope_artifact_identity(&bundle("foo", Some("app-1")));
        assert_eq!(scoped.name(), "app-1-foo");
        assert_eq!(scoped.scope_name(), Some("app-1"));
        assert_eq!(scoped.version(), &Version::new(1, 0, 0));
        assert_eq!(ArtifactIdentityScoper::unscoped_name(&scoped), "foo");
    }

    #[test]
    fn test_unscoped_identity_passes_through() {
        let id = bundle("foo", None);
        assert_eq!(ArtifactIdentityScoper::scope_artifact_identity(&id), id);
        assert_eq!(ArtifactIdentityScoper::unscoped_name(&id), "foo");
    }

    #[test]
    fn test_configuration_is_never_scoped() {
        let id = ArtifactIdentity::scoped(
            artifact_type::CONFIGURATION,
            "db.pid",
            Version::zero(),
            "app-1",
        );
        assert_eq!(ArtifactIdentityScoper::scope_artifact_identity(&id), id);
    }

    #[test]
    fn test_unscoped_name_guards_short_names() {
        // Name is exactly the prefix: nothing would remain.
        let id = bundle("app-1-", Some("app-1"));
        assert_eq!(ArtifactIdentityScoper::unscoped_name(&id), "app-1-");

        let id = bundle("app", Some("app-1"));
        assert_eq!(ArtifactIdentityScoper::unscoped_name(&id), "app");
    }
}
