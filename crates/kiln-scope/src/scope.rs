//! Scopes
//!
//! A [`Scope`] is a named namespace partition. It records the bundles that
//! belong to it and the packages they export, and collects the warnings
//! raised while references were rewritten.

use crate::descriptor::{ImportedPackage, ModuleDescriptor};
use indexmap::IndexMap;
use kiln_artifact::{ArtifactIdentityScoper, Version, VersionRange, SCOPE_SEPARATOR};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Suffix of the synthetic context bundle's symbolic name
pub const SYNTHETIC_CONTEXT_SUFFIX: &str = "synthetic.context";

/// Namespace partition built by the scoper
///
/// Bundle names are recorded unscoped; [`Scope::scoped_name`] produces the
/// rewritten form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    name: String,
    bundles: IndexMap<String, Version>,
    exports: IndexMap<String, Version>,
    warnings: Vec<ScopingWarning>,
}

impl Scope {
    /// Create empty scope
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bundles: IndexMap::new(),
            exports: IndexMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Conventional scope name `<name>-<major.minor>`
    #[inline]
    #[must_use]
    pub fn name_for(name: &str, version: &Version) -> String {
        format!("{name}{SCOPE_SEPARATOR}{}", version.short())
    }

    /// Scope name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `name + "-"`
    #[inline]
    #[must_use]
    pub fn prefix(&self) -> String {
        ArtifactIdentityScoper::scoped_name(&self.name, "")
    }

    /// Prefixed form of `name`; already-prefixed names are returned as is
    #[must_use]
    pub fn scoped_name(&self, name: &str) -> String {
        ArtifactIdentityScoper::scoped_name(&self.name, self.unscoped(name))
    }

    /// `name` without this scope's prefix
    ///
    /// A name that is nothing but the prefix is left unchanged.
    #[must_use]
    pub fn unscoped<'a>(&self, name: &'a str) -> &'a str {
        match name
            .strip_prefix(self.name.as_str())
            .and_then(|rest| rest.strip_prefix(SCOPE_SEPARATOR))
        {
            Some(rest) if !rest.is_empty() => rest,
            _ => name,
        }
    }

    /// Unscoped symbolic name → version of every bundle in the scope
    #[inline]
    #[must_use]
    pub fn bundles(&self) -> &IndexMap<String, Version> {
        &self.bundles
    }

    /// Package name → version of every package exported in the scope
    #[inline]
    #[must_use]
    pub fn exports(&self) -> &IndexMap<String, Version> {
        &self.exports
    }

    /// Warnings raised while rewriting references
    #[inline]
    #[must_use]
    pub fn warnings(&self) -> &[ScopingWarning] {
        &self.warnings
    }

    /// Version of bundle `name` (scoped or not), if it belongs to the scope
    #[must_use]
    pub fn bundle_version(&self, name: &str) -> Option<&Version> {
        self.bundles.get(self.unscoped(name))
    }

    /// Whether bundle `name` (scoped or not) belongs to the scope
    #[must_use]
    pub fn contains_bundle(&self, name: &str) -> bool {
        self.bundle_version(name).is_some()
    }

    /// Recorded version of exported `package`
    #[must_use]
    pub fn export_version(&self, package: &str) -> Option<&Version> {
        self.exports.get(package)
    }

    pub(crate) fn record_bundle(&mut self, name: String, version: Version) {
        self.bundles.insert(name, version);
    }

    pub(crate) fn record_export(&mut self, package: String, version: Version) {
        self.exports.insert(package, version);
    }

    pub(crate) fn push_warning(&mut self, warning: ScopingWarning) {
        self.warnings.push(warning);
    }

    /// Symbolic name of the synthetic context bundle
    #[must_use]
    pub fn synthetic_context_name(&self) -> String {
        self.scoped_name(SYNTHETIC_CONTEXT_SUFFIX)
    }

    /// Descriptor of a bundle that imports every package exported in the
    /// scope, pinned to its exact version and tagged with the scope attribute
    #[must_use]
    pub fn synthetic_context_descriptor(&self, scope_attribute: &str) -> ModuleDescriptor {
        let mut descriptor = ModuleDescriptor::new(self.synthetic_context_name(), Version::zero());
        for (package, version) in &self.exports {
            let mut import = ImportedPackage::new(package.clone(), VersionRange::exactly(version.clone()));
            import
                .attributes
                .insert(scope_attribute.to_string(), self.name.clone());
            descriptor.imports.push(import);
        }
        descriptor
    }
}

/// Non-fatal condition found while rewriting references
///
/// The offending reference is left unscoped, so it may still resolve
/// outside the scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScopingWarning {
    /// Package import whose range excludes the in-scope export
    ImportOutsideScope {
        bundle: String,
        package: String,
        range: VersionRange,
        export_version: Version,
    },
    /// Bundle reference whose range excludes the in-scope bundle
    BundleReferenceOutsideScope {
        bundle: String,
        target: String,
        range: VersionRange,
        target_version: Version,
    },
}

impl Display for ScopingWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScopingWarning::ImportOutsideScope {
                bundle,
                package,
                range,
                export_version,
            } => write!(
                f,
                "bundle '{bundle}' imports package '{package}' with range {range} which excludes the scoped export at {export_version}; import left unscoped"
            ),
            ScopingWarning::BundleReferenceOutsideScope {
                bundle,
                target,
                range,
                target_version,
            } => write!(
                f,
                "bundle '{bundle}' references bundle '{target}' with range {range} which excludes the scoped bundle at {target_version}; reference left unscoped"
            ),
        }
    }
}
