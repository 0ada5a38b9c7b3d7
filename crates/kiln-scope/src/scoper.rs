//! Scoping transform
//!
//! Rewrites a set of module descriptors so that references between them
//! resolve only inside their scope.
//!
//! # Algorithm
//! 1. **Referents pass**: every descriptor, in input order, is validated and
//!    contributes its exports and its symbolic name to the [`Scope`].
//!    Exports are tagged with the scope attribute and made mandatory.
//! 2. **References pass**: with the scope fully known, imports, dynamic
//!    imports, required bundles, imported bundles and fragment hosts that
//!    target the scope are tagged or prefixed.
//!
//! The passes never interleave: a reference can only be judged once the
//! complete export and bundle tables exist.

use crate::descriptor::{BundleReference, ModuleDescriptor};
use crate::scope::{Scope, ScopingWarning};
use kiln_artifact::Version;

/// Attribute attached to scoped exports and imports
pub const DEFAULT_SCOPE_ATTRIBUTE: &str = "module_scope";

/// Oldest metadata format that can be scoped
pub const MINIMUM_MANIFEST_VERSION: u32 = 2;

/// Scoping knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoperOptions {
    /// Tolerate two descriptors exporting the same package; the first
    /// export's version is recorded
    pub allow_duplicate_exports: bool,
    /// Descriptors below this metadata format are unscopable
    pub minimum_manifest_version: u32,
    /// Name of the scope-membership attribute
    pub scope_attribute: String,
}

impl Default for ScoperOptions {
    fn default() -> Self {
        Self {
            allow_duplicate_exports: false,
            minimum_manifest_version: MINIMUM_MANIFEST_VERSION,
            scope_attribute: DEFAULT_SCOPE_ATTRIBUTE.to_string(),
        }
    }
}

/// Single-use scoping transform over one candidate set of descriptors
///
/// Descriptors are mutated in place. [`Scoper::scope`] consumes the scoper
/// and returns the populated [`Scope`].
///
/// # Example
/// ```
/// use kiln_artifact::{Version, VersionRange};
/// use kiln_scope::{ExportedPackage, ImportedPackage, ModuleDescriptor, Scoper};
///
/// let mut descriptors = vec![
///     ModuleDescriptor::new("a", Version::new(1, 0, 0))
///         .export(ExportedPackage::new("p", Version::new(1, 0, 0))),
///     ModuleDescriptor::new("b", Version::new(1, 0, 0))
///         .import(ImportedPackage::new("p", VersionRange::unbounded())),
/// ];
///
/// let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();
/// assert_eq!(descriptors[0].symbolic_name, "app-1-a");
/// assert_eq!(descriptors[1].imports[0].attributes["module_scope"], "app-1");
/// assert!(scope.warnings().is_empty());
/// ```
#[derive(Debug)]
pub struct Scoper<'a> {
    descriptors: &'a mut [ModuleDescriptor],
    scope: Scope,
    options: ScoperOptions,
}

impl<'a> Scoper<'a> {
    /// Create scoper with default options
    #[must_use]
    pub fn new(descriptors: &'a mut [ModuleDescriptor], scope_name: impl Into<String>) -> Self {
        Self {
            descriptors,
            scope: Scope::new(scope_name),
            options: ScoperOptions::default(),
        }
    }

    /// Replace options
    #[must_use]
    pub fn with_options(mut self, options: ScoperOptions) -> Self {
        self.options = options;
        self
    }

    /// Toggle duplicate-export tolerance for this run
    #[must_use]
    pub fn allow_duplicate_exports(mut self, allow: bool) -> Self {
        self.options.allow_duplicate_exports = allow;
        self
    }

    /// Run both passes
    ///
    /// # Errors
    /// - [`ScopingError::UnsupportedManifestVersion`] for a descriptor below
    ///   the minimum metadata format
    /// - [`ScopingError::DuplicateExport`] when two descriptors export one
    ///   package and duplicates are not allowed
    /// - [`ScopingError::DuplicateBundle`] when two descriptors share a
    ///   symbolic name
    ///
    /// On error the descriptors may be partially rewritten.
    pub fn scope(mut self) -> Result<Scope, ScopingError> {
        for index in 0..self.descriptors.len() {
            self.scope_referents(index)?;
        }
        for index in 0..self.descriptors.len() {
            self.scope_references(index);
        }

        tracing::debug!(
            scope = self.scope.name(),
            bundles = self.scope.bundles().len(),
            exports = self.scope.exports().len(),
            warnings = self.scope.warnings().len(),
            "scope built"
        );
        Ok(self.scope)
    }

    fn scope_referents(&mut self, index: usize) -> Result<(), ScopingError> {
        let descriptor = &self.descriptors[index];
        if descriptor.manifest_version < self.options.minimum_manifest_version {
            return Err(ScopingError::UnsupportedManifestVersion {
                symbolic_name: descriptor.symbolic_name.clone(),
                found: descriptor.manifest_version,
                minimum: self.options.minimum_manifest_version,
            });
        }

        let exports: Vec<(String, Version)> = descriptor
            .exports
            .iter()
            .map(|e| (e.name.clone(), e.version.clone()))
            .collect();

        for (package, version) in exports {
            if self.scope.export_version(&package).is_none() {
                self.scope.record_export(package, version);
            } else if self.options.allow_duplicate_exports {
                tracing::debug!(
                    scope = self.scope.name(),
                    package = %package,
                    "duplicate export tolerated, keeping first version"
                );
            } else {
                return Err(ScopingError::DuplicateExport {
                    scope: self.scope.name().to_string(),
                    exporters: self.exporters_of(&package),
                    package,
                });
            }
        }

        let unscoped = self
            .scope
            .unscoped(&self.descriptors[index].symbolic_name)
            .to_string();
        if self.scope.contains_bundle(&unscoped) {
            return Err(ScopingError::DuplicateBundle {
                scope: self.scope.name().to_string(),
                symbolic_name: unscoped,
            });
        }

        let Self {
            descriptors,
            scope,
            options,
        } = self;
        let descriptor = &mut descriptors[index];
        for export in &mut descriptor.exports {
            export
                .attributes
                .insert(options.scope_attribute.clone(), scope.name().to_string());
            export.mandatory.insert(options.scope_attribute.clone());
        }
        descriptor.symbolic_name = scope.scoped_name(&unscoped);
        scope.record_bundle(unscoped, descriptor.version.clone());
        Ok(())
    }

    fn scope_references(&mut self, index: usize) {
        let Self {
            descriptors,
            scope,
            options,
        } = self;
        let descriptor = &mut descriptors[index];
        let bundle = scope.unscoped(&descriptor.symbolic_name).to_string();
        let attribute = options.scope_attribute.as_str();
        let mut warnings = Vec::new();

        for import in &mut descriptor.imports {
            let Some(export_version) = scope.export_version(&import.name) else {
                continue;
            };
            if import.version.includes(export_version) {
                import
                    .attributes
                    .insert(attribute.to_string(), scope.name().to_string());
                scope_pinned_bundle(scope, &mut import.bundle_symbolic_name);
            } else {
                warnings.push(ScopingWarning::ImportOutsideScope {
                    bundle: bundle.clone(),
                    package: import.name.clone(),
                    range: import.version.clone(),
                    export_version: export_version.clone(),
                });
            }
        }

        for import in &mut descriptor.dynamic_imports {
            if import.is_wildcard() {
                continue;
            }
            let Some(export_version) = scope.export_version(&import.pattern) else {
                continue;
            };
            if import.version.includes(export_version) {
                import
                    .attributes
                    .insert(attribute.to_string(), scope.name().to_string());
                scope_pinned_bundle(scope, &mut import.bundle_symbolic_name);
            } else {
                warnings.push(ScopingWarning::ImportOutsideScope {
                    bundle: bundle.clone(),
                    package: import.pattern.clone(),
                    range: import.version.clone(),
                    export_version: export_version.clone(),
                });
            }
        }

        let references = descriptor
            .required_bundles
            .iter_mut()
            .chain(descriptor.imported_bundles.iter_mut())
            .chain(descriptor.fragment_host.iter_mut());
        for reference in references {
            if let Some(warning) = scope_bundle_reference(scope, &bundle, reference) {
                warnings.push(warning);
            }
        }

        for warning in warnings {
            tracing::warn!(scope = scope.name(), "{warning}");
            scope.push_warning(warning);
        }
    }

    /// Every descriptor in the candidate set that exports `package`
    fn exporters_of(&self, package: &str) -> Vec<String> {
        self.descriptors
            .iter()
            .filter(|d| d.exports_package(package))
            .map(|d| self.scope.unscoped(&d.symbolic_name).to_string())
            .collect()
    }
}

fn scope_pinned_bundle(scope: &Scope, pinned: &mut Option<String>) {
    if let Some(name) = pinned {
        if scope.contains_bundle(name) {
            *name = scope.scoped_name(name);
        }
    }
}

fn scope_bundle_reference(
    scope: &Scope,
    bundle: &str,
    reference: &mut BundleReference,
) -> Option<ScopingWarning> {
    let target_version = scope.bundle_version(&reference.symbolic_name)?;
    if reference.version.includes(target_version) {
        reference.symbolic_name = scope.scoped_name(&reference.symbolic_name);
        None
    } else {
        Some(ScopingWarning::BundleReferenceOutsideScope {
            bundle: bundle.to_string(),
            target: scope.unscoped(&reference.symbolic_name).to_string(),
            range: reference.version.clone(),
            target_version: target_version.clone(),
        })
    }
}

/// Conditions that make a candidate set unscopable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopingError {
    /// Descriptor uses a metadata format older than the minimum
    #[error("bundle '{symbolic_name}' uses metadata format {found}; scoping requires at least {minimum}")]
    UnsupportedManifestVersion {
        symbolic_name: String,
        found: u32,
        minimum: u32,
    },

    /// Package exported by more than one descriptor
    #[error("package '{package}' is exported by more than one bundle in scope '{scope}': {exporters:?}")]
    DuplicateExport {
        scope: String,
        package: String,
        exporters: Vec<String>,
    },

    /// Two descriptors share a symbolic name
    #[error("bundle symbolic name '{symbolic_name}' occurs more than once in scope '{scope}'")]
    DuplicateBundle {
        scope: String,
        symbolic_name: String,
    },
}

impl ScopingError {
    /// Scope in which the error occurred, when known
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::UnsupportedManifestVersion { .. } => None,
            Self::DuplicateExport { scope, .. } | Self::DuplicateBundle { scope, .. } => {
                Some(scope)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{DynamicImport, ExportedPackage, ImportedPackage};
    use kiln_artifact::VersionRange;
    use pretty_assertions::assert_eq;

    fn v(major: u32) -> Version {
        Version::new(major, 0, 0)
    }

    fn range(s: &str) -> VersionRange {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejects_old_manifest_format() {
        let mut descriptors = vec![ModuleDescriptor::new("legacy", v(1)).with_manifest_version(1)];
        let err = Scoper::new(&mut descriptors, "app-1").scope().unwrap_err();
        assert_eq!(
            err,
            ScopingError::UnsupportedManifestVersion {
                symbolic_name: "legacy".into(),
                found: 1,
                minimum: 2,
            }
        );
    }

    #[test]
    fn test_exports_become_mandatory_scope_attribute() {
        let mut descriptors =
            vec![ModuleDescriptor::new("a", v(1)).export(ExportedPackage::new("p", v(1)))];
        Scoper::new(&mut descriptors, "app-1").scope().unwrap();

        let export = &descriptors[0].exports[0];
        assert_eq!(export.attributes["module_scope"], "app-1");
        assert!(export.mandatory.contains("module_scope"));
    }

    #[test]
    fn test_duplicate_bundle_names_are_fatal() {
        let mut descriptors = vec![
            ModuleDescriptor::new("a", v(1)),
            ModuleDescriptor::new("app-1-a", v(2)),
        ];
        let err = Scoper::new(&mut descriptors, "app-1").scope().unwrap_err();
        assert!(matches!(
            err,
            ScopingError::DuplicateBundle { ref symbolic_name, .. } if symbolic_name == "a"
        ));
    }

    #[test]
    fn test_already_prefixed_name_is_not_prefixed_twice() {
        let mut descriptors = vec![ModuleDescriptor::new("app-1-a", v(1))];
        let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();
        assert_eq!(descriptors[0].symbolic_name, "app-1-a");
        assert!(scope.bundles().contains_key("a"));
    }

    #[test]
    fn test_pinned_bundle_in_scope_is_prefixed() {
        let mut descriptors = vec![
            ModuleDescriptor::new("a", v(1)).export(ExportedPackage::new("p", v(1))),
            ModuleDescriptor::new("b", v(1))
                .import(ImportedPackage::new("p", range("[1,2)")).from_bundle("a")),
        ];
        Scoper::new(&mut descriptors, "app-1").scope().unwrap();
        assert_eq!(
            descriptors[1].imports[0].bundle_symbolic_name.as_deref(),
            Some("app-1-a")
        );
    }

    #[test]
    fn test_pinned_bundle_outside_scope_is_kept() {
        let mut descriptors = vec![
            ModuleDescriptor::new("a", v(1)).export(ExportedPackage::new("p", v(1))),
            ModuleDescriptor::new("b", v(1))
                .import(ImportedPackage::new("p", range("[1,2)")).from_bundle("elsewhere")),
        ];
        Scoper::new(&mut descriptors, "app-1").scope().unwrap();
        assert_eq!(
            descriptors[1].imports[0].bundle_symbolic_name.as_deref(),
            Some("elsewhere")
        );
        assert_eq!(descriptors[1].imports[0].attributes["module_scope"], "app-1");
    }

    #[test]
    fn test_import_of_foreign_package_is_untouched() {
        let mut descriptors = vec![ModuleDescriptor::new("b", v(1))
            .import(ImportedPackage::new("org.slf4j", VersionRange::unbounded()))];
        let before = descriptors[0].imports.clone();
        Scoper::new(&mut descriptors, "app-1").scope().unwrap();
        assert_eq!(descriptors[0].imports, before);
    }

    #[test]
    fn test_dynamic_imports_follow_import_rule() {
        let mut descriptors = vec![
            ModuleDescriptor::new("a", v(1)).export(ExportedPackage::new("p", v(1))),
            ModuleDescriptor::new("b", v(1))
                .dynamic_import(DynamicImport::new("p", VersionRange::unbounded()))
                .dynamic_import(DynamicImport::new("p.*", VersionRange::unbounded()))
                .dynamic_import(DynamicImport::new("p", range("[2,3)"))),
        ];
        let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();

        let dynamic = &descriptors[1].dynamic_imports;
        assert_eq!(dynamic[0].attributes["module_scope"], "app-1");
        assert!(dynamic[1].attributes.is_empty());
        assert!(dynamic[2].attributes.is_empty());
        assert_eq!(scope.warnings().len(), 1);
    }

    #[test]
    fn test_bundle_references_are_prefixed_when_in_range() {
        let mut descriptors = vec![
            ModuleDescriptor::new("host", v(1)),
            ModuleDescriptor::new("frag", v(1))
                .fragment_of(BundleReference::new("host", range("[1,2)")))
                .require_bundle(BundleReference::new("host", VersionRange::unbounded()))
                .import_bundle(BundleReference::new("host", range("[5,6)")))
                .require_bundle(BundleReference::new("external", VersionRange::unbounded())),
        ];
        let scope = Scoper::new(&mut descriptors, "app-1").scope().unwrap();

        let frag = &descriptors[1];
        assert_eq!(frag.fragment_host.as_ref().unwrap().symbolic_name, "app-1-host");
        assert_eq!(frag.required_bundles[0].symbolic_name, "app-1-host");
        assert_eq!(frag.required_bundles[1].symbolic_name, "external");
        assert_eq!(frag.imported_bundles[0].symbolic_name, "host");
        assert!(matches!(
            scope.warnings(),
            [ScopingWarning::BundleReferenceOutsideScope { target, .. }] if target == "host"
        ));
    }
}
