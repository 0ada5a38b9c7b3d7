//! Module descriptors
//!
//! A [`ModuleDescriptor`] is the runtime-neutral record of a bundle's
//! metadata: its symbolic name and version, the packages it exports and
//! imports, and the bundles it requires, imports or attaches to as a
//! fragment. Clauses carry typed fields plus free attribute maps.

use kiln_artifact::{Version, VersionRange};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

fn default_manifest_version() -> u32 {
    1
}

/// Metadata of one module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleDescriptor {
    /// Metadata format version; absent means format 1
    #[serde(default = "default_manifest_version")]
    pub manifest_version: u32,
    pub symbolic_name: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exports: Vec<ExportedPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<ImportedPackage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic_imports: Vec<DynamicImport>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_bundles: Vec<BundleReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imported_bundles: Vec<BundleReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment_host: Option<BundleReference>,
}

impl ModuleDescriptor {
    /// Create a format-2 descriptor with no clauses
    #[must_use]
    pub fn new(symbolic_name: impl Into<String>, version: Version) -> Self {
        Self {
            manifest_version: 2,
            symbolic_name: symbolic_name.into(),
            version,
            exports: Vec::new(),
            imports: Vec::new(),
            dynamic_imports: Vec::new(),
            required_bundles: Vec::new(),
            imported_bundles: Vec::new(),
            fragment_host: None,
        }
    }

    #[must_use]
    pub fn with_manifest_version(mut self, manifest_version: u32) -> Self {
        self.manifest_version = manifest_version;
        self
    }

    #[must_use]
    pub fn export(mut self, export: ExportedPackage) -> Self {
        self.exports.push(export);
        self
    }

    #[must_use]
    pub fn import(mut self, import: ImportedPackage) -> Self {
        self.imports.push(import);
        self
    }

    #[must_use]
    pub fn dynamic_import(mut self, import: DynamicImport) -> Self {
        self.dynamic_imports.push(import);
        self
    }

    #[must_use]
    pub fn require_bundle(mut self, reference: BundleReference) -> Self {
        self.required_bundles.push(reference);
        self
    }

    #[must_use]
    pub fn import_bundle(mut self, reference: BundleReference) -> Self {
        self.imported_bundles.push(reference);
        self
    }

    #[must_use]
    pub fn fragment_of(mut self, host: BundleReference) -> Self {
        self.fragment_host = Some(host);
        self
    }

    /// Whether this descriptor exports `package`
    #[must_use]
    pub fn exports_package(&self, package: &str) -> bool {
        self.exports.iter().any(|e| e.name == package)
    }

    /// Load a descriptor from a `.json` or `.toml` file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, has another extension, or
    /// does not deserialize.
    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        read_document(path)
    }
}

/// Deserialize a `.json` or `.toml` document
///
/// Shared by descriptor and plan files.
///
/// # Errors
/// Returns error if the file cannot be read, has another extension, or
/// does not deserialize.
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, DescriptorError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some(ext @ ("json" | "toml")) => ext,
        _ => return Err(DescriptorError::UnsupportedFormat(path.to_path_buf())),
    };

    let content = std::fs::read_to_string(path).map_err(|source| DescriptorError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if format == "json" {
        Ok(serde_json::from_str(&content)?)
    } else {
        Ok(toml::from_str(&content)?)
    }
}

/// Exported package clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedPackage {
    pub name: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Attribute names an importer must match
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub mandatory: BTreeSet<String>,
}

impl ExportedPackage {
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            attributes: BTreeMap::new(),
            mandatory: BTreeSet::new(),
        }
    }
}

/// Imported package clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ImportedPackage {
    pub name: String,
    #[serde(default)]
    pub version: VersionRange,
    /// Pins the exporting bundle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_symbolic_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub optional: bool,
}

impl ImportedPackage {
    #[must_use]
    pub fn new(name: impl Into<String>, version: VersionRange) -> Self {
        Self {
            name: name.into(),
            version,
            bundle_symbolic_name: None,
            attributes: BTreeMap::new(),
            optional: false,
        }
    }

    #[must_use]
    pub fn from_bundle(mut self, symbolic_name: impl Into<String>) -> Self {
        self.bundle_symbolic_name = Some(symbolic_name.into());
        self
    }
}

/// Dynamic import clause; the pattern may end in `*`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DynamicImport {
    pub pattern: String,
    #[serde(default)]
    pub version: VersionRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_symbolic_name: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl DynamicImport {
    #[must_use]
    pub fn new(pattern: impl Into<String>, version: VersionRange) -> Self {
        Self {
            pattern: pattern.into(),
            version,
            bundle_symbolic_name: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Whether the pattern is a wildcard rather than a package name
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.pattern.contains('*')
    }
}

/// Reference to another bundle by symbolic name
///
/// Used for required bundles, imported bundles and fragment hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BundleReference {
    pub symbolic_name: String,
    #[serde(default)]
    pub version: VersionRange,
    #[serde(default)]
    pub optional: bool,
}

impl BundleReference {
    #[must_use]
    pub fn new(symbolic_name: impl Into<String>, version: VersionRange) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            version,
            optional: false,
        }
    }
}

/// Errors loading descriptors
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("cannot read descriptor {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed TOML descriptor")]
    Toml(#[from] toml::de::Error),

    #[error("malformed JSON descriptor")]
    Json(#[from] serde_json::Error),

    #[error("unsupported descriptor format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}
