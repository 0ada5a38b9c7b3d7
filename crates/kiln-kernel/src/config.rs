//! Kernel configuration
//!
//! ```toml
//! [scoping]
//! allow_duplicate_exports = false
//! minimum_manifest_version = 2
//! scope_attribute = "module_scope"
//!
//! [logging]
//! filter = "info"
//! json = false
//! ```
//!
//! Every key is optional.

use kiln_scope::{ScoperOptions, DEFAULT_SCOPE_ATTRIBUTE, MINIMUM_MANIFEST_VERSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed config")]
    Parse(#[from] toml::de::Error),
}

/// Kernel configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    pub scoping: ScopingConfig,
    pub logging: LoggingConfig,
}

/// `[scoping]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopingConfig {
    pub allow_duplicate_exports: bool,
    pub minimum_manifest_version: u32,
    pub scope_attribute: String,
}

impl Default for ScopingConfig {
    fn default() -> Self {
        Self {
            allow_duplicate_exports: false,
            minimum_manifest_version: MINIMUM_MANIFEST_VERSION,
            scope_attribute: DEFAULT_SCOPE_ATTRIBUTE.to_string(),
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl KernelConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    #[inline]
    #[must_use]
    pub fn with_allow_duplicate_exports(mut self, allow: bool) -> Self {
        self.scoping.allow_duplicate_exports = allow;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_minimum_manifest_version(mut self, version: u32) -> Self {
        self.scoping.minimum_manifest_version = version;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_scope_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.scoping.scope_attribute = attribute.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_log_filter(mut self, filter: impl Into<String>) -> Self {
        self.logging.filter = filter.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.logging.json = json;
        self
    }

    /// Scoping knobs for the scoper
    #[must_use]
    pub fn scoper_options(&self) -> ScoperOptions {
        ScoperOptions {
            allow_duplicate_exports: self.scoping.allow_duplicate_exports,
            minimum_manifest_version: self.scoping.minimum_manifest_version,
            scope_attribute: self.scoping.scope_attribute.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = KernelConfig::from_toml_str("").unwrap();
        assert_eq!(config, KernelConfig::default());
        assert_eq!(config.scoper_options(), ScoperOptions::default());
    }

    #[test]
    fn test_partial_table() {
        let config = KernelConfig::from_toml_str("[scoping]\nallow_duplicate_exports = true\n").unwrap();
        assert!(config.scoping.allow_duplicate_exports);
        assert_eq!(config.scoping.minimum_manifest_version, 2);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_builders() {
        let config = KernelConfig::new()
            .with_scope_attribute("application")
            .with_minimum_manifest_version(1)
            .with_json_logs(true);
        let options = config.scoper_options();
        assert_eq!(options.scope_attribute, "application");
        assert_eq!(options.minimum_manifest_version, 1);
        assert!(config.logging.json);
    }

    #[test]
    fn test_malformed_config_rejected() {
        assert!(matches!(
            KernelConfig::from_toml_str("[scoping]\nallow_duplicate_exports = \"yes\"\n"),
            Err(ConfigError::Parse(_))
        ));
    }
}
