//! Kiln Scoping
//!
//! Namespace isolation for applications sharing one module runtime.
//!
//! # Overview
//!
//! - **ModuleDescriptor**: runtime-neutral module metadata
//! - **Scoper**: two-pass rewrite that confines references to a scope
//! - **Scope**: the bundle and export tables a scoping run produced
//!
//! # Example
//!
//! ```rust
//! use kiln_artifact::Version;
//! use kiln_scope::{ExportedPackage, ModuleDescriptor, Scoper, ScopingError};
//!
//! let mut descriptors = vec![
//!     ModuleDescriptor::new("a", Version::new(1, 0, 0))
//!         .export(ExportedPackage::new("p", Version::new(1, 0, 0))),
//!     ModuleDescriptor::new("b", Version::new(1, 0, 0))
//!         .export(ExportedPackage::new("p", Version::new(2, 0, 0))),
//! ];
//!
//! let err = Scoper::new(&mut descriptors, "app-1").scope().unwrap_err();
//! assert!(matches!(err, ScopingError::DuplicateExport { .. }));
//! ```

#![allow(missing_docs)]

pub mod descriptor;
pub mod scope;
pub mod scoper;

// Re-exports
pub use descriptor::{
    read_document, BundleReference, DescriptorError, DynamicImport, ExportedPackage,
    ImportedPackage, ModuleDescriptor,
};
pub use scope::{Scope, ScopingWarning, SYNTHETIC_CONTEXT_SUFFIX};
pub use scoper::{
    Scoper, ScoperOptions, ScopingError, DEFAULT_SCOPE_ATTRIBUTE, MINIMUM_MANIFEST_VERSION,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for scoping operations
    pub use crate::{
        BundleReference, ExportedPackage, ImportedPackage, ModuleDescriptor, Scope, Scoper,
        ScopingError, ScopingWarning,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
