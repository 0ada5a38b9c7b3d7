//! Kiln Artifact Model
//!
//! Identities, lifecycle state and storage contracts for installable
//! deployment units.
//!
//! # Core Concepts
//!
//! - [`ArtifactIdentity`]: type, name, version and optional scope
//! - [`ArtifactState`]: lock-protected lifecycle cell ([`State`])
//! - [`ArtifactIdentityScoper`]: scoped external names
//! - [`Version`] / [`VersionRange`]: module versioning
//! - [`ArtifactStorage`]: backing bytes, synchronized and rolled back by
//!   install stages
//!
//! # Example
//!
//! ```rust
//! use kiln_artifact::{artifact_type, ArtifactIdentity, ArtifactIdentityScoper, Version};
//!
//! let id = ArtifactIdentity::new(artifact_type::BUNDLE, "foo", Version::new(1, 0, 0))
//!     .with_scope("app-1");
//! let scoped = ArtifactIdentityScoper::scope_artifact_identity(&id);
//! assert_eq!(scoped.name(), "app-1-foo");
//! assert_eq!(ArtifactIdentityScoper::unscoped_name(&scoped), "foo");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod error;
mod identity;
mod identity_scoper;
pub mod lifecycle;
mod state;
mod storage;
mod version;

pub use error::{ArtifactError, StorageError};
pub use identity::{artifact_type, ArtifactIdentity};
pub use identity_scoper::{ArtifactIdentityScoper, SCOPE_SEPARATOR};
pub use state::{ArtifactState, State};
pub use storage::{ArtifactStorage, LocalFileStorage};
pub use version::{Version, VersionError, VersionRange};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
