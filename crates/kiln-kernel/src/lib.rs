//! Kiln Kernel
//!
//! Configuration and the command implementations behind the `kiln`
//! binary: scoping descriptor files and running plan installs.

#![allow(missing_docs)]

pub mod commands;
pub mod config;
pub mod logging;

// Re-exports
pub use commands::{
    install_plan, scope_descriptors, ArtifactReport, InstallReport, ScopeCommandError, ScopeReport,
};
pub use config::{ConfigError, KernelConfig, LoggingConfig, ScopingConfig};
pub use logging::init_tracing;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
