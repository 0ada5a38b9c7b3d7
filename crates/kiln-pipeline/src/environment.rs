//! Install environment and audit log
//!
//! Stages report what they did through the [`InstallLog`] carried by the
//! [`InstallEnvironment`]. [`TracingInstallLog`] forwards to `tracing`;
//! [`RecordingInstallLog`] keeps entries in memory for later inspection.

use parking_lot::Mutex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Debug, Display};
use std::sync::Arc;

/// Sink for install audit events
pub trait InstallLog: Send + Sync + Debug {
    /// Record `event` raised by `stage`
    fn log(&self, stage: &str, event: &str, details: &[&dyn Display]);

    /// Record a failure
    fn log_failure(&self, event: &str, error: &(dyn Error + 'static));
}

/// Log that forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingInstallLog;

impl InstallLog for TracingInstallLog {
    fn log(&self, stage: &str, event: &str, details: &[&dyn Display]) {
        tracing::info!(stage, details = %join(details), "{event}");
    }

    fn log_failure(&self, event: &str, error: &(dyn Error + 'static)) {
        tracing::error!(error = %error_chain(error), "{event}");
    }
}

/// One recorded audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    pub event: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// In-memory log
#[derive(Debug, Default)]
pub struct RecordingInstallLog {
    inner: Mutex<Vec<LogEntry>>,
}

impl RecordingInstallLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every entry so far
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.lock().clone()
    }

    /// Event names in recording order
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().iter().map(|e| e.event.clone()).collect()
    }

    /// Entries recorded through [`InstallLog::log_failure`]
    #[must_use]
    pub fn failures(&self) -> Vec<LogEntry> {
        self.inner
            .lock()
            .iter()
            .filter(|e| e.is_failure())
            .cloned()
            .collect()
    }
}

impl InstallLog for RecordingInstallLog {
    fn log(&self, stage: &str, event: &str, details: &[&dyn Display]) {
        self.inner.lock().push(LogEntry {
            stage: Some(stage.to_string()),
            event: event.to_string(),
            details: details.iter().map(ToString::to_string).collect(),
            failure: None,
        });
    }

    fn log_failure(&self, event: &str, error: &(dyn Error + 'static)) {
        self.inner.lock().push(LogEntry {
            stage: None,
            event: event.to_string(),
            details: Vec::new(),
            failure: Some(error_chain(error)),
        });
    }
}

/// Context shared by every stage of one install
#[derive(Debug, Clone)]
pub struct InstallEnvironment {
    log: Arc<dyn InstallLog>,
}

impl InstallEnvironment {
    #[must_use]
    pub fn new(log: Arc<dyn InstallLog>) -> Self {
        Self { log }
    }

    #[inline]
    #[must_use]
    pub fn log(&self) -> &dyn InstallLog {
        self.log.as_ref()
    }
}

impl Default for InstallEnvironment {
    fn default() -> Self {
        Self::new(Arc::new(TracingInstallLog))
    }
}

fn join(details: &[&dyn Display]) -> String {
    details
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// `error: cause: cause...`
fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeploymentError;
    use kiln_artifact::StorageError;

    #[test]
    fn test_recording_log_keeps_order() {
        let log = RecordingInstallLog::new();
        log.log("install", "begin", &[&"shop", &3]);
        log.log_failure(
            "stage failed",
            &DeploymentError::from(StorageError::Failed("disk full".into())),
        );

        let entries = log.entries();
        assert_eq!(log.events(), vec!["begin", "stage failed"]);
        assert_eq!(entries[0].details, vec!["shop", "3"]);
        assert_eq!(entries[0].stage.as_deref(), Some("install"));
        assert_eq!(
            entries[1].failure.as_deref(),
            Some("storage failure: disk full")
        );
        assert_eq!(log.failures().len(), 1);
    }

    #[test]
    fn test_error_chain_includes_sources() {
        let error = DeploymentError::from(StorageError::from(std::io::Error::other("denied")));
        assert_eq!(error_chain(&error), "storage i/o failure: denied");
    }
}
