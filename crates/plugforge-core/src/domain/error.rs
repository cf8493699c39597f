//! Domain-level error taxonomy for plugforge.
//!
//! All failures are deterministic given fixed inputs, so nothing here is
//! retried. Merge conflicts and access violations carry the full list of
//! offending items, not just the first.

use crate::accmod::report::ViolationReport;

/// plugforge domain errors.
#[derive(Debug, thiserror::Error)]
pub enum PlugforgeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("repository state error: {0}")]
    RepositoryState(String),

    #[error("analysis error: {detail}: {}", .offenders.join(", "))]
    Analysis {
        detail: String,
        offenders: Vec<String>,
    },

    #[error("manifest conflict for key '{key}': existing value '{existing}', incoming value '{incoming}'")]
    ManifestConflict {
        key: String,
        existing: String,
        incoming: String,
    },

    #[error("incomplete manifest, missing required keys: {}", .missing.join(", "))]
    IncompleteManifest { missing: Vec<String> },

    #[error("access check tool failed for unit {unit}: {detail}")]
    ToolExecution { unit: String, detail: String },

    #[error("access violations in {} unit(s): {}", .reports.len(), violated_units(.reports))]
    AccessViolation { reports: Vec<ViolationReport> },

    #[error("git error: {0}")]
    Git(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlugforgeError {
    /// Build an [`PlugforgeError::Analysis`] naming the offending items.
    pub fn analysis(detail: impl Into<String>, offenders: Vec<String>) -> Self {
        Self::Analysis {
            detail: detail.into(),
            offenders,
        }
    }
}

fn violated_units(reports: &[ViolationReport]) -> String {
    reports
        .iter()
        .map(|r| r.unit.directory.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for plugforge domain operations.
pub type Result<T> = std::result::Result<T, PlugforgeError>;
