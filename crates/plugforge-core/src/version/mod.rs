//! Effective version resolution.
//!
//! A build carries exactly one active version strategy. Resolution is a pure
//! function of immutable inputs; the orchestrator computes it once per build
//! and passes the value explicitly to every consumer.

pub mod git;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::error::{PlugforgeError, Result};

/// Default format template: commit depth, then abbreviated hash.
pub const DEFAULT_FORMAT_TEMPLATE: &str = "%d.%s";

/// Default abbreviated hash length.
pub const DEFAULT_ABBREV_HASH_LENGTH: u32 = 12;

/// Source of the effective artifact version.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VersionStrategy {
    /// Use the orchestrator-provided project version (default).
    Project,

    /// Use a fixed version string.
    Fixed,

    /// Use a version derived from git (commit depth + abbreviated hash).
    Git,
}

impl Default for VersionStrategy {
    fn default() -> Self {
        Self::Project
    }
}

/// Configuration for git-based version generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitVersionConfig {
    /// Format template receiving commit depth and abbreviated hash,
    /// in that order. Default `%d.%s`.
    pub format_template: String,

    /// Prefix prepended to the formatted version string.
    pub prefix: String,

    /// Length of the abbreviated hash. Must be greater than zero.
    pub abbrev_hash_length: u32,

    /// Whether a dirty working tree is tolerated. When false, generation
    /// fails on uncommitted changes.
    pub allow_dirty: bool,

    /// Root of the git repository.
    pub repository_root: PathBuf,
}

impl GitVersionConfig {
    /// Config with stated defaults for the given repository root.
    pub fn new(repository_root: impl Into<PathBuf>) -> Self {
        Self {
            format_template: DEFAULT_FORMAT_TEMPLATE.to_string(),
            prefix: String::new(),
            abbrev_hash_length: DEFAULT_ABBREV_HASH_LENGTH,
            allow_dirty: false,
            repository_root: repository_root.into(),
        }
    }
}

/// The active version strategy plus its strategy-specific inputs.
///
/// Immutable once resolved for a build. `Fixed` requires [`VersionSpec::fixed_value`];
/// `Git` requires [`VersionSpec::git`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionSpec {
    /// Which strategy is active.
    pub strategy: VersionStrategy,

    /// Fixed version string, required by [`VersionStrategy::Fixed`].
    #[serde(default)]
    pub fixed_value: Option<String>,

    /// Git generation config, required by [`VersionStrategy::Git`].
    #[serde(default)]
    pub git: Option<GitVersionConfig>,
}

impl VersionSpec {
    /// Spec using the orchestrator-provided project version.
    pub fn project() -> Self {
        Self {
            strategy: VersionStrategy::Project,
            fixed_value: None,
            git: None,
        }
    }

    /// Spec pinning the version to a fixed string.
    pub fn fixed(value: impl Into<String>) -> Self {
        Self {
            strategy: VersionStrategy::Fixed,
            fixed_value: Some(value.into()),
            git: None,
        }
    }

    /// Spec deriving the version from a git repository.
    pub fn git(config: GitVersionConfig) -> Self {
        Self {
            strategy: VersionStrategy::Git,
            fixed_value: None,
            git: Some(config),
        }
    }

    /// Check the strategy-specific inputs are present and well-formed.
    pub fn validate(&self) -> Result<()> {
        match self.strategy {
            VersionStrategy::Project => Ok(()),
            VersionStrategy::Fixed => {
                if self.fixed_value.as_deref().map(str::trim).unwrap_or("").is_empty() {
                    return Err(PlugforgeError::Configuration(
                        "fixed version strategy requires a non-empty fixed value".into(),
                    ));
                }
                Ok(())
            }
            VersionStrategy::Git => {
                let config = self.git.as_ref().ok_or_else(|| {
                    PlugforgeError::Configuration(
                        "git version strategy requires a git version config".into(),
                    )
                })?;
                if config.abbrev_hash_length == 0 {
                    return Err(PlugforgeError::Configuration(
                        "abbreviated hash length must be greater than zero".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

/// Output of git version generation, persisted as a two-line record:
/// line 1 the formatted version string, line 2 the full commit hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The formatted version string.
    pub value: String,

    /// Full commit hash the version was derived from.
    pub full_hash: Option<String>,
}

impl ResolvedVersion {
    /// Persist the two-line record, creating parent directories as needed.
    pub fn write_record(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let full_hash = self.full_hash.as_deref().unwrap_or("");
        fs::write(path, format!("{}\n{}\n", self.value, full_hash))?;
        Ok(())
    }

    /// Read a persisted two-line record back.
    pub fn read_record(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let mut lines = text.lines();
        let value = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or_else(|| {
                PlugforgeError::Configuration(format!(
                    "version record {} has no version line",
                    path.display()
                ))
            })?
            .to_string();
        let full_hash = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string);
        Ok(Self { value, full_hash })
    }
}

/// Resolve the effective version for one build.
///
/// - `Project`: returns `project_version` verbatim.
/// - `Fixed`: returns the configured fixed value.
/// - `Git`: returns line 1 of the prior generation step's record. When no
///   generation ran, falls back to the project version. The fallback is a
///   documented degraded mode and is surfaced as a warning, never silently.
pub fn resolve(
    spec: &VersionSpec,
    project_version: &str,
    prior: Option<&ResolvedVersion>,
) -> Result<String> {
    spec.validate()?;
    match spec.strategy {
        VersionStrategy::Project => Ok(project_version.to_string()),
        VersionStrategy::Fixed => Ok(spec.fixed_value.clone().unwrap_or_default()),
        VersionStrategy::Git => match prior {
            Some(resolved) => Ok(resolved.value.trim().to_string()),
            None => {
                warn!(
                    project_version,
                    "git version strategy requested but no generated version record \
                     is available; falling back to the project version"
                );
                Ok(project_version.to_string())
            }
        },
    }
}

/// Render a format template against commit depth and abbreviated hash.
///
/// The template must contain exactly one `%d` placeholder followed by exactly
/// one `%s` placeholder; `%%` escapes a literal percent. Validation happens
/// here, at resolution time, not eagerly.
pub fn format_version(template: &str, depth: u64, hash: &str) -> Result<String> {
    let mismatch = |detail: &str| {
        PlugforgeError::Configuration(format!(
            "invalid version format template '{template}': {detail}"
        ))
    };

    let mut out = String::with_capacity(template.len() + hash.len());
    let mut chars = template.chars();
    let mut seen_depth = false;
    let mut seen_hash = false;
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('d') => {
                if seen_depth {
                    return Err(mismatch("more than one integer placeholder"));
                }
                if seen_hash {
                    return Err(mismatch("integer placeholder must come before string placeholder"));
                }
                seen_depth = true;
                out.push_str(&depth.to_string());
            }
            Some('s') => {
                if seen_hash {
                    return Err(mismatch("more than one string placeholder"));
                }
                if !seen_depth {
                    return Err(mismatch("string placeholder must come after integer placeholder"));
                }
                seen_hash = true;
                out.push_str(hash);
            }
            Some(other) => {
                return Err(mismatch(&format!("unsupported placeholder '%{other}'")));
            }
            None => return Err(mismatch("dangling '%' at end of template")),
        }
    }
    if !seen_depth || !seen_hash {
        return Err(mismatch(
            "template must contain one integer and one string placeholder",
        ));
    }
    Ok(out)
}

/// Decorate a snapshot version with a timestamped private qualifier for
/// manifest use, e.g. `1.2-SNAPSHOT (private-2024-05-01T12:00:00Z-jsmith)`.
///
/// Non-snapshot versions pass through untouched. The clock and username are
/// injected so the decoration stays deterministic under test.
pub fn decorate_snapshot(version: &str, now: DateTime<Utc>, username: &str) -> String {
    if !version.ends_with("-SNAPSHOT") {
        return version.to_string();
    }
    let timestamp = now.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!("{version} (private-{timestamp}-{username})")
}
